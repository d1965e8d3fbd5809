//! End-to-end tuning run
//!
//! load → split features → filter outliers → partition → train/select → persist
//!
//! Stages run in order and the first failure stops the run; nothing is
//! written unless every earlier stage succeeded.

use crate::anomaly::OutlierFilter;
use crate::config::PipelineConfig;
use crate::data::{split_features, DataLoader, TARGET_COLUMN};
use crate::error::{AtStage, Stage, StageError};
use crate::export::{save_model, ModelArtifact, ModelMetadata};
use crate::timeseries::HoldoutSplit;
use crate::training::{CandidateScore, ModelSelector, Regressor};
use ndarray::Axis;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// What a successful run did
#[derive(Debug, Clone, Serialize)]
pub struct TuningReport {
    pub rows_loaded: usize,
    pub rows_kept: usize,
    pub rows_dropped: usize,
    pub train_rows: usize,
    pub gap: usize,
    pub test_rows: usize,
    /// Every candidate's hold-out metrics, in evaluation order
    pub scores: Vec<CandidateScore>,
    pub best_identifier: String,
    pub best_mape: f64,
    pub artifact_path: PathBuf,
    pub elapsed_secs: f64,
}

/// One configured run of the tuning pipeline
#[derive(Debug, Clone)]
pub struct TuningPipeline {
    config: PipelineConfig,
    loader: DataLoader,
}

impl TuningPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            loader: DataLoader::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Execute every stage and persist the winning model
    pub fn run(&self) -> Result<TuningReport, StageError> {
        let started = Instant::now();
        let config = &self.config;

        config.validate().at(Stage::Config)?;

        let df = self.loader.load_csv(&config.input_path).at(Stage::Load)?;
        info!(rows = df.height(), path = %config.input_path.display(), "Loaded spending data");

        let set = split_features(&df).at(Stage::Split)?;
        info!(rows = set.len(), features = set.features.ncols(), "Split features and target");

        let filtered = OutlierFilter::one_class(config.outlier_nu, config.outlier_gamma)
            .apply(&set)
            .at(Stage::Filter)?;

        let split = HoldoutSplit::new(config.train_fraction, config.test_fraction, config.split_gap)
            .split(filtered.len())
            .at(Stage::Partition)?;
        info!(
            train = split.train_indices.len(),
            gap = split.gap,
            test = split.test_indices.len(),
            "Partitioned chronologically"
        );

        let values = filtered.features.values();
        let x_train = values.select(Axis(0), &split.train_indices);
        let y_train = filtered.target.select(Axis(0), &split.train_indices);
        let x_test = values.select(Axis(0), &split.test_indices);
        let y_test = filtered.target.select(Axis(0), &split.test_indices);

        let selector = ModelSelector::with_defaults(
            config.n_estimators,
            config.criterion,
            config.min_samples_split,
            config.random_state,
        );
        let selection = selector
            .select(&x_train, &y_train, &x_test, &y_test)
            .at(Stage::Train)?;

        let mut metadata = ModelMetadata::new(selection.identifier)
            .with_features(filtered.features.columns().to_vec())
            .with_target(TARGET_COLUMN)
            .with_hyperparameters(selection.model.hyperparameters());
        for score in &selection.scores {
            metadata = metadata.add_metric(format!("{}_mape", score.identifier), score.metrics.mape);
        }
        metadata = metadata.add_metric("mape", selection.mape);

        let artifact = ModelArtifact::new(metadata, filtered.scaler.clone(), selection.model);
        let artifact_path = save_model(&artifact, &config.output_dir, config.format).at(Stage::Persist)?;

        let report = TuningReport {
            rows_loaded: set.len(),
            rows_kept: filtered.len(),
            rows_dropped: filtered.n_dropped(),
            train_rows: split.train_indices.len(),
            gap: split.gap,
            test_rows: split.test_indices.len(),
            scores: selection.scores,
            best_identifier: selection.identifier.to_string(),
            best_mape: selection.mape,
            artifact_path,
            elapsed_secs: started.elapsed().as_secs_f64(),
        };

        info!(
            model = %report.best_identifier,
            mape = report.best_mape,
            secs = report.elapsed_secs,
            "Tuning run complete"
        );
        Ok(report)
    }
}
