//! Fit-and-score model selection on a hold-out block

use super::decision_tree::Criterion;
use super::models::{CandidateModel, ModelMetrics, Regressor};
use crate::error::{Result, SpendingError};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Hold-out result of one candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateScore {
    pub identifier: String,
    pub metrics: ModelMetrics,
}

/// The winning fitted model and the scores of every candidate
#[derive(Debug, Clone)]
pub struct Selection {
    /// Fitted winner
    pub model: CandidateModel,
    pub identifier: &'static str,
    /// Winner's hold-out MAPE
    pub mape: f64,
    /// All candidates, in evaluation order
    pub scores: Vec<CandidateScore>,
}

/// Fits each candidate on the training block, scores it by MAPE on the test
/// block and keeps the lowest. Candidates are evaluated in order and a later
/// one must be strictly better to replace the current best.
#[derive(Debug, Clone)]
pub struct ModelSelector {
    candidates: Vec<CandidateModel>,
}

impl ModelSelector {
    /// Select among unfitted `candidates`
    pub fn new(candidates: Vec<CandidateModel>) -> Self {
        Self { candidates }
    }

    /// Random forest first, then linear regression
    pub fn with_defaults(
        n_estimators: usize,
        criterion: Criterion,
        min_samples_split: usize,
        random_state: u64,
    ) -> Self {
        Self::new(vec![
            CandidateModel::random_forest(n_estimators, criterion, min_samples_split, random_state),
            CandidateModel::linear_regression(),
        ])
    }

    pub fn candidates(&self) -> &[CandidateModel] {
        &self.candidates
    }

    /// Fit, score and pick. The candidate templates stay unfitted.
    pub fn select(
        &self,
        x_train: &Array2<f64>,
        y_train: &Array1<f64>,
        x_test: &Array2<f64>,
        y_test: &Array1<f64>,
    ) -> Result<Selection> {
        if self.candidates.is_empty() {
            return Err(SpendingError::Config("no candidate models to select from".to_string()));
        }
        if x_train.ncols() != x_test.ncols() {
            return Err(SpendingError::ShapeError {
                expected: format!("{} test features", x_train.ncols()),
                actual: format!("{} test features", x_test.ncols()),
            });
        }

        let mut best: Option<(CandidateModel, f64)> = None;
        let mut scores = Vec::with_capacity(self.candidates.len());

        for template in &self.candidates {
            let mut model = template.clone();
            let identifier = model.identifier();
            debug!(model = identifier, rows = x_train.nrows(), "Fitting candidate");

            let started = Instant::now();
            model.fit(x_train, y_train)?;
            let elapsed = started.elapsed().as_secs_f64();

            let y_pred = model.predict(x_test)?;
            let mut metrics = ModelMetrics::compute_regression(y_test, &y_pred)?;
            metrics.training_time_secs = elapsed;

            if !metrics.mape.is_finite() {
                return Err(SpendingError::ModelFit(format!(
                    "{} produced a non-finite MAPE",
                    identifier
                )));
            }

            info!(
                model = identifier,
                mape = metrics.mape,
                rmse = metrics.rmse,
                fit_secs = elapsed,
                "Scored candidate"
            );

            let mape = metrics.mape;
            scores.push(CandidateScore {
                identifier: identifier.to_string(),
                metrics,
            });

            if best.as_ref().map_or(true, |(_, best_mape)| mape < *best_mape) {
                best = Some((model, mape));
            }
        }

        let (model, mape) = best.ok_or_else(|| SpendingError::ModelFit("no candidate was scored".to_string()))?;
        let identifier = model.identifier();
        info!(model = identifier, mape, "Selected best model");

        Ok(Selection {
            model,
            identifier,
            mape,
            scores,
        })
    }
}
