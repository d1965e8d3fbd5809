//! spending-tuner - model selection for consumer-spending series
//!
//! This crate turns a daily consumer-spending table into a persisted
//! regression model:
//! - Load the CSV and recompute `total spending` from the eight categories
//! - Drop novel rows with a one-class SVM on standardized predictors
//! - Split chronologically into train, gap and test blocks
//! - Fit a random forest and a linear regression, keep the lower-MAPE one
//! - Save it as `<Identifier>_best_model.<ext>`
//!
//! # Modules
//!
//! ## Data
//! - [`data`] - CSV loading, typed records, feature extraction
//! - [`preprocessing`] - Standard scaling
//!
//! ## Modelling
//! - [`anomaly`] - One-class SVM and the outlier filter
//! - [`timeseries`] - Chronological holdout split
//! - [`training`] - Regressors, metrics and the model selector
//!
//! ## Pipeline
//! - [`config`] - Run configuration
//! - [`pipeline`] - Stage orchestration
//! - [`export`] - Model artifact persistence
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;
pub mod config;

// Data
pub mod data;
pub mod preprocessing;

// Modelling
pub mod anomaly;
pub mod timeseries;
pub mod training;

// Pipeline
pub mod export;
pub mod pipeline;
pub mod cli;

pub use error::{Result, SpendingError, Stage, StageError};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{Result, SpendingError, Stage, StageError};

    // Configuration and pipeline
    pub use crate::config::PipelineConfig;
    pub use crate::pipeline::{TuningPipeline, TuningReport};

    // Data
    pub use crate::data::{split_features, DataLoader, FeatureMatrix, FeatureSet, SpendingRecord};
    pub use crate::preprocessing::StandardScaler;

    // Outlier filtering
    pub use crate::anomaly::{AnomalyDetector, FilteredSet, OneClassSvm, OutlierFilter};

    // Time series
    pub use crate::timeseries::{HoldoutSplit, TimeSeriesSplit};

    // Training
    pub use crate::training::{
        mean_absolute_percentage_error, CandidateModel, Criterion, LinearRegression,
        ModelSelector, RandomForest, Regressor, Selection,
    };

    // Export
    pub use crate::export::{load_model, save_model, ModelArtifact, ModelMetadata, SerializationFormat};
}
