//! Error types for the spending tuner

use std::fmt;
use thiserror::Error;

/// Result type alias for tuner operations
pub type Result<T> = std::result::Result<T, SpendingError>;

/// Main error type for the tuner
#[derive(Error, Debug)]
pub enum SpendingError {
    #[error("Data access error: {0}")]
    DataAccess(String),

    #[error("Too few rows: {remaining} remaining, need at least {required}")]
    DataTooSmall { remaining: usize, required: usize },

    #[error("Insufficient history: {required} rows required, got {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("Model fit error: {0}")]
    ModelFit(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("MAPE undefined: y_true is zero at row {row}")]
    UndefinedMape { row: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,
}

impl From<polars::error::PolarsError> for SpendingError {
    fn from(err: polars::error::PolarsError) -> Self {
        SpendingError::DataAccess(err.to_string())
    }
}

impl From<ndarray::ShapeError> for SpendingError {
    fn from(err: ndarray::ShapeError) -> Self {
        SpendingError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

/// Pipeline stage, used to attribute a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Config,
    Load,
    Split,
    Filter,
    Partition,
    Train,
    Persist,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Config => "config",
            Stage::Load => "load",
            Stage::Split => "split",
            Stage::Filter => "filter",
            Stage::Partition => "partition",
            Stage::Train => "train",
            Stage::Persist => "persist",
        };
        f.write_str(name)
    }
}

/// The first error of a pipeline run together with the stage that raised it
#[derive(Error, Debug)]
#[error("pipeline failed at {stage} stage: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: SpendingError,
}

impl StageError {
    pub fn new(stage: Stage, source: SpendingError) -> Self {
        Self { stage, source }
    }
}

/// Attach a stage to a fallible stage result
pub(crate) trait AtStage<T> {
    fn at(self, stage: Stage) -> std::result::Result<T, StageError>;
}

impl<T> AtStage<T> for Result<T> {
    fn at(self, stage: Stage) -> std::result::Result<T, StageError> {
        self.map_err(|e| StageError::new(stage, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SpendingError::DataAccess("missing column".to_string());
        assert_eq!(err.to_string(), "Data access error: missing column");
    }

    #[test]
    fn test_stage_error_keeps_source() {
        let err: Result<()> = Err(SpendingError::InsufficientHistory {
            required: 361,
            available: 100,
        });
        let staged = err.at(Stage::Partition).unwrap_err();
        assert_eq!(staged.stage, Stage::Partition);
        assert!(matches!(
            staged.source,
            SpendingError::InsufficientHistory { required: 361, available: 100 }
        ));
        assert!(staged.to_string().starts_with("pipeline failed at partition stage"));
    }
}
