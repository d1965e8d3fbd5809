//! Pipeline configuration

use crate::error::{Result, SpendingError};
use crate::export::SerializationFormat;
use crate::training::Criterion;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for one tuning run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Input CSV file
    pub input_path: PathBuf,
    /// Directory the model artifact is written to
    pub output_dir: PathBuf,
    /// Expected outlier fraction (ν) of the one-class SVM
    pub outlier_nu: f64,
    /// RBF kernel bandwidth (γ) of the one-class SVM
    pub outlier_gamma: f64,
    /// Share of the post-gap rows used for training
    pub train_fraction: f64,
    /// Share of the post-gap rows used for testing
    pub test_fraction: f64,
    /// Rows withheld between train and test
    pub split_gap: usize,
    /// Trees in the random forest
    pub n_estimators: usize,
    /// Split criterion of the forest's trees
    pub criterion: Criterion,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Seed for bootstrap sampling
    pub random_state: u64,
    /// Artifact encoding
    pub format: SerializationFormat,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("Percent_Change_in_Consumer_Spending.csv"),
            output_dir: PathBuf::from("."),
            outlier_nu: 0.05,
            outlier_gamma: 0.25,
            train_fraction: 0.75,
            test_fraction: 0.25,
            split_gap: 360,
            n_estimators: 100,
            criterion: Criterion::SquaredError,
            min_samples_split: 2,
            random_state: 42,
            format: SerializationFormat::Binary,
        }
    }
}

impl PipelineConfig {
    /// Create a config for the given input and output locations
    pub fn new(input_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    /// Load a config from a JSON file; missing keys take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            SpendingError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            SpendingError::Config(format!("cannot parse {}: {}", path.display(), e))
        })
    }

    pub fn with_outlier_nu(mut self, nu: f64) -> Self {
        self.outlier_nu = nu;
        self
    }

    pub fn with_outlier_gamma(mut self, gamma: f64) -> Self {
        self.outlier_gamma = gamma;
        self
    }

    pub fn with_fractions(mut self, train_fraction: f64, test_fraction: f64) -> Self {
        self.train_fraction = train_fraction;
        self.test_fraction = test_fraction;
        self
    }

    pub fn with_split_gap(mut self, gap: usize) -> Self {
        self.split_gap = gap;
        self
    }

    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn with_format(mut self, format: SerializationFormat) -> Self {
        self.format = format;
        self
    }

    /// Check parameter ranges before any stage runs
    pub fn validate(&self) -> Result<()> {
        if !(self.outlier_nu > 0.0 && self.outlier_nu <= 1.0) {
            return Err(invalid("outlier_nu", self.outlier_nu, "must be in (0, 1]"));
        }
        if !(self.outlier_gamma > 0.0 && self.outlier_gamma.is_finite()) {
            return Err(invalid("outlier_gamma", self.outlier_gamma, "must be positive"));
        }
        for (name, value) in [
            ("train_fraction", self.train_fraction),
            ("test_fraction", self.test_fraction),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(invalid(name, value, "must be in (0, 1)"));
            }
        }
        if self.n_estimators == 0 {
            return Err(invalid("n_estimators", self.n_estimators, "must be at least 1"));
        }
        if self.min_samples_split < 2 {
            return Err(invalid("min_samples_split", self.min_samples_split, "must be at least 2"));
        }
        Ok(())
    }
}

fn invalid(name: &str, value: impl std::fmt::Display, reason: &str) -> SpendingError {
    SpendingError::Config(format!("{} = {}: {}", name, value, reason))
}
