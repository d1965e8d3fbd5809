//! Candidate models and the trait they share

use super::decision_tree::Criterion;
use super::linear_models::LinearRegression;
use super::metrics::{mean_absolute_error, mean_absolute_percentage_error, root_mean_squared_error};
use super::random_forest::RandomForest;
use crate::error::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Hold-out metrics of one fitted candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Mean absolute percentage error (fraction)
    pub mape: f64,
    /// Mean absolute error
    pub mae: f64,
    /// Root mean squared error
    pub rmse: f64,
    /// Wall-clock fit time in seconds
    pub training_time_secs: f64,
    /// Rows the score was computed on
    pub n_samples: usize,
}

impl ModelMetrics {
    /// Score predictions against the held-out target
    pub fn compute_regression(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        Ok(Self {
            mape: mean_absolute_percentage_error(y_true, y_pred)?,
            mae: mean_absolute_error(y_true, y_pred)?,
            rmse: root_mean_squared_error(y_true, y_pred)?,
            training_time_secs: 0.0,
            n_samples: y_true.len(),
        })
    }
}

/// A regression model the selector can fit and score
pub trait Regressor: Send + Sync {
    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Make predictions
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Name used in logs and in the artifact file name
    fn identifier(&self) -> &'static str;

    /// Hyperparameters recorded with a persisted model
    fn hyperparameters(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }
}

impl Regressor for RandomForest {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        RandomForest::fit(self, x, y).map(|_| ())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        RandomForest::predict(self, x)
    }

    fn identifier(&self) -> &'static str {
        "RandomForest"
    }

    fn hyperparameters(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("n_estimators".to_string(), self.n_estimators.to_string());
        params.insert("criterion".to_string(), self.criterion.to_string());
        params.insert("min_samples_split".to_string(), self.min_samples_split.to_string());
        params.insert("min_samples_leaf".to_string(), self.min_samples_leaf.to_string());
        params.insert("bootstrap".to_string(), self.bootstrap.to_string());
        if let Some(depth) = self.max_depth {
            params.insert("max_depth".to_string(), depth.to_string());
        }
        if let Some(seed) = self.random_state {
            params.insert("random_state".to_string(), seed.to_string());
        }
        params
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        LinearRegression::fit(self, x, y).map(|_| ())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        LinearRegression::predict(self, x)
    }

    fn identifier(&self) -> &'static str {
        "LinearRegression"
    }

    fn hyperparameters(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("fit_intercept".to_string(), self.fit_intercept.to_string());
        params
    }
}

/// The closed set of models a tuning run compares
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CandidateModel {
    RandomForest(RandomForest),
    LinearRegression(LinearRegression),
}

impl CandidateModel {
    /// Unfitted forest with the run's settings
    pub fn random_forest(
        n_estimators: usize,
        criterion: Criterion,
        min_samples_split: usize,
        random_state: u64,
    ) -> Self {
        CandidateModel::RandomForest(
            RandomForest::new(n_estimators)
                .with_criterion(criterion)
                .with_min_samples_split(min_samples_split)
                .with_random_state(random_state),
        )
    }

    /// Unfitted ordinary least squares with intercept
    pub fn linear_regression() -> Self {
        CandidateModel::LinearRegression(LinearRegression::new())
    }

    fn inner(&self) -> &dyn Regressor {
        match self {
            CandidateModel::RandomForest(m) => m,
            CandidateModel::LinearRegression(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Regressor {
        match self {
            CandidateModel::RandomForest(m) => m,
            CandidateModel::LinearRegression(m) => m,
        }
    }
}

impl Regressor for CandidateModel {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.inner_mut().fit(x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.inner().predict(x)
    }

    fn identifier(&self) -> &'static str {
        self.inner().identifier()
    }

    fn hyperparameters(&self) -> BTreeMap<String, String> {
        self.inner().hyperparameters()
    }
}
