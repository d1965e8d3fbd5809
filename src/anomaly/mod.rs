//! Anomaly detection and row filtering
//!
//! - [`OneClassSvm`] - ν one-class SVM with an RBF kernel
//! - [`OutlierFilter`] - standardize, detect, and drop outlier rows in lockstep

mod filter;
mod one_class_svm;

pub use filter::{FilteredSet, OutlierFilter};
pub use one_class_svm::{OneClassSvm, OneClassSvmConfig};

use crate::error::Result;
use ndarray::{Array1, Array2};

/// Trait for novelty detectors
pub trait AnomalyDetector: Send + Sync {
    /// Fit the detector on training data
    fn fit(&mut self, x: &Array2<f64>) -> Result<()>;

    /// Signed distance to the learned boundary (positive = inlier)
    fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Predict labels (-1 = outlier, 1 = inlier)
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i32>>;

    /// Fit and predict in one step
    fn fit_predict(&mut self, x: &Array2<f64>) -> Result<Array1<i32>> {
        self.fit(x)?;
        self.predict(x)
    }
}
