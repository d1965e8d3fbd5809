//! Data preprocessing module
//!
//! Provides feature scaling ahead of outlier detection and model fitting.

mod scaler;

pub use scaler::StandardScaler;
