//! Time series module
//!
//! Provides the chronological holdout used to score candidate models
//! without look-ahead.

mod validation;

pub use validation::{HoldoutSplit, TimeSeriesSplit, MIN_ROWS};
