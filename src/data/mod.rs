//! Spending data: loading, the typed row record and feature extraction
//!
//! - [`DataLoader`] reads the CSV and recomputes `total spending`
//! - [`SpendingRecord`] is the immutable typed row
//! - [`split_features`] separates target, dates and numeric predictors

mod columns;
mod features;
mod loader;
mod record;

pub use columns::{CATEGORY_COLUMNS, DATE_COLUMN, N_CATEGORIES, REGION_COLUMN, TARGET_COLUMN};
pub use features::{split_features, FeatureMatrix, FeatureSet};
pub use loader::{with_total_spending, DataLoader};
pub use record::{records, summarize, DatasetSummary, SpendingRecord};

use crate::error::{Result, SpendingError};
use polars::prelude::*;

/// Read a column as nullable `f64` values. Empty cells stay null; any value
/// that does not parse as a number is an error.
pub(crate) fn f64_column(df: &DataFrame, name: &str) -> Result<Float64Chunked> {
    let column = df
        .column(name)
        .map_err(|_| SpendingError::DataAccess(format!("missing column '{}'", name)))?;
    let casted = column
        .as_materialized_series()
        .strict_cast(&DataType::Float64)
        .map_err(|e| SpendingError::DataAccess(format!("column '{}' is not numeric: {}", name, e)))?;
    Ok(casted.f64()?.clone())
}
