//! Typed spending row

use super::columns::{CATEGORY_COLUMNS, DATE_COLUMN, N_CATEGORIES, REGION_COLUMN};
use super::f64_column;
use crate::error::{Result, SpendingError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One (date, region) observation.
///
/// The total is derived from the categories on construction and cannot be
/// set independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingRecord {
    date: String,
    region_code: Option<i64>,
    categories: [f64; N_CATEGORIES],
    total_spending: f64,
}

impl SpendingRecord {
    /// Build a record; `total_spending` is the sum of `categories`
    pub fn new(date: impl Into<String>, region_code: Option<i64>, categories: [f64; N_CATEGORIES]) -> Self {
        let total_spending = categories.iter().fold(0.0, |acc, v| acc + v);
        Self {
            date: date.into(),
            region_code,
            categories,
            total_spending,
        }
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn region_code(&self) -> Option<i64> {
        self.region_code
    }

    /// Category values in [`CATEGORY_COLUMNS`] order
    pub fn categories(&self) -> &[f64; N_CATEGORIES] {
        &self.categories
    }

    pub fn total_spending(&self) -> f64 {
        self.total_spending
    }
}

/// Convert every row of a loaded table into a [`SpendingRecord`]
pub fn records(df: &DataFrame) -> Result<Vec<SpendingRecord>> {
    let n = df.height();

    let dates = df
        .column(DATE_COLUMN)
        .map_err(|_| SpendingError::DataAccess(format!("missing column '{}'", DATE_COLUMN)))?
        .as_materialized_series()
        .cast(&DataType::String)?;
    let dates = dates.str()?;

    let regions = df
        .column(REGION_COLUMN)
        .map_err(|_| SpendingError::DataAccess(format!("missing column '{}'", REGION_COLUMN)))?
        .as_materialized_series()
        .cast(&DataType::Int64)?;
    let regions = regions.i64()?;

    let categories: Vec<Float64Chunked> = CATEGORY_COLUMNS
        .iter()
        .map(|name| f64_column(df, name))
        .collect::<Result<_>>()?;

    let rows = (0..n)
        .map(|i| {
            let mut values = [0.0; N_CATEGORIES];
            for (slot, column) in values.iter_mut().zip(&categories) {
                *slot = column.get(i).unwrap_or(0.0);
            }
            SpendingRecord::new(dates.get(i).unwrap_or_default(), regions.get(i), values)
        })
        .collect();

    Ok(rows)
}

/// Shape of a dataset: rows, distinct dates and distinct regions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub n_rows: usize,
    pub n_dates: usize,
    pub n_regions: usize,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
}

/// Count rows, distinct dates and distinct region codes. The date range is
/// the earliest and latest ISO date, whatever the row order.
pub fn summarize(records: &[SpendingRecord]) -> DatasetSummary {
    let dates: BTreeSet<&str> = records.iter().map(|r| r.date()).collect();
    let regions: BTreeSet<i64> = records.iter().filter_map(|r| r.region_code()).collect();

    DatasetSummary {
        n_rows: records.len(),
        n_dates: dates.len(),
        n_regions: regions.len(),
        first_date: dates.first().map(|d| d.to_string()),
        last_date: dates.last().map(|d| d.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_is_category_sum() {
        let record = SpendingRecord::new("2020-02-01", Some(6), [0.1, 0.2, 0.3, 0.4, -0.5, 0.6, 0.7, 0.8]);
        let expected = 0.1 + 0.2 + 0.3 + 0.4 - 0.5 + 0.6 + 0.7 + 0.8;
        assert_eq!(record.total_spending(), expected);
    }

    #[test]
    fn test_summary_counts_distinct_values() {
        let cats = [1.0; N_CATEGORIES];
        let rows = vec![
            SpendingRecord::new("2020-01-13", Some(1), cats),
            SpendingRecord::new("2020-01-13", Some(2), cats),
            SpendingRecord::new("2020-01-14", Some(1), cats),
            SpendingRecord::new("2020-01-14", None, cats),
        ];

        let summary = summarize(&rows);
        assert_eq!(summary.n_rows, 4);
        assert_eq!(summary.n_dates, 2);
        assert_eq!(summary.n_regions, 2);
        assert_eq!(summary.first_date.as_deref(), Some("2020-01-13"));
        assert_eq!(summary.last_date.as_deref(), Some("2020-01-14"));
    }

    #[test]
    fn test_summary_range_ignores_row_order() {
        let cats = [1.0; N_CATEGORIES];
        let rows = vec![
            SpendingRecord::new("2020-03-02", Some(1), cats),
            SpendingRecord::new("2020-01-20", Some(1), cats),
            SpendingRecord::new("2020-04-11", Some(1), cats),
            SpendingRecord::new("2020-02-05", Some(1), cats),
        ];

        let summary = summarize(&rows);
        assert_eq!(summary.first_date.as_deref(), Some("2020-01-20"));
        assert_eq!(summary.last_date.as_deref(), Some("2020-04-11"));
    }

    #[test]
    fn test_summary_empty() {
        let summary = summarize(&[]);
        assert_eq!(summary.n_rows, 0);
        assert!(summary.first_date.is_none());
    }
}
