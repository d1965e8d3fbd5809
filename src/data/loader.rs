//! CSV loading

use super::columns::{CATEGORY_COLUMNS, DATE_COLUMN, REGION_COLUMN, TARGET_COLUMN};
use super::f64_column;
use crate::error::{Result, SpendingError};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Reader for the spending CSV
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Field separator
    separator: u8,
    /// Rows scanned to infer column types (None = whole file)
    infer_schema_length: Option<usize>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a loader for comma-separated files
    pub fn new() -> Self {
        Self {
            separator: b',',
            infer_schema_length: Some(10_000),
        }
    }

    /// Load the table, check its schema and recompute `total spending`.
    ///
    /// The file handle is dropped as soon as the reader finishes.
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let df = {
            let file = File::open(path).map_err(|e| {
                SpendingError::DataAccess(format!("cannot open {}: {}", path.display(), e))
            })?;

            let parse_opts = CsvParseOptions::default().with_separator(self.separator);

            CsvReadOptions::default()
                .with_has_header(true)
                .with_infer_schema_length(self.infer_schema_length)
                .with_parse_options(parse_opts)
                .into_reader_with_file_handle(file)
                .finish()
                .map_err(|e| {
                    SpendingError::DataAccess(format!("cannot parse {}: {}", path.display(), e))
                })?
        };

        debug!(rows = df.height(), cols = df.width(), path = %path.display(), "Read CSV");

        check_schema(&df)?;
        with_total_spending(df)
    }

    /// Write a table as CSV, replacing `path` if it exists
    pub fn write_csv(&self, df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut file = File::create(path).map_err(|e| {
            SpendingError::Persistence(format!("cannot create {}: {}", path.display(), e))
        })?;

        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(self.separator)
            .finish(df)
            .map_err(|e| {
                SpendingError::Persistence(format!("cannot write {}: {}", path.display(), e))
            })
    }
}

fn check_schema(df: &DataFrame) -> Result<()> {
    let required = [DATE_COLUMN, REGION_COLUMN]
        .into_iter()
        .chain(CATEGORY_COLUMNS);

    for name in required {
        if df.column(name).is_err() {
            return Err(SpendingError::DataAccess(format!(
                "missing expected column '{}'",
                name
            )));
        }
    }
    Ok(())
}

/// Replace (or add) `total spending` with the row-wise sum of the eight
/// category columns. Missing category values count as zero.
///
/// The category columns are stored back as `Float64`, so a column that
/// is empty in every row still counts as a predictor.
pub fn with_total_spending(mut df: DataFrame) -> Result<DataFrame> {
    let mut totals = vec![0.0f64; df.height()];

    for name in CATEGORY_COLUMNS {
        let values = f64_column(&df, name)?;
        for (total, value) in totals.iter_mut().zip(&values) {
            *total += value.unwrap_or(0.0);
        }
        df.with_column(values.into_series())?;
    }

    df.with_column(Series::new(TARGET_COLUMN.into(), totals))?;
    Ok(df)
}
