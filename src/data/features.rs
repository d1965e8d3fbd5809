//! Feature/target separation

use super::columns::{DATE_COLUMN, TARGET_COLUMN};
use super::f64_column;
use crate::error::{Result, SpendingError};
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Numeric predictors with their column names.
///
/// Column order is part of model compatibility: a model fitted on one order
/// must be scored with the same order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    values: Array2<f64>,
}

impl FeatureMatrix {
    /// Wrap a matrix; `columns` must name every matrix column
    pub fn new(columns: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if columns.len() != values.ncols() {
            return Err(SpendingError::ShapeError {
                expected: format!("{} columns", columns.len()),
                actual: format!("{} columns", values.ncols()),
            });
        }
        Ok(Self { columns, values })
    }

    /// Collect the named columns of a frame, in the given order. Nulls become NaN.
    pub fn from_frame(df: &DataFrame, columns: &[String]) -> Result<Self> {
        let mut values = Array2::zeros((df.height(), columns.len()));
        for (j, name) in columns.iter().enumerate() {
            let column = f64_column(df, name)?;
            for (slot, value) in values.column_mut(j).iter_mut().zip(column.into_iter()) {
                *slot = value.unwrap_or(f64::NAN);
            }
        }
        Self::new(columns.to_vec(), values)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    /// Same columns, values replaced (e.g. after scaling)
    pub fn with_values(&self, values: Array2<f64>) -> Result<Self> {
        Self::new(self.columns.clone(), values)
    }

    /// Rows at `indices`, in that order
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            values: self.values.select(Axis(0), indices),
        }
    }
}

/// Row-aligned predictors, target and dates
#[derive(Debug, Clone)]
pub struct FeatureSet {
    pub features: FeatureMatrix,
    pub target: Array1<f64>,
    pub dates: Vec<String>,
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float64
            | DataType::Float32
            | DataType::Int64
            | DataType::Int32
            | DataType::Int16
            | DataType::Int8
            | DataType::UInt64
            | DataType::UInt32
            | DataType::UInt16
            | DataType::UInt8
    )
}

/// Split a loaded table into target, dates and every other numeric column
pub fn split_features(df: &DataFrame) -> Result<FeatureSet> {
    let target = f64_column(df, TARGET_COLUMN)?;
    let target: Array1<f64> = target
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            v.ok_or_else(|| {
                SpendingError::DataAccess(format!("'{}' is null at row {}", TARGET_COLUMN, i))
            })
        })
        .collect::<Result<Vec<f64>>>()?
        .into();

    let dates_series = df
        .column(DATE_COLUMN)
        .map_err(|_| SpendingError::DataAccess(format!("missing column '{}'", DATE_COLUMN)))?
        .as_materialized_series()
        .cast(&DataType::String)?;
    let dates: Vec<String> = dates_series
        .str()?
        .into_iter()
        .map(|d| d.unwrap_or_default().to_string())
        .collect();

    let feature_columns: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|c| c.name().as_str() != TARGET_COLUMN && c.name().as_str() != DATE_COLUMN)
        .filter(|c| is_numeric(c.dtype()))
        .map(|c| c.name().to_string())
        .collect();

    if feature_columns.is_empty() {
        return Err(SpendingError::DataAccess("no numeric predictor columns".to_string()));
    }

    let features = FeatureMatrix::from_frame(df, &feature_columns)?;

    Ok(FeatureSet {
        features,
        target,
        dates,
    })
}
