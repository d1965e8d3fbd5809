//! Chronological train/test holdout

use crate::error::{Result, SpendingError};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Fewest rows the splitter accepts before reasoning about history length
pub const MIN_ROWS: usize = 2;

/// One chronological train/test partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeriesSplit {
    /// Training indices (earliest block)
    pub train_indices: Vec<usize>,
    /// Test indices (block after the gap)
    pub test_indices: Vec<usize>,
    /// Rows excluded between the two blocks
    pub gap: usize,
}

impl TimeSeriesSplit {
    fn from_ranges(train: Range<usize>, test: Range<usize>, gap: usize) -> Self {
        Self {
            train_indices: train.collect(),
            test_indices: test.collect(),
            gap,
        }
    }
}

/// Single train/gap/test split over a chronologically ordered series.
///
/// The gap is taken first; the remaining `n - gap` rows are shared between
/// train and test in proportion `train_fraction : test_fraction`, so
/// `train + gap + test == n` always holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldoutSplit {
    train_fraction: f64,
    test_fraction: f64,
    gap: usize,
}

impl Default for HoldoutSplit {
    fn default() -> Self {
        Self::new(0.75, 0.25, 360)
    }
}

impl HoldoutSplit {
    /// Create a splitter
    pub fn new(train_fraction: f64, test_fraction: f64, gap: usize) -> Self {
        Self {
            train_fraction,
            test_fraction,
            gap,
        }
    }

    /// Set gap between train and test
    pub fn with_gap(mut self, gap: usize) -> Self {
        self.gap = gap;
        self
    }

    /// Partition `n_samples` rows
    pub fn split(&self, n_samples: usize) -> Result<TimeSeriesSplit> {
        if n_samples < MIN_ROWS {
            return Err(SpendingError::DataTooSmall {
                remaining: n_samples,
                required: MIN_ROWS,
            });
        }
        if !(self.train_fraction > 0.0 && self.test_fraction > 0.0) {
            return Err(SpendingError::Config(format!(
                "split fractions must be positive, got {} and {}",
                self.train_fraction, self.test_fraction
            )));
        }

        // One row each for train and test, plus the gap
        let required = self.gap + 2;
        if n_samples < required {
            return Err(SpendingError::InsufficientHistory {
                required,
                available: n_samples,
            });
        }

        let available = n_samples - self.gap;
        let share = self.train_fraction / (self.train_fraction + self.test_fraction);
        let train_len = (available as f64 * share).floor() as usize;
        let test_len = available - train_len;

        if train_len == 0 || test_len == 0 {
            return Err(SpendingError::InsufficientHistory {
                required,
                available: n_samples,
            });
        }

        let test_start = train_len + self.gap;
        Ok(TimeSeriesSplit::from_ranges(
            0..train_len,
            test_start..n_samples,
            self.gap,
        ))
    }
}
