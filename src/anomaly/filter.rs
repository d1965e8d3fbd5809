//! Outlier filtering of a feature set

use super::{AnomalyDetector, OneClassSvm, OneClassSvmConfig};
use crate::data::{FeatureMatrix, FeatureSet};
use crate::error::{Result, SpendingError};
use crate::preprocessing::StandardScaler;
use ndarray::{Array1, Axis};
use tracing::info;

/// Rows that survived filtering, on the standardized scale
#[derive(Debug, Clone)]
pub struct FilteredSet {
    /// Standardized predictors of the kept rows
    pub features: FeatureMatrix,
    pub target: Array1<f64>,
    pub dates: Vec<String>,
    /// One entry per input row, `true` = kept
    pub mask: Vec<bool>,
    /// Scaler fitted on all input rows
    pub scaler: StandardScaler,
}

impl FilteredSet {
    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    /// Rows removed by the detector
    pub fn n_dropped(&self) -> usize {
        self.mask.iter().filter(|kept| !**kept).count()
    }
}

/// Standardizes predictors, fits a novelty detector on them and drops the
/// rows it labels as outliers from predictors, target and dates alike.
#[derive(Debug, Clone)]
pub struct OutlierFilter<D: AnomalyDetector = OneClassSvm> {
    detector: D,
}

impl OutlierFilter<OneClassSvm> {
    /// Filter with a one-class SVM of the given ν and γ
    pub fn one_class(nu: f64, gamma: f64) -> Self {
        Self::new(OneClassSvm::new(OneClassSvmConfig {
            nu,
            gamma,
            ..Default::default()
        }))
    }
}

impl<D: AnomalyDetector> OutlierFilter<D> {
    pub fn new(detector: D) -> Self {
        Self { detector }
    }

    /// The detector, fitted after [`apply`](Self::apply)
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Filter `set`. Statistics come from `set` itself; no row is modified
    /// other than by scaling.
    pub fn apply(&mut self, set: &FeatureSet) -> Result<FilteredSet> {
        if set.is_empty() {
            return Err(SpendingError::DataTooSmall {
                remaining: 0,
                required: 1,
            });
        }

        let raw = set.features.values();
        if let Some(pos) = raw.iter().position(|v| !v.is_finite()) {
            let (row, col) = (pos / raw.ncols(), pos % raw.ncols());
            return Err(SpendingError::ModelFit(format!(
                "non-finite value in column '{}' at row {}",
                set.features.columns()[col],
                row
            )));
        }

        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(raw)?;

        let labels = self.detector.fit_predict(&scaled)?;
        let mask: Vec<bool> = labels.iter().map(|&l| l == 1).collect();
        let kept: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter(|(_, keep)| **keep)
            .map(|(i, _)| i)
            .collect();

        let features = set.features.with_values(scaled)?.select_rows(&kept);
        let target = set.target.select(Axis(0), &kept);
        let dates = kept.iter().map(|&i| set.dates[i].clone()).collect();

        info!(
            rows_in = set.len(),
            rows_kept = kept.len(),
            rows_dropped = set.len() - kept.len(),
            "Filtered outliers"
        );

        Ok(FilteredSet {
            features,
            target,
            dates,
            mask,
            scaler,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    /// Detector that flags every row whose first feature exceeds a cutoff
    struct Threshold(f64);

    impl AnomalyDetector for Threshold {
        fn fit(&mut self, _x: &Array2<f64>) -> Result<()> {
            Ok(())
        }

        fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
            Ok(x.column(0).mapv(|v| self.0 - v))
        }

        fn predict(&self, x: &Array2<f64>) -> Result<Array1<i32>> {
            Ok(self.decision_function(x)?.mapv(|s| if s > 0.0 { 1 } else { -1 }))
        }
    }

    fn feature_set(n: usize) -> FeatureSet {
        let values = Array2::from_shape_fn((n, 2), |(i, j)| (i * (j + 1)) as f64);
        FeatureSet {
            features: FeatureMatrix::new(vec!["a".into(), "b".into()], values).unwrap(),
            target: Array1::from_iter((0..n).map(|i| 10.0 + i as f64)),
            dates: (0..n).map(|i| format!("day-{}", i)).collect(),
        }
    }

    #[test]
    fn test_mask_drops_in_lockstep() {
        let set = feature_set(10);
        // Standardized first column exceeds 1.0 for the last two rows
        let mut filter = OutlierFilter::new(Threshold(1.0));
        let out = filter.apply(&set).unwrap();

        assert_eq!(out.mask.len(), set.len());
        let dropped = out.n_dropped();
        assert_eq!(dropped, 2);
        assert_eq!(out.features.nrows(), set.len() - dropped);
        assert_eq!(out.target.len(), set.len() - dropped);
        assert_eq!(out.dates.len(), set.len() - dropped);
        assert_eq!(out.target[0], 10.0);
        assert_eq!(out.dates.last().map(String::as_str), Some("day-7"));
    }

    #[test]
    fn test_features_are_standardized() {
        let set = feature_set(10);
        let mut filter = OutlierFilter::new(Threshold(f64::INFINITY));
        let out = filter.apply(&set).unwrap();
        assert_eq!(out.n_dropped(), 0);
        let mean = out.features.values().column(0).sum() / 10.0;
        assert!(mean.abs() < 1e-12);
        assert_eq!(out.features.columns(), set.features.columns());
    }

    #[test]
    fn test_one_class_filter_keeps_most_rows() {
        let set = feature_set(40);
        let mut filter = OutlierFilter::one_class(0.05, 0.25);
        let out = filter.apply(&set).unwrap();
        assert_eq!(out.mask.len(), 40);
        assert!(out.len() >= 30, "kept {}", out.len());
        assert_eq!(out.len() + out.n_dropped(), 40);
    }

    #[test]
    fn test_empty_input() {
        let set = feature_set(0);
        let mut filter = OutlierFilter::one_class(0.05, 0.25);
        assert!(matches!(
            filter.apply(&set),
            Err(SpendingError::DataTooSmall { remaining: 0, .. })
        ));
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut set = feature_set(5);
        let mut values = set.features.values().clone();
        values[[3, 1]] = f64::NAN;
        set.features = set.features.with_values(values).unwrap();

        let mut filter = OutlierFilter::one_class(0.05, 0.25);
        match filter.apply(&set) {
            Err(SpendingError::ModelFit(msg)) => assert!(msg.contains("'b'") && msg.contains("row 3")),
            other => panic!("unexpected result: {:?}", other.map(|s| s.len())),
        }
    }
}
