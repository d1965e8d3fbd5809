//! Regression metrics

use crate::error::{Result, SpendingError};
use ndarray::Array1;

fn check_lengths(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(SpendingError::ShapeError {
            expected: format!("{} predictions", y_true.len()),
            actual: format!("{} predictions", y_pred.len()),
        });
    }
    if y_true.is_empty() {
        return Err(SpendingError::DataTooSmall {
            remaining: 0,
            required: 1,
        });
    }
    Ok(())
}

/// Mean absolute percentage error, as a fraction: mean(|y − ŷ| / |y|).
///
/// A zero in `y_true` makes the ratio undefined and is reported as an error
/// naming the first such row.
pub fn mean_absolute_percentage_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    check_lengths(y_true, y_pred)?;

    let mut total = 0.0;
    for (row, (&t, &p)) in y_true.iter().zip(y_pred.iter()).enumerate() {
        if t == 0.0 {
            return Err(SpendingError::UndefinedMape { row });
        }
        total += ((t - p) / t).abs();
    }
    Ok(total / y_true.len() as f64)
}

/// Mean absolute error
pub fn mean_absolute_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    check_lengths(y_true, y_pred)?;
    Ok((y_true - y_pred).mapv(f64::abs).sum() / y_true.len() as f64)
}

/// Root mean squared error
pub fn root_mean_squared_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    check_lengths(y_true, y_pred)?;
    Ok(((y_true - y_pred).mapv(|d| d * d).sum() / y_true.len() as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mape_perfect_prediction() {
        let y = array![10.0, 20.0, 30.0];
        assert_eq!(mean_absolute_percentage_error(&y, &y).unwrap(), 0.0);
    }

    #[test]
    fn test_mape_double_prediction() {
        let y = array![10.0, 20.0, 30.0];
        let doubled = &y * 2.0;
        assert!((mean_absolute_percentage_error(&y, &doubled).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_mape_uses_absolute_true_value() {
        let y = array![-10.0, 10.0];
        let pred = array![-11.0, 9.0];
        assert!((mean_absolute_percentage_error(&y, &pred).unwrap() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_mape_zero_true_value() {
        let err = mean_absolute_percentage_error(&array![1.0, 0.0, 2.0], &array![1.0, 1.0, 1.0]).unwrap_err();
        assert!(matches!(err, SpendingError::UndefinedMape { row: 1 }));
    }

    #[test]
    fn test_length_mismatch_and_empty() {
        assert!(matches!(
            mean_absolute_percentage_error(&array![1.0], &array![1.0, 2.0]),
            Err(SpendingError::ShapeError { .. })
        ));
        assert!(matches!(
            mean_absolute_percentage_error(&Array1::zeros(0), &Array1::zeros(0)),
            Err(SpendingError::DataTooSmall { .. })
        ));
    }

    #[test]
    fn test_mae_and_rmse() {
        let y = array![1.0, 2.0, 3.0];
        let pred = array![2.0, 2.0, 1.0];
        assert!((mean_absolute_error(&y, &pred).unwrap() - 1.0).abs() < 1e-12);
        assert!((root_mean_squared_error(&y, &pred).unwrap() - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }
}
