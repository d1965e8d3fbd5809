//! Ordinary least squares

use crate::error::{Result, SpendingError};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Cholesky factor-and-solve of a symmetric positive-definite system.
/// Returns None as soon as a pivot is not safely positive.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    let scale = a.diag().iter().map(|v| v.abs()).fold(0.0, f64::max).max(f64::MIN_POSITIVE);
    let mut l = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }

            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 1e-12 * scale {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // L y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // Lᵀ x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    Some(x)
}

/// Gauss-Jordan elimination with partial pivoting on [A | b]
fn gauss_jordan_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    let mut aug = Array2::<f64>::zeros((n, n + 1));
    aug.slice_mut(ndarray::s![.., ..n]).assign(a);
    aug.column_mut(n).assign(b);

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&r1, &r2| aug[[r1, col]].abs().total_cmp(&aug[[r2, col]].abs()))
            .unwrap_or(col);

        if pivot_row != col {
            for j in 0..=n {
                aug.swap([col, j], [pivot_row, j]);
            }
        }

        let pivot = aug[[col, col]];
        if pivot.abs() < 1e-10 {
            return None;
        }
        for j in 0..=n {
            aug[[col, j]] /= pivot;
        }

        for row in 0..n {
            if row != col {
                let factor = aug[[row, col]];
                if factor != 0.0 {
                    for j in 0..=n {
                        aug[[row, j]] -= factor * aug[[col, j]];
                    }
                }
            }
        }
    }

    Some(aug.column(n).to_owned())
}

/// Solve the normal equations (XᵀX) w = Xᵀy.
///
/// Cholesky first; on a non-positive pivot the diagonal gets a small ridge
/// proportional to its mean magnitude and Cholesky is retried. Gauss-Jordan
/// is the last resort.
fn solve_least_squares(x: &Array2<f64>, y: &Array1<f64>) -> Option<Array1<f64>> {
    let xtx = x.t().dot(x);
    let xty = x.t().dot(y);
    let n = xtx.nrows();

    if let Some(w) = cholesky_solve(&xtx, &xty) {
        return Some(w);
    }

    debug!("normal equations not positive definite, retrying with ridge");
    let ridge = 1e-8 * xtx.diag().iter().map(|v| v.abs()).sum::<f64>() / n.max(1) as f64;
    let mut regularized = xtx.clone();
    for k in 0..n {
        regularized[[k, k]] += ridge;
    }
    if let Some(w) = cholesky_solve(&regularized, &xty) {
        return Some(w);
    }

    debug!("falling back to Gauss-Jordan");
    gauss_jordan_solve(&xtx, &xty)
}

/// Linear regression model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Fitted coefficients (weights)
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept (bias)
    pub intercept: Option<f64>,
    /// Whether to fit intercept
    pub fit_intercept: bool,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    /// Create a new linear regression model
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            fit_intercept: true,
        }
    }

    /// Enable/disable fitting intercept
    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    pub fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }

    /// Fit the model to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();

        if n_samples != y.len() {
            return Err(SpendingError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(SpendingError::ModelFit("cannot fit a linear model on zero samples".to_string()));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(SpendingError::ModelFit("non-finite value in linear model input".to_string()));
        }

        // Centering removes the intercept from the system
        let (x_centered, y_centered, offsets) = if self.fit_intercept {
            let x_mean = x.sum_axis(Axis(0)) / n_samples as f64;
            let y_mean = y.sum() / n_samples as f64;
            let x_centered = x - &x_mean.view().insert_axis(Axis(0));
            let y_centered = y - y_mean;
            (x_centered, y_centered, Some((x_mean, y_mean)))
        } else {
            (x.clone(), y.clone(), None)
        };

        let coefficients = solve_least_squares(&x_centered, &y_centered).ok_or_else(|| {
            SpendingError::ModelFit("matrix is singular, cannot solve least squares".to_string())
        })?;

        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(SpendingError::ModelFit("least squares produced non-finite coefficients".to_string()));
        }

        let intercept = match offsets {
            Some((x_mean, y_mean)) => y_mean - coefficients.dot(&x_mean),
            None => 0.0,
        };

        self.coefficients = Some(coefficients);
        self.intercept = Some(intercept);

        Ok(self)
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(SpendingError::ModelNotFitted)?;

        if x.ncols() != coefficients.len() {
            return Err(SpendingError::ShapeError {
                expected: format!("{} features", coefficients.len()),
                actual: format!("{} features", x.ncols()),
            });
        }

        Ok(x.dot(coefficients) + self.intercept.unwrap_or(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_linear_regression_simple() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![2.0, 4.0, 6.0, 8.0, 10.0];

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        let coef = model.coefficients.as_ref().unwrap();
        assert!((coef[0] - 2.0).abs() < 1e-9);
        assert!(model.intercept.unwrap().abs() < 1e-9);

        let pred = model.predict(&array![[6.0]]).unwrap();
        assert!((pred[0] - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_recovers_intercept_and_weights() {
        let x = Array2::from_shape_fn((50, 2), |(i, j)| ((i * (j + 3)) % 17) as f64);
        let y = x.column(0).mapv(|v| 3.0 * v) - x.column(1).mapv(|v| 0.5 * v) + 7.0;

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        let coef = model.coefficients.as_ref().unwrap();
        assert!((coef[0] - 3.0).abs() < 1e-8);
        assert!((coef[1] + 0.5).abs() < 1e-8);
        assert!((model.intercept.unwrap() - 7.0).abs() < 1e-8);
    }

    #[test]
    fn test_collinear_columns_still_predict() {
        // Second column duplicates the first
        let x = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [4.0, 4.0]];
        let y = array![3.0, 5.0, 7.0, 9.0];

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();
        let pred = model.predict(&x).unwrap();
        for (p, t) in pred.iter().zip(y.iter()) {
            assert!((p - t).abs() < 1e-4, "{} vs {}", p, t);
        }
    }

    #[test]
    fn test_without_intercept() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![3.0, 6.0, 9.0];
        let mut model = LinearRegression::new().with_fit_intercept(false);
        model.fit(&x, &y).unwrap();
        assert_eq!(model.intercept, Some(0.0));
        assert!((model.coefficients.as_ref().unwrap()[0] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_input() {
        let mut model = LinearRegression::new();
        let err = model.fit(&array![[1.0], [f64::NAN]], &array![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, SpendingError::ModelFit(_)));
    }

    #[test]
    fn test_predict_before_fit() {
        let model = LinearRegression::new();
        assert!(matches!(model.predict(&array![[1.0]]), Err(SpendingError::ModelNotFitted)));
    }

    #[test]
    fn test_gauss_jordan_solve() {
        let a = array![[0.0, 2.0], [3.0, 1.0]];
        let b = array![4.0, 5.0];
        let x = gauss_jordan_solve(&a, &b).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 2.0).abs() < 1e-12);
        assert!(gauss_jordan_solve(&array![[1.0, 2.0], [2.0, 4.0]], &array![1.0, 2.0]).is_none());
    }
}
