//! One-class SVM novelty detection
//!
//! Solves the ν-formulation
//!
//! ```text
//! min ½ αᵀQα   s.t.  0 ≤ αᵢ ≤ 1,  Σαᵢ = ν·n
//! ```
//!
//! with SMO and second-order working-set selection. The decision value of a
//! sample is `Σ αᵢ K(xᵢ, x) − ρ`; positive means inlier.

use crate::anomaly::AnomalyDetector;
use crate::error::{Result, SpendingError};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, warn};

/// Floor for non-positive curvature in the SMO step
const TAU: f64 = 1e-12;

/// Upper bound on every α
const UPPER: f64 = 1.0;

/// One-class SVM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneClassSvmConfig {
    /// Upper bound on the outlier fraction, lower bound on the support-vector fraction
    pub nu: f64,
    /// RBF kernel width: K(x, y) = exp(-γ‖x − y‖²)
    pub gamma: f64,
    /// Stopping tolerance on the maximal KKT violation
    pub tol: f64,
    /// Iteration cap of the SMO loop
    pub max_iter: usize,
    /// Kernel row cache budget in megabytes
    pub cache_size_mb: usize,
}

impl Default for OneClassSvmConfig {
    fn default() -> Self {
        Self {
            nu: 0.05,
            gamma: 0.25,
            tol: 1e-3,
            max_iter: 10_000_000,
            cache_size_mb: 200,
        }
    }
}

/// Fitted one-class SVM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneClassSvm {
    config: OneClassSvmConfig,
    support_vectors: Option<Array2<f64>>,
    dual_coef: Array1<f64>,
    rho: f64,
}

impl Default for OneClassSvm {
    fn default() -> Self {
        Self::new(OneClassSvmConfig::default())
    }
}

/// Bounded cache of RBF kernel rows.
///
/// Rows are shared through `Arc` so two of them can be held while the cache
/// evicts others.
struct KernelCache<'a> {
    x: &'a Array2<f64>,
    sq_norms: Array1<f64>,
    gamma: f64,
    capacity: usize,
    rows: HashMap<usize, Arc<Array1<f64>>>,
    order: VecDeque<usize>,
}

impl<'a> KernelCache<'a> {
    fn new(x: &'a Array2<f64>, gamma: f64, cache_size_mb: usize) -> Self {
        let row_bytes = (x.nrows() * std::mem::size_of::<f64>()).max(1);
        let capacity = ((cache_size_mb << 20) / row_bytes).max(2);
        let sq_norms = x.map_axis(Axis(1), |row| row.dot(&row));
        Self {
            x,
            sq_norms,
            gamma,
            capacity,
            rows: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn row(&mut self, i: usize) -> Arc<Array1<f64>> {
        if let Some(row) = self.rows.get(&i) {
            return Arc::clone(row);
        }

        let dots = self.x.dot(&self.x.row(i));
        let sq_i = self.sq_norms[i];
        let gamma = self.gamma;
        let values: Vec<f64> = dots
            .as_slice()
            .unwrap_or(&[])
            .par_iter()
            .zip(self.sq_norms.as_slice().unwrap_or(&[]).par_iter())
            .map(|(&dot, &sq_k)| (-gamma * (sq_i + sq_k - 2.0 * dot).max(0.0)).exp())
            .collect();
        let row = Arc::new(Array1::from_vec(values));

        if self.order.len() >= self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.rows.remove(&evicted);
            }
        }
        self.order.push_back(i);
        self.rows.insert(i, Arc::clone(&row));
        row
    }
}

impl OneClassSvm {
    /// Create a new detector
    pub fn new(config: OneClassSvmConfig) -> Self {
        Self {
            config,
            support_vectors: None,
            dual_coef: Array1::zeros(0),
            rho: 0.0,
        }
    }

    /// Set ν
    pub fn with_nu(mut self, nu: f64) -> Self {
        self.config.nu = nu;
        self
    }

    /// Set γ
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.config.gamma = gamma;
        self
    }

    /// Number of support vectors (α > 0)
    pub fn n_support(&self) -> usize {
        self.dual_coef.len()
    }

    fn kernel(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        let sq_dist: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum();
        (-self.config.gamma * sq_dist).exp()
    }

    /// Pick the maximal violating pair, or `None` once the KKT gap is below tol
    fn select_working_set(
        &self,
        alphas: &Array1<f64>,
        grad: &Array1<f64>,
        cache: &mut KernelCache,
    ) -> Option<(usize, usize)> {
        let mut gmax = f64::NEG_INFINITY;
        let mut i_sel = None;
        for (t, (&a, &g)) in alphas.iter().zip(grad.iter()).enumerate() {
            if a < UPPER && -g >= gmax {
                gmax = -g;
                i_sel = Some(t);
            }
        }
        let i = i_sel?;
        let q_i = cache.row(i);

        let mut gmax2 = f64::NEG_INFINITY;
        let mut obj_min = f64::INFINITY;
        let mut j_sel = None;
        for (t, (&a, &g)) in alphas.iter().zip(grad.iter()).enumerate() {
            if a <= 0.0 {
                continue;
            }
            gmax2 = gmax2.max(g);
            let grad_diff = gmax + g;
            if grad_diff > 0.0 {
                // K(x, x) = 1 for the RBF kernel
                let quad = 2.0 - 2.0 * q_i[t];
                let quad = if quad > 0.0 { quad } else { TAU };
                let obj = -(grad_diff * grad_diff) / quad;
                if obj <= obj_min {
                    obj_min = obj;
                    j_sel = Some(t);
                }
            }
        }

        if gmax + gmax2 < self.config.tol {
            return None;
        }
        j_sel.map(|j| (i, j))
    }

    fn compute_rho(alphas: &Array1<f64>, grad: &Array1<f64>) -> f64 {
        let mut ub = f64::INFINITY;
        let mut lb = f64::NEG_INFINITY;
        let mut sum_free = 0.0;
        let mut n_free = 0usize;

        for (&a, &g) in alphas.iter().zip(grad.iter()) {
            if a >= UPPER {
                lb = lb.max(g);
            } else if a <= 0.0 {
                ub = ub.min(g);
            } else {
                n_free += 1;
                sum_free += g;
            }
        }

        if n_free > 0 {
            sum_free / n_free as f64
        } else if ub.is_finite() && lb.is_finite() {
            (ub + lb) / 2.0
        } else if lb.is_finite() {
            lb
        } else {
            ub
        }
    }
}

impl AnomalyDetector for OneClassSvm {
    fn fit(&mut self, x: &Array2<f64>) -> Result<()> {
        let n = x.nrows();
        if n == 0 {
            return Err(SpendingError::DataTooSmall {
                remaining: 0,
                required: 1,
            });
        }
        if !(self.config.nu > 0.0 && self.config.nu <= 1.0) {
            return Err(SpendingError::ModelFit(format!(
                "nu must be in (0, 1], got {}",
                self.config.nu
            )));
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(SpendingError::ModelFit(
                "one-class SVM input contains non-finite values".to_string(),
            ));
        }

        let mut cache = KernelCache::new(x, self.config.gamma, self.config.cache_size_mb);

        // Feasible start: the first ⌊νn⌋ multipliers at the bound, the remainder on the next
        let total = self.config.nu * n as f64;
        let n_full = (total.floor() as usize).min(n);
        let mut alphas = Array1::<f64>::zeros(n);
        for a in alphas.iter_mut().take(n_full) {
            *a = UPPER;
        }
        if n_full < n {
            alphas[n_full] = total - n_full as f64;
        }

        // Gradient of ½αᵀQα is Qα
        let mut grad = Array1::<f64>::zeros(n);
        for i in 0..n {
            if alphas[i] > 0.0 {
                let q_i = cache.row(i);
                grad.scaled_add(alphas[i], &*q_i);
            }
        }

        let mut iter = 0;
        while iter < self.config.max_iter {
            let Some((i, j)) = self.select_working_set(&alphas, &grad, &mut cache) else {
                break;
            };
            iter += 1;

            let q_i = cache.row(i);
            let q_j = cache.row(j);

            let old_i = alphas[i];
            let old_j = alphas[j];

            let quad = 2.0 - 2.0 * q_i[j];
            let quad = if quad > 0.0 { quad } else { TAU };
            let delta = (grad[i] - grad[j]) / quad;
            let sum = old_i + old_j;
            let mut a_i = old_i - delta;
            let mut a_j = old_j + delta;

            if sum > UPPER {
                if a_i > UPPER {
                    a_i = UPPER;
                    a_j = sum - UPPER;
                }
            } else if a_j < 0.0 {
                a_j = 0.0;
                a_i = sum;
            }
            if sum > UPPER {
                if a_j > UPPER {
                    a_j = UPPER;
                    a_i = sum - UPPER;
                }
            } else if a_i < 0.0 {
                a_i = 0.0;
                a_j = sum;
            }

            alphas[i] = a_i;
            alphas[j] = a_j;

            let d_i = a_i - old_i;
            let d_j = a_j - old_j;
            grad.scaled_add(d_i, &*q_i);
            grad.scaled_add(d_j, &*q_j);
        }

        if iter >= self.config.max_iter {
            warn!(max_iter = self.config.max_iter, "One-class SVM reached the iteration cap before converging");
        }

        self.rho = Self::compute_rho(&alphas, &grad);

        let support: Vec<usize> = alphas
            .iter()
            .enumerate()
            .filter(|(_, &a)| a > 0.0)
            .map(|(i, _)| i)
            .collect();
        self.support_vectors = Some(x.select(Axis(0), &support));
        self.dual_coef = support.iter().map(|&i| alphas[i]).collect();

        debug!(
            n_samples = n,
            n_support = support.len(),
            n_iter = iter,
            rho = self.rho,
            "Fitted one-class SVM"
        );

        Ok(())
    }

    fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let sv = self.support_vectors.as_ref().ok_or(SpendingError::ModelNotFitted)?;
        if x.ncols() != sv.ncols() {
            return Err(SpendingError::ShapeError {
                expected: format!("{} features", sv.ncols()),
                actual: format!("{} features", x.ncols()),
            });
        }

        let scores: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|r| {
                let sample = x.row(r);
                let sum: f64 = sv
                    .axis_iter(Axis(0))
                    .zip(self.dual_coef.iter())
                    .map(|(s, &coef)| coef * self.kernel(s, sample))
                    .sum();
                sum - self.rho
            })
            .collect();

        Ok(Array1::from_vec(scores))
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i32>> {
        let scores = self.decision_function(x)?;
        Ok(scores.mapv(|s| if s > 0.0 { 1 } else { -1 }))
    }
}
