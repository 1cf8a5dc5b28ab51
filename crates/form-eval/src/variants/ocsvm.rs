//! One-class SVM with an RBF kernel, solved by pairwise (SMO) updates.

use form_core::FormError;
use serde::{Deserialize, Serialize};

use super::{check_positive, check_unit_open, fit_positive, rbf, Basis};
use crate::evaluator::Evaluator;
use crate::special::{median, sigmoid, std_dev};
use crate::table::ReferenceTable;

fn default_nu() -> f64 {
    0.1
}

fn default_tolerance() -> f64 {
    1e-4
}

fn default_max_iter() -> usize {
    10_000
}

/// Hyperparameters of [`OneClassSvm`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneClassSvmOpts {
    /// Upper bound on the share of training outliers.
    #[serde(default = "default_nu")]
    pub nu: f64,
    /// RBF width; `1 / parameters` when absent.
    #[serde(default)]
    pub gamma: Option<f64>,
    /// Stopping gap of the optimality conditions.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Iteration cap.
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
}

impl Default for OneClassSvmOpts {
    fn default() -> Self {
        Self {
            nu: default_nu(),
            gamma: None,
            tolerance: default_tolerance(),
            max_iter: default_max_iter(),
        }
    }
}

/// Sigmoid of the decision value centred on the training median.
#[derive(Debug, Clone, PartialEq)]
pub struct OneClassSvm {
    basis: Basis,
    support: Vec<(f64, Vec<f64>)>,
    gamma: f64,
    rho: f64,
    centre: f64,
    spread: f64,
}

impl OneClassSvm {
    /// Solves `min 1/2 a'Ka` subject to `0 <= a_i <= 1`, `sum a = nu * n`.
    pub fn fit(parameters: &[String], positive: &ReferenceTable, opts: &OneClassSvmOpts) -> Result<Self, FormError> {
        const NAME: &str = "one-class-svm";
        check_unit_open(NAME, "nu", opts.nu)?;
        check_positive(NAME, "tolerance", opts.tolerance)?;
        if let Some(gamma) = opts.gamma {
            check_positive(NAME, "gamma", gamma)?;
        }
        let (basis, z) = fit_positive(NAME, parameters, positive, 2)?;
        let n = z.len();
        let gamma = opts.gamma.unwrap_or(1.0 / parameters.len() as f64);
        let kernel: Vec<Vec<f64>> = z
            .iter()
            .map(|a| z.iter().map(|b| rbf(gamma, a, b)).collect())
            .collect();

        let budget = opts.nu * n as f64;
        let mut alpha = vec![0.0; n];
        let full = budget.floor() as usize;
        for a in alpha.iter_mut().take(full) {
            *a = 1.0;
        }
        if full < n {
            alpha[full] = budget - full as f64;
        }
        let mut grad: Vec<f64> = (0..n)
            .map(|i| (0..n).map(|j| kernel[i][j] * alpha[j]).sum())
            .collect();

        for _ in 0..opts.max_iter {
            let up = (0..n)
                .filter(|&i| alpha[i] < 1.0)
                .min_by(|&a, &b| grad[a].total_cmp(&grad[b]));
            let down = (0..n)
                .filter(|&j| alpha[j] > 0.0)
                .max_by(|&a, &b| grad[a].total_cmp(&grad[b]));
            let (Some(i), Some(j)) = (up, down) else {
                break;
            };
            if grad[j] - grad[i] < opts.tolerance {
                break;
            }
            let curvature = (kernel[i][i] + kernel[j][j] - 2.0 * kernel[i][j]).max(1e-12);
            let step = ((grad[j] - grad[i]) / curvature)
                .min(1.0 - alpha[i])
                .min(alpha[j]);
            alpha[i] += step;
            alpha[j] -= step;
            for (k, g) in grad.iter_mut().enumerate() {
                *g += step * (kernel[k][i] - kernel[k][j]);
            }
        }

        let free: Vec<f64> = (0..n)
            .filter(|&i| alpha[i] > 1e-9 && alpha[i] < 1.0 - 1e-9)
            .map(|i| grad[i])
            .collect();
        let rho = if free.is_empty() {
            let lo = (0..n).filter(|&i| alpha[i] > 0.0).map(|i| grad[i]).fold(f64::NEG_INFINITY, f64::max);
            let hi = (0..n).filter(|&i| alpha[i] < 1.0).map(|i| grad[i]).fold(f64::INFINITY, f64::min);
            match (lo.is_finite(), hi.is_finite()) {
                (true, true) => (lo + hi) / 2.0,
                (true, false) => lo,
                (false, true) => hi,
                (false, false) => 0.0,
            }
        } else {
            free.iter().sum::<f64>() / free.len() as f64
        };

        let support: Vec<(f64, Vec<f64>)> = alpha
            .iter()
            .zip(&z)
            .filter(|(a, _)| **a > 1e-12)
            .map(|(a, row)| (*a, row.clone()))
            .collect();
        let mut model = Self {
            basis,
            support,
            gamma,
            rho,
            centre: 0.0,
            spread: 1.0,
        };
        let reference: Vec<f64> = z.iter().map(|row| model.decision(row)).collect();
        model.centre = median(&reference);
        let spread = std_dev(&reference);
        model.spread = if spread > f64::EPSILON { spread } else { 1.0 };
        Ok(model)
    }

    fn decision(&self, z: &[f64]) -> f64 {
        self.support
            .iter()
            .map(|(a, row)| a * rbf(self.gamma, row, z))
            .sum::<f64>()
            - self.rho
    }
}

impl Evaluator for OneClassSvm {
    fn name(&self) -> &'static str {
        "one-class-svm"
    }

    fn parameters(&self) -> &[String] {
        &self.basis.parameters
    }

    fn score_row(&self, row: &[f64]) -> f64 {
        sigmoid((self.decision(&self.basis.z(row)) - self.centre) / self.spread)
    }
}
