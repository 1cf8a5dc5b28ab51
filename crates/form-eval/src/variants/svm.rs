//! Kernel SVM trained with Pegasos, calibrated with Platt scaling.

use form_core::{FormError, RngHandle, Stream};
use serde::{Deserialize, Serialize};

use super::{check_positive, fit_binary, rbf, Basis};
use crate::evaluator::Evaluator;
use crate::special::sigmoid;
use crate::table::ReferenceTable;

fn default_lambda() -> f64 {
    0.01
}

fn default_epochs() -> usize {
    50
}

/// Hyperparameters of [`RbfSvmBinary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RbfSvmOpts {
    /// Regularisation strength.
    #[serde(default = "default_lambda")]
    pub lambda: f64,
    /// RBF width; `1 / parameters` when absent.
    #[serde(default)]
    pub gamma: Option<f64>,
    /// Passes over the training rows.
    #[serde(default = "default_epochs")]
    pub epochs: usize,
}

impl Default for RbfSvmOpts {
    fn default() -> Self {
        Self {
            lambda: default_lambda(),
            gamma: None,
            epochs: default_epochs(),
        }
    }
}

/// Platt-calibrated probability of the positive class.
#[derive(Debug, Clone, PartialEq)]
pub struct RbfSvmBinary {
    basis: Basis,
    support: Vec<(f64, Vec<f64>)>,
    gamma: f64,
    platt_a: f64,
    platt_b: f64,
}

impl RbfSvmBinary {
    /// Trains on positives (`+1`) against contrast rows (`-1`).
    pub fn fit(
        parameters: &[String],
        positive: &ReferenceTable,
        contrast: &ReferenceTable,
        opts: &RbfSvmOpts,
        seed: u64,
    ) -> Result<Self, FormError> {
        const NAME: &str = "rbf-svm-binary";
        check_positive(NAME, "lambda", opts.lambda)?;
        check_positive(NAME, "epochs", opts.epochs as f64)?;
        if let Some(gamma) = opts.gamma {
            check_positive(NAME, "gamma", gamma)?;
        }
        let (basis, rows, labels) = fit_binary(NAME, parameters, positive, contrast)?;
        let gamma = opts.gamma.unwrap_or(1.0 / parameters.len() as f64);
        let signs: Vec<f64> = labels.iter().map(|l| if *l > 0.5 { 1.0 } else { -1.0 }).collect();
        let n = rows.len();
        let kernel: Vec<Vec<f64>> = rows
            .iter()
            .map(|a| rows.iter().map(|b| rbf(gamma, a, b)).collect())
            .collect();

        let mut counts = vec![0.0f64; n];
        let mut rng = RngHandle::for_stream(seed, Stream::Solver);
        let iterations = opts.epochs * n;
        for t in 1..=iterations {
            let i = rng.index(n);
            let margin: f64 = (0..n).map(|j| counts[j] * signs[j] * kernel[i][j]).sum::<f64>()
                * signs[i]
                / (opts.lambda * t as f64);
            if margin < 1.0 {
                counts[i] += 1.0;
            }
        }
        let scale = 1.0 / (opts.lambda * iterations as f64);
        let decisions: Vec<f64> = (0..n)
            .map(|i| scale * (0..n).map(|j| counts[j] * signs[j] * kernel[i][j]).sum::<f64>())
            .collect();
        let (platt_a, platt_b) = platt(&decisions, &labels);
        let support = counts
            .iter()
            .zip(signs.iter().zip(&rows))
            .filter(|(c, _)| **c > 0.0)
            .map(|(c, (s, row))| (c * s * scale, row.clone()))
            .collect();
        Ok(Self {
            basis,
            support,
            gamma,
            platt_a,
            platt_b,
        })
    }

    fn decision(&self, z: &[f64]) -> f64 {
        self.support
            .iter()
            .map(|(w, row)| w * rbf(self.gamma, row, z))
            .sum()
    }
}

/// Fits `P(y=1|f) = 1 / (1 + exp(A f + B))` by Newton steps on the
/// regularised log-likelihood with Platt's smoothed targets.
pub(crate) fn platt(decisions: &[f64], labels: &[f64]) -> (f64, f64) {
    let positives = labels.iter().filter(|l| **l > 0.5).count() as f64;
    let negatives = labels.len() as f64 - positives;
    let hi = (positives + 1.0) / (positives + 2.0);
    let lo = 1.0 / (negatives + 2.0);
    let targets: Vec<f64> = labels.iter().map(|l| if *l > 0.5 { hi } else { lo }).collect();
    let mut a = 0.0;
    let mut b = ((negatives + 1.0) / (positives + 1.0)).ln();
    for _ in 0..100 {
        let (mut g_a, mut g_b) = (0.0, 0.0);
        let (mut h_aa, mut h_ab, mut h_bb) = (1e-12, 0.0, 1e-12);
        for (f, t) in decisions.iter().zip(&targets) {
            let p = sigmoid(-(a * f + b));
            let d = t - p;
            g_a += f * d;
            g_b += d;
            let w = p * (1.0 - p);
            h_aa += f * f * w;
            h_ab += f * w;
            h_bb += w;
        }
        let det = h_aa * h_bb - h_ab * h_ab;
        if det.abs() < 1e-18 {
            break;
        }
        let step_a = (h_bb * g_a - h_ab * g_b) / det;
        let step_b = (h_aa * g_b - h_ab * g_a) / det;
        a -= step_a;
        b -= step_b;
        if step_a.abs() < 1e-10 && step_b.abs() < 1e-10 {
            break;
        }
    }
    (a, b)
}

impl Evaluator for RbfSvmBinary {
    fn name(&self) -> &'static str {
        "rbf-svm-binary"
    }

    fn parameters(&self) -> &[String] {
        &self.basis.parameters
    }

    fn score_row(&self, row: &[f64]) -> f64 {
        let f = self.decision(&self.basis.z(row));
        sigmoid(-(self.platt_a * f + self.platt_b))
    }
}
