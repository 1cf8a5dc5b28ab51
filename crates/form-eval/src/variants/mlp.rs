//! One-hidden-layer perceptron trained with Adam and early stopping.

use form_core::{FormError, RngHandle, Stream};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use super::{check_positive, fit_binary, Basis};
use crate::evaluator::Evaluator;
use crate::special::sigmoid;
use crate::table::ReferenceTable;

fn default_hidden() -> usize {
    16
}

fn default_learning_rate() -> f64 {
    0.01
}

fn default_max_epochs() -> usize {
    500
}

fn default_patience() -> usize {
    20
}

fn default_validation_fraction() -> f64 {
    0.1
}

fn default_l2() -> f64 {
    1e-4
}

/// Hyperparameters of [`MlpBinary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpOpts {
    /// Hidden units.
    #[serde(default = "default_hidden")]
    pub hidden: usize,
    /// Adam step size.
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    /// Epoch cap.
    #[serde(default = "default_max_epochs")]
    pub max_epochs: usize,
    /// Epochs without validation improvement before stopping.
    #[serde(default = "default_patience")]
    pub patience: usize,
    /// Share of rows held out for early stopping.
    #[serde(default = "default_validation_fraction")]
    pub validation_fraction: f64,
    /// Weight decay.
    #[serde(default = "default_l2")]
    pub l2: f64,
}

impl Default for MlpOpts {
    fn default() -> Self {
        Self {
            hidden: default_hidden(),
            learning_rate: default_learning_rate(),
            max_epochs: default_max_epochs(),
            patience: default_patience(),
            validation_fraction: default_validation_fraction(),
            l2: default_l2(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Weights {
    w1: DMatrix<f64>,
    b1: DVector<f64>,
    w2: DVector<f64>,
    b2: f64,
}

impl Weights {
    fn init(inputs: usize, hidden: usize, rng: &mut RngHandle) -> Self {
        let limit1 = (6.0 / (inputs + hidden) as f64).sqrt();
        let limit2 = (6.0 / (hidden + 1) as f64).sqrt();
        Self {
            w1: DMatrix::from_fn(hidden, inputs, |_, _| (2.0 * rng.unit() - 1.0) * limit1),
            b1: DVector::zeros(hidden),
            w2: DVector::from_fn(hidden, |_, _| (2.0 * rng.unit() - 1.0) * limit2),
            b2: 0.0,
        }
    }

    fn zeros_like(&self) -> Self {
        Self {
            w1: DMatrix::zeros(self.w1.nrows(), self.w1.ncols()),
            b1: DVector::zeros(self.b1.len()),
            w2: DVector::zeros(self.w2.len()),
            b2: 0.0,
        }
    }

    fn hidden(&self, x: &DVector<f64>) -> DVector<f64> {
        (&self.w1 * x + &self.b1).map(f64::tanh)
    }

    fn logit(&self, x: &DVector<f64>) -> f64 {
        self.w2.dot(&self.hidden(x)) + self.b2
    }
}

struct Adam {
    m: Weights,
    v: Weights,
    t: i32,
}

const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const ADAM_EPS: f64 = 1e-8;

impl Adam {
    fn step(&mut self, weights: &mut Weights, grad: &Weights, lr: f64) {
        self.t += 1;
        let c1 = 1.0 - BETA1.powi(self.t);
        let c2 = 1.0 - BETA2.powi(self.t);
        let update = |w: &mut f64, g: f64, m: &mut f64, v: &mut f64| {
            *m = BETA1 * *m + (1.0 - BETA1) * g;
            *v = BETA2 * *v + (1.0 - BETA2) * g * g;
            *w -= lr * (*m / c1) / ((*v / c2).sqrt() + ADAM_EPS);
        };
        for ((w, g), (m, v)) in weights
            .w1
            .iter_mut()
            .zip(grad.w1.iter())
            .zip(self.m.w1.iter_mut().zip(self.v.w1.iter_mut()))
        {
            update(w, *g, m, v);
        }
        for ((w, g), (m, v)) in weights
            .b1
            .iter_mut()
            .zip(grad.b1.iter())
            .zip(self.m.b1.iter_mut().zip(self.v.b1.iter_mut()))
        {
            update(w, *g, m, v);
        }
        for ((w, g), (m, v)) in weights
            .w2
            .iter_mut()
            .zip(grad.w2.iter())
            .zip(self.m.w2.iter_mut().zip(self.v.w2.iter_mut()))
        {
            update(w, *g, m, v);
        }
        update(&mut weights.b2, grad.b2, &mut self.m.b2, &mut self.v.b2);
    }
}

fn log_loss(weights: &Weights, xs: &[DVector<f64>], ys: &[f64]) -> f64 {
    let eps = 1e-12;
    xs.iter()
        .zip(ys)
        .map(|(x, y)| {
            let p = sigmoid(weights.logit(x)).clamp(eps, 1.0 - eps);
            -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
        })
        .sum::<f64>()
        / xs.len().max(1) as f64
}

fn gradient(weights: &Weights, xs: &[DVector<f64>], ys: &[f64], l2: f64) -> Weights {
    let mut grad = weights.zeros_like();
    let n = xs.len() as f64;
    for (x, y) in xs.iter().zip(ys) {
        let h = weights.hidden(x);
        let err = sigmoid(weights.w2.dot(&h) + weights.b2) - y;
        grad.w2 += &h * err;
        grad.b2 += err;
        let dh = weights.w2.component_mul(&h.map(|a| 1.0 - a * a)) * err;
        grad.w1 += &dh * x.transpose();
        grad.b1 += dh;
    }
    grad.w1 /= n;
    grad.b1 /= n;
    grad.w2 /= n;
    grad.b2 /= n;
    grad.w1 += &weights.w1 * l2;
    grad.w2 += &weights.w2 * l2;
    grad
}

/// Sigmoid of the output logit.
#[derive(Debug, Clone, PartialEq)]
pub struct MlpBinary {
    basis: Basis,
    weights: Weights,
    epochs: usize,
}

impl MlpBinary {
    /// Full-batch Adam; keeps the weights with the best held-out loss.
    pub fn fit(
        parameters: &[String],
        positive: &ReferenceTable,
        contrast: &ReferenceTable,
        opts: &MlpOpts,
        seed: u64,
    ) -> Result<Self, FormError> {
        const NAME: &str = "mlp-binary";
        check_positive(NAME, "hidden", opts.hidden as f64)?;
        check_positive(NAME, "learning_rate", opts.learning_rate)?;
        check_positive(NAME, "max_epochs", opts.max_epochs as f64)?;
        if !(0.0..1.0).contains(&opts.validation_fraction) {
            return Err(FormError::evaluator(
                form_core::errors::codes::EVALUATOR_CONFIG,
                NAME,
                "validation_fraction must lie in [0, 1)",
            ));
        }
        let (basis, rows, labels) = fit_binary(NAME, parameters, positive, contrast)?;
        let mut order: Vec<usize> = (0..rows.len()).collect();
        RngHandle::for_stream(seed, Stream::Holdout).shuffle_prefix(&mut order, rows.len());
        let held = ((rows.len() as f64 * opts.validation_fraction).round() as usize).min(rows.len() - 1);
        let (valid_idx, train_idx) = order.split_at(held);
        let to_x = |idx: &[usize]| -> Vec<DVector<f64>> {
            idx.iter().map(|&i| DVector::from_column_slice(&rows[i])).collect()
        };
        let to_y = |idx: &[usize]| -> Vec<f64> { idx.iter().map(|&i| labels[i]).collect() };
        let (train_x, train_y) = (to_x(train_idx), to_y(train_idx));
        let (valid_x, valid_y) = if held > 0 {
            (to_x(valid_idx), to_y(valid_idx))
        } else {
            (train_x.clone(), train_y.clone())
        };

        let mut weights = Weights::init(parameters.len(), opts.hidden, &mut RngHandle::for_stream(seed, Stream::Weights));
        let mut adam = Adam {
            m: weights.zeros_like(),
            v: weights.zeros_like(),
            t: 0,
        };
        let mut best = (log_loss(&weights, &valid_x, &valid_y), weights.clone(), 0);
        let mut stale = 0;
        for epoch in 1..=opts.max_epochs {
            let grad = gradient(&weights, &train_x, &train_y, opts.l2);
            adam.step(&mut weights, &grad, opts.learning_rate);
            let loss = log_loss(&weights, &valid_x, &valid_y);
            if loss < best.0 - 1e-9 {
                best = (loss, weights.clone(), epoch);
                stale = 0;
            } else {
                stale += 1;
                if stale >= opts.patience {
                    break;
                }
            }
        }
        tracing::debug!(evaluator = NAME, epochs = best.2, loss = best.0, "early stopping");
        Ok(Self {
            basis,
            weights: best.1,
            epochs: best.2,
        })
    }

    /// Epoch whose weights were kept.
    pub fn epochs(&self) -> usize {
        self.epochs
    }
}

impl Evaluator for MlpBinary {
    fn name(&self) -> &'static str {
        "mlp-binary"
    }

    fn parameters(&self) -> &[String] {
        &self.basis.parameters
    }

    fn score_row(&self, row: &[f64]) -> f64 {
        let x = DVector::from_vec(self.basis.z(row));
        sigmoid(self.weights.logit(&x))
    }
}
