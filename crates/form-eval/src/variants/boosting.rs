//! Gradient boosted regression trees on the logistic loss.

use form_core::FormError;
use serde::{Deserialize, Serialize};

use super::{check_positive, check_unit_open, fit_binary, Basis};
use crate::evaluator::Evaluator;
use crate::special::sigmoid;
use crate::table::ReferenceTable;

fn default_estimators() -> usize {
    100
}

fn default_learning_rate() -> f64 {
    0.1
}

fn default_max_depth() -> usize {
    3
}

fn default_min_leaf() -> usize {
    1
}

/// Hyperparameters of [`GradientBoostingBinary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostingOpts {
    /// Number of boosting rounds.
    #[serde(default = "default_estimators")]
    pub estimators: usize,
    /// Shrinkage applied to every tree.
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    /// Depth of each regression tree.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Minimum rows per leaf.
    #[serde(default = "default_min_leaf")]
    pub min_samples_leaf: usize,
}

impl Default for BoostingOpts {
    fn default() -> Self {
        Self {
            estimators: default_estimators(),
            learning_rate: default_learning_rate(),
            max_depth: default_max_depth(),
            min_samples_leaf: default_min_leaf(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Tree {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Tree>,
        right: Box<Tree>,
    },
}

impl Tree {
    fn predict(&self, z: &[f64]) -> f64 {
        match self {
            Tree::Leaf(value) => *value,
            Tree::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if z[*feature] <= *threshold {
                    left.predict(z)
                } else {
                    right.predict(z)
                }
            }
        }
    }
}

struct Grower<'a> {
    rows: &'a [Vec<f64>],
    residual: &'a [f64],
    hessian: &'a [f64],
    max_depth: usize,
    min_leaf: usize,
}

impl Grower<'_> {
    fn leaf(&self, idx: &[usize]) -> Tree {
        let num: f64 = idx.iter().map(|&i| self.residual[i]).sum();
        let den: f64 = idx.iter().map(|&i| self.hessian[i]).sum();
        Tree::Leaf(if den > 1e-12 { num / den } else { 0.0 })
    }

    /// Best squared-error split of `idx`, as `(feature, threshold, gain)`.
    fn best_split(&self, idx: &[usize]) -> Option<(usize, f64, f64)> {
        let total: f64 = idx.iter().map(|&i| self.residual[i]).sum();
        let n = idx.len() as f64;
        let mut best: Option<(usize, f64, f64)> = None;
        for feature in 0..self.rows[0].len() {
            let mut order = idx.to_vec();
            order.sort_by(|&a, &b| self.rows[a][feature].total_cmp(&self.rows[b][feature]));
            let mut left_sum = 0.0;
            for pos in 0..order.len() - 1 {
                left_sum += self.residual[order[pos]];
                let left_n = (pos + 1) as f64;
                let here = self.rows[order[pos]][feature];
                let next = self.rows[order[pos + 1]][feature];
                if next <= here || pos + 1 < self.min_leaf || order.len() - pos - 1 < self.min_leaf {
                    continue;
                }
                let right_sum = total - left_sum;
                let gain = left_sum * left_sum / left_n + right_sum * right_sum / (n - left_n)
                    - total * total / n;
                if best.map_or(true, |(_, _, g)| gain > g + 1e-12) {
                    best = Some((feature, (here + next) / 2.0, gain));
                }
            }
        }
        best
    }

    fn grow(&self, idx: &[usize], depth: usize) -> Tree {
        if depth >= self.max_depth || idx.len() < 2 * self.min_leaf {
            return self.leaf(idx);
        }
        let Some((feature, threshold, _)) = self.best_split(idx) else {
            return self.leaf(idx);
        };
        let (left, right): (Vec<usize>, Vec<usize>) =
            idx.iter().partition(|&&i| self.rows[i][feature] <= threshold);
        Tree::Split {
            feature,
            threshold,
            left: Box::new(self.grow(&left, depth + 1)),
            right: Box::new(self.grow(&right, depth + 1)),
        }
    }
}

/// Boosted probability of the positive class.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientBoostingBinary {
    basis: Basis,
    prior: f64,
    learning_rate: f64,
    trees: Vec<Tree>,
}

impl GradientBoostingBinary {
    /// Fits trees to the logistic-loss gradient with Newton leaf values.
    pub fn fit(
        parameters: &[String],
        positive: &ReferenceTable,
        contrast: &ReferenceTable,
        opts: &BoostingOpts,
    ) -> Result<Self, FormError> {
        const NAME: &str = "gradient-boosting-binary";
        check_unit_open(NAME, "learning_rate", opts.learning_rate)?;
        check_positive(NAME, "max_depth", opts.max_depth as f64)?;
        check_positive(NAME, "min_samples_leaf", opts.min_samples_leaf as f64)?;
        let (basis, rows, labels) = fit_binary(NAME, parameters, positive, contrast)?;
        let positives: f64 = labels.iter().sum();
        let prior = (positives / (labels.len() as f64 - positives)).ln();
        let mut raw = vec![prior; rows.len()];
        let all: Vec<usize> = (0..rows.len()).collect();
        let mut trees = Vec::with_capacity(opts.estimators);
        for _ in 0..opts.estimators {
            let probs: Vec<f64> = raw.iter().map(|f| sigmoid(*f)).collect();
            let residual: Vec<f64> = labels.iter().zip(&probs).map(|(y, p)| y - p).collect();
            let hessian: Vec<f64> = probs.iter().map(|p| p * (1.0 - p)).collect();
            let tree = Grower {
                rows: &rows,
                residual: &residual,
                hessian: &hessian,
                max_depth: opts.max_depth,
                min_leaf: opts.min_samples_leaf,
            }
            .grow(&all, 0);
            for (f, row) in raw.iter_mut().zip(&rows) {
                *f += opts.learning_rate * tree.predict(row);
            }
            trees.push(tree);
        }
        Ok(Self {
            basis,
            prior,
            learning_rate: opts.learning_rate,
            trees,
        })
    }
}

impl Evaluator for GradientBoostingBinary {
    fn name(&self) -> &'static str {
        "gradient-boosting-binary"
    }

    fn parameters(&self) -> &[String] {
        &self.basis.parameters
    }

    fn score_row(&self, row: &[f64]) -> f64 {
        let z = self.basis.z(row);
        let raw = self.prior
            + self.learning_rate * self.trees.iter().map(|tree| tree.predict(&z)).sum::<f64>();
        sigmoid(raw)
    }
}
