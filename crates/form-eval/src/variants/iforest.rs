//! Isolation forest ranked against the training sample's own scores.

use form_core::{FormError, RngHandle, Stream};
use serde::{Deserialize, Serialize};

use super::{fit_positive, Basis};
use crate::evaluator::Evaluator;
use crate::special::upper_tail_share;
use crate::table::ReferenceTable;

fn default_trees() -> usize {
    100
}

fn default_sample_size() -> usize {
    256
}

/// Hyperparameters of [`IsolationForestPercentile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForestOpts {
    /// Number of trees.
    #[serde(default = "default_trees")]
    pub trees: usize,
    /// Rows drawn without replacement per tree.
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
}

impl Default for IsolationForestOpts {
    fn default() -> Self {
        Self {
            trees: default_trees(),
            sample_size: default_sample_size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// Average path length of an unsuccessful BST search over `n` rows.
fn average_path(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + 0.577_215_664_901_532_9) - 2.0 * (n - 1.0) / n
        }
    }
}

fn grow(rows: &[&Vec<f64>], depth: usize, limit: usize, rng: &mut RngHandle) -> Node {
    if depth >= limit || rows.len() <= 1 {
        return Node::Leaf { size: rows.len() };
    }
    let width = rows[0].len();
    let splittable: Vec<(usize, f64, f64)> = (0..width)
        .filter_map(|feature| {
            let lo = rows.iter().map(|r| r[feature]).fold(f64::INFINITY, f64::min);
            let hi = rows.iter().map(|r| r[feature]).fold(f64::NEG_INFINITY, f64::max);
            (hi > lo).then_some((feature, lo, hi))
        })
        .collect();
    if splittable.is_empty() {
        return Node::Leaf { size: rows.len() };
    }
    let (feature, lo, hi) = splittable[rng.index(splittable.len())];
    let threshold = lo + rng.unit() * (hi - lo);
    let (left, right): (Vec<&Vec<f64>>, Vec<&Vec<f64>>) =
        rows.iter().copied().partition(|row| row[feature] < threshold);
    Node::Split {
        feature,
        threshold,
        left: Box::new(grow(&left, depth + 1, limit, rng)),
        right: Box::new(grow(&right, depth + 1, limit, rng)),
    }
}

fn path_length(node: &Node, z: &[f64], depth: f64) -> f64 {
    match node {
        Node::Leaf { size } => depth + average_path(*size),
        Node::Split {
            feature,
            threshold,
            left,
            right,
        } => {
            if z[*feature] < *threshold {
                path_length(left, z, depth + 1.0)
            } else {
                path_length(right, z, depth + 1.0)
            }
        }
    }
}

/// Share of training anomaly scores at least as large as the query's.
#[derive(Debug, Clone, PartialEq)]
pub struct IsolationForestPercentile {
    basis: Basis,
    trees: Vec<Node>,
    norm: f64,
    reference: Vec<f64>,
}

impl IsolationForestPercentile {
    /// Grows every tree from its own `Stream::Tree` generator under `seed`.
    pub fn fit(
        parameters: &[String],
        positive: &ReferenceTable,
        opts: &IsolationForestOpts,
        seed: u64,
    ) -> Result<Self, FormError> {
        const NAME: &str = "isolation-forest-percentile";
        super::check_positive(NAME, "trees", opts.trees as f64)?;
        super::check_positive(NAME, "sample_size", opts.sample_size as f64)?;
        let (basis, z) = fit_positive(NAME, parameters, positive, 2)?;
        let psi = opts.sample_size.min(z.len());
        let limit = (psi as f64).log2().ceil().max(1.0) as usize;
        let trees = (0..opts.trees)
            .map(|tree| {
                let mut rng = RngHandle::for_stream(seed, Stream::Tree(tree));
                let mut pool: Vec<usize> = (0..z.len()).collect();
                rng.shuffle_prefix(&mut pool, psi);
                let rows: Vec<&Vec<f64>> = pool[..psi].iter().map(|&i| &z[i]).collect();
                grow(&rows, 0, limit, &mut rng)
            })
            .collect();
        let mut forest = Self {
            basis,
            trees,
            norm: average_path(psi).max(f64::EPSILON),
            reference: Vec::new(),
        };
        forest.reference = z.iter().map(|row| forest.anomaly(row)).collect();
        Ok(forest)
    }

    fn anomaly(&self, z: &[f64]) -> f64 {
        let mean = self
            .trees
            .iter()
            .map(|tree| path_length(tree, z, 0.0))
            .sum::<f64>()
            / self.trees.len() as f64;
        2f64.powf(-mean / self.norm)
    }
}

impl Evaluator for IsolationForestPercentile {
    fn name(&self) -> &'static str {
        "isolation-forest-percentile"
    }

    fn parameters(&self) -> &[String] {
        &self.basis.parameters
    }

    fn score_row(&self, row: &[f64]) -> f64 {
        upper_tail_share(&self.reference, self.anomaly(&self.basis.z(row)))
    }
}
