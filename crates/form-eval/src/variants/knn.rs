//! Distance-weighted k-nearest-neighbour vote.

use form_core::FormError;
use serde::{Deserialize, Serialize};

use super::{fit_binary, Basis};
use crate::evaluator::Evaluator;
use crate::special::euclidean;
use crate::table::ReferenceTable;

fn default_neighbours() -> usize {
    5
}

/// Hyperparameters of [`KnnBinary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnOpts {
    /// Number of voting neighbours; capped at the training size.
    #[serde(default = "default_neighbours")]
    pub neighbours: usize,
}

impl Default for KnnOpts {
    fn default() -> Self {
        Self {
            neighbours: default_neighbours(),
        }
    }
}

const EXACT: f64 = 1e-12;

/// Weighted share of positive neighbours, weights `1 / distance`.
///
/// Neighbours at distance zero outvote every other neighbour.
#[derive(Debug, Clone, PartialEq)]
pub struct KnnBinary {
    basis: Basis,
    rows: Vec<Vec<f64>>,
    labels: Vec<f64>,
    k: usize,
}

impl KnnBinary {
    /// Stores the standardised training rows.
    pub fn fit(
        parameters: &[String],
        positive: &ReferenceTable,
        contrast: &ReferenceTable,
        opts: &KnnOpts,
    ) -> Result<Self, FormError> {
        super::check_positive("knn-binary", "neighbours", opts.neighbours as f64)?;
        let (basis, rows, labels) = fit_binary("knn-binary", parameters, positive, contrast)?;
        let k = opts.neighbours.min(rows.len());
        Ok(Self {
            basis,
            rows,
            labels,
            k,
        })
    }
}

impl Evaluator for KnnBinary {
    fn name(&self) -> &'static str {
        "knn-binary"
    }

    fn parameters(&self) -> &[String] {
        &self.basis.parameters
    }

    fn score_row(&self, row: &[f64]) -> f64 {
        let z = self.basis.z(row);
        let mut nn: Vec<(f64, usize)> = self
            .rows
            .iter()
            .enumerate()
            .map(|(idx, r)| (euclidean(&z, r), idx))
            .collect();
        nn.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        nn.truncate(self.k);
        let exact: Vec<&(f64, usize)> = nn.iter().filter(|(d, _)| *d < EXACT).collect();
        if !exact.is_empty() {
            return exact.iter().map(|(_, idx)| self.labels[*idx]).sum::<f64>() / exact.len() as f64;
        }
        let (votes, total) = nn.iter().fold((0.0, 0.0), |(votes, total), (d, idx)| {
            let w = 1.0 / d;
            (votes + w * self.labels[*idx], total + w)
        });
        votes / total
    }
}
