//! Local outlier factor ranked against the training sample's own factors.

use form_core::FormError;
use serde::{Deserialize, Serialize};

use super::{fit_positive, Basis};
use crate::evaluator::Evaluator;
use crate::special::{euclidean, upper_tail_share};
use crate::table::ReferenceTable;

fn default_neighbours() -> usize {
    10
}

/// Hyperparameters of [`LofPercentile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LofOpts {
    /// Neighbourhood size; capped at the sample size minus one.
    #[serde(default = "default_neighbours")]
    pub neighbours: usize,
}

impl Default for LofOpts {
    fn default() -> Self {
        Self {
            neighbours: default_neighbours(),
        }
    }
}

const MIN_REACH: f64 = 1e-10;

/// Share of training LOF scores at least as large as the query's.
#[derive(Debug, Clone, PartialEq)]
pub struct LofPercentile {
    basis: Basis,
    sample: Vec<Vec<f64>>,
    k: usize,
    k_distance: Vec<f64>,
    lrd: Vec<f64>,
    reference: Vec<f64>,
}

impl LofPercentile {
    /// Computes k-distances, local reachability densities and the
    /// leave-one-out factor of every training row.
    pub fn fit(parameters: &[String], positive: &ReferenceTable, opts: &LofOpts) -> Result<Self, FormError> {
        let (basis, sample) = fit_positive("lof-percentile", parameters, positive, 2)?;
        let k = opts.neighbours.clamp(1, sample.len() - 1);
        let neighbours: Vec<Vec<(f64, usize)>> = (0..sample.len())
            .map(|i| nearest(&sample, &sample[i], k, Some(i)))
            .collect();
        let k_distance: Vec<f64> = neighbours.iter().map(|nn| nn[nn.len() - 1].0).collect();
        let lrd: Vec<f64> = neighbours
            .iter()
            .map(|nn| reachability_density(nn, &k_distance))
            .collect();
        let reference = neighbours
            .iter()
            .zip(&lrd)
            .map(|(nn, own)| factor(nn, &lrd, *own))
            .collect();
        Ok(Self {
            basis,
            sample,
            k,
            k_distance,
            lrd,
            reference,
        })
    }

    fn lof(&self, z: &[f64]) -> f64 {
        let nn = nearest(&self.sample, z, self.k, None);
        let own = reachability_density(&nn, &self.k_distance);
        factor(&nn, &self.lrd, own)
    }
}

fn nearest(sample: &[Vec<f64>], query: &[f64], k: usize, skip: Option<usize>) -> Vec<(f64, usize)> {
    let mut all: Vec<(f64, usize)> = sample
        .iter()
        .enumerate()
        .filter(|(idx, _)| Some(*idx) != skip)
        .map(|(idx, row)| (euclidean(query, row), idx))
        .collect();
    all.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    all.truncate(k);
    all
}

fn reachability_density(nn: &[(f64, usize)], k_distance: &[f64]) -> f64 {
    let mean = nn
        .iter()
        .map(|(d, idx)| d.max(k_distance[*idx]))
        .sum::<f64>()
        / nn.len() as f64;
    1.0 / mean.max(MIN_REACH)
}

fn factor(nn: &[(f64, usize)], lrd: &[f64], own: f64) -> f64 {
    nn.iter().map(|(_, idx)| lrd[*idx]).sum::<f64>() / (nn.len() as f64 * own)
}

impl Evaluator for LofPercentile {
    fn name(&self) -> &'static str {
        "lof-percentile"
    }

    fn parameters(&self) -> &[String] {
        &self.basis.parameters
    }

    fn score_row(&self, row: &[f64]) -> f64 {
        upper_tail_share(&self.reference, self.lof(&self.basis.z(row)))
    }
}
