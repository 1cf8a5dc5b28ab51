//! Per-parameter evaluators: normalised deviation and Gaussian KDE.

use std::f64::consts::PI;

use form_core::FormError;
use serde::{Deserialize, Serialize};

use super::{check_positive, fit_positive, Basis};
use crate::evaluator::Evaluator;
use crate::special::std_dev;
use crate::table::ReferenceTable;

/// Mean over parameters of `1 / (1 + |x - mean| / sd)`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalisedDeviation {
    basis: Basis,
}

impl NormalisedDeviation {
    /// Fits per-parameter means and deviations.
    pub fn fit(parameters: &[String], positive: &ReferenceTable) -> Result<Self, FormError> {
        let (basis, _) = fit_positive("normalised-deviation", parameters, positive, 1)?;
        Ok(Self { basis })
    }
}

impl Evaluator for NormalisedDeviation {
    fn name(&self) -> &'static str {
        "normalised-deviation"
    }

    fn parameters(&self) -> &[String] {
        &self.basis.parameters
    }

    fn score_row(&self, row: &[f64]) -> f64 {
        let z = self.basis.z(row);
        z.iter().map(|v| 1.0 / (1.0 + v.abs())).sum::<f64>() / z.len() as f64
    }
}

/// Hyperparameters of [`Kde`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct KdeOpts {
    /// Fixed bandwidth in standardised units; Silverman's rule when absent.
    pub bandwidth: Option<f64>,
}

const KDE_GRID: usize = 256;

#[derive(Debug, Clone, PartialEq)]
struct Density {
    sample: Vec<f64>,
    bandwidth: f64,
    peak: f64,
}

impl Density {
    fn fit(sample: Vec<f64>, bandwidth: Option<f64>) -> Self {
        let n = sample.len() as f64;
        let bandwidth = bandwidth.unwrap_or_else(|| {
            let sd = std_dev(&sample);
            if sd > f64::EPSILON {
                1.06 * sd * n.powf(-0.2)
            } else {
                1.0
            }
        });
        let mut density = Self {
            sample,
            bandwidth,
            peak: 0.0,
        };
        let lo = density.sample.iter().copied().fold(f64::INFINITY, f64::min) - 3.0 * bandwidth;
        let hi = density.sample.iter().copied().fold(f64::NEG_INFINITY, f64::max) + 3.0 * bandwidth;
        let step = (hi - lo) / (KDE_GRID - 1) as f64;
        let grid = (0..KDE_GRID).map(|i| lo + step * i as f64);
        density.peak = grid
            .chain(density.sample.clone())
            .map(|x| density.at(x))
            .fold(0.0, f64::max);
        density
    }

    fn at(&self, x: f64) -> f64 {
        let h = self.bandwidth;
        let norm = 1.0 / ((2.0 * PI).sqrt() * h * self.sample.len() as f64);
        norm * self
            .sample
            .iter()
            .map(|s| (-0.5 * ((x - s) / h).powi(2)).exp())
            .sum::<f64>()
    }

    fn relative(&self, x: f64) -> f64 {
        if self.peak <= 0.0 {
            return 0.0;
        }
        (self.at(x) / self.peak).min(1.0)
    }
}

/// Mean over parameters of the KDE density relative to its peak.
#[derive(Debug, Clone, PartialEq)]
pub struct Kde {
    basis: Basis,
    densities: Vec<Density>,
}

impl Kde {
    /// Fits one Gaussian KDE per parameter on standardised values.
    pub fn fit(parameters: &[String], positive: &ReferenceTable, opts: &KdeOpts) -> Result<Self, FormError> {
        if let Some(bw) = opts.bandwidth {
            check_positive("kde", "bandwidth", bw)?;
        }
        let (basis, z) = fit_positive("kde", parameters, positive, 1)?;
        let densities = (0..parameters.len())
            .map(|col| Density::fit(z.iter().map(|row| row[col]).collect(), opts.bandwidth))
            .collect();
        Ok(Self { basis, densities })
    }
}

impl Evaluator for Kde {
    fn name(&self) -> &'static str {
        "kde"
    }

    fn parameters(&self) -> &[String] {
        &self.basis.parameters
    }

    fn score_row(&self, row: &[f64]) -> f64 {
        let z = self.basis.z(row);
        z.iter()
            .zip(&self.densities)
            .map(|(x, density)| density.relative(*x))
            .sum::<f64>()
            / z.len() as f64
    }
}
