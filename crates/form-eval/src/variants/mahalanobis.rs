//! Joint evaluators built on a (shrunk) covariance estimate.

use form_core::errors::{codes, FormError};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use super::{check_unit_open, fit_positive, Basis};
use crate::evaluator::Evaluator;
use crate::special::{chi2_cdf, chi2_median, median, upper_tail_share};
use crate::table::ReferenceTable;

fn default_shrinkage() -> f64 {
    0.1
}

/// Hyperparameters of [`Mahalanobis`] and [`MahalanobisPercentile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MahalanobisOpts {
    /// Weight of the identity target in the covariance estimate.
    #[serde(default = "default_shrinkage")]
    pub shrinkage: f64,
}

impl Default for MahalanobisOpts {
    fn default() -> Self {
        Self {
            shrinkage: default_shrinkage(),
        }
    }
}

/// Location and inverse covariance of standardised rows.
#[derive(Debug, Clone, PartialEq)]
struct Ellipsoid {
    centre: DVector<f64>,
    precision: DMatrix<f64>,
}

impl Ellipsoid {
    fn fit(name: &str, rows: &[&Vec<f64>], width: usize, shrinkage: f64) -> Result<Self, FormError> {
        let n = rows.len();
        let mut centre = DVector::<f64>::zeros(width);
        for row in rows {
            centre += DVector::from_column_slice(row.as_slice());
        }
        centre /= n as f64;
        let mut cov = DMatrix::<f64>::zeros(width, width);
        if n > 1 {
            for row in rows {
                let d = DVector::from_column_slice(row.as_slice()) - &centre;
                cov += &d * d.transpose();
            }
            cov /= (n - 1) as f64;
        }
        let shrunk = cov * (1.0 - shrinkage) + DMatrix::<f64>::identity(width, width) * shrinkage;
        let precision = shrunk.try_inverse().ok_or_else(|| {
            FormError::evaluator(codes::INSUFFICIENT_DATA, name, "covariance is not invertible")
        })?;
        Ok(Self { centre, precision })
    }

    fn squared(&self, z: &[f64]) -> f64 {
        let d = DVector::from_column_slice(z) - &self.centre;
        (d.transpose() * &self.precision * &d)[(0, 0)].max(0.0)
    }
}

/// `1 / (1 + d)` with `d` the Mahalanobis distance to the positive mean.
#[derive(Debug, Clone, PartialEq)]
pub struct Mahalanobis {
    basis: Basis,
    ellipsoid: Ellipsoid,
}

impl Mahalanobis {
    /// Fits the shrunk covariance of the positive sample.
    pub fn fit(parameters: &[String], positive: &ReferenceTable, opts: &MahalanobisOpts) -> Result<Self, FormError> {
        check_unit_open("mahalanobis", "shrinkage", opts.shrinkage)?;
        let (basis, z) = fit_positive("mahalanobis", parameters, positive, 1)?;
        let rows: Vec<&Vec<f64>> = z.iter().collect();
        let ellipsoid = Ellipsoid::fit("mahalanobis", &rows, parameters.len(), opts.shrinkage)?;
        Ok(Self { basis, ellipsoid })
    }
}

impl Evaluator for Mahalanobis {
    fn name(&self) -> &'static str {
        "mahalanobis"
    }

    fn parameters(&self) -> &[String] {
        &self.basis.parameters
    }

    fn score_row(&self, row: &[f64]) -> f64 {
        1.0 / (1.0 + self.ellipsoid.squared(&self.basis.z(row)).sqrt())
    }
}

/// Share of training distances at least as large as the query's.
#[derive(Debug, Clone, PartialEq)]
pub struct MahalanobisPercentile {
    basis: Basis,
    ellipsoid: Ellipsoid,
    reference: Vec<f64>,
}

impl MahalanobisPercentile {
    /// Fits the covariance and records every training distance.
    pub fn fit(parameters: &[String], positive: &ReferenceTable, opts: &MahalanobisOpts) -> Result<Self, FormError> {
        check_unit_open("mahalanobis-percentile", "shrinkage", opts.shrinkage)?;
        let (basis, z) = fit_positive("mahalanobis-percentile", parameters, positive, 1)?;
        let rows: Vec<&Vec<f64>> = z.iter().collect();
        let ellipsoid = Ellipsoid::fit("mahalanobis-percentile", &rows, parameters.len(), opts.shrinkage)?;
        let reference = z.iter().map(|row| ellipsoid.squared(row).sqrt()).collect();
        Ok(Self {
            basis,
            ellipsoid,
            reference,
        })
    }
}

impl Evaluator for MahalanobisPercentile {
    fn name(&self) -> &'static str {
        "mahalanobis-percentile"
    }

    fn parameters(&self) -> &[String] {
        &self.basis.parameters
    }

    fn score_row(&self, row: &[f64]) -> f64 {
        let d = self.ellipsoid.squared(&self.basis.z(row)).sqrt();
        upper_tail_share(&self.reference, d)
    }
}

fn default_support_fraction() -> f64 {
    0.75
}

fn default_c_steps() -> usize {
    10
}

/// Hyperparameters of [`EllipticEnvelope`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EllipticOpts {
    /// Share of rows kept by each concentration step.
    #[serde(default = "default_support_fraction")]
    pub support_fraction: f64,
    /// Maximum number of concentration steps.
    #[serde(default = "default_c_steps")]
    pub c_steps: usize,
    /// Weight of the identity target in the covariance estimate.
    #[serde(default = "default_shrinkage")]
    pub shrinkage: f64,
}

impl Default for EllipticOpts {
    fn default() -> Self {
        Self {
            support_fraction: default_support_fraction(),
            c_steps: default_c_steps(),
            shrinkage: default_shrinkage(),
        }
    }
}

/// `1 - chi2_cdf(d^2, p)` around a minimum covariance determinant style fit.
#[derive(Debug, Clone, PartialEq)]
pub struct EllipticEnvelope {
    basis: Basis,
    ellipsoid: Ellipsoid,
    dof: usize,
}

impl EllipticEnvelope {
    /// Runs concentration steps on the rows closest to the current fit, then
    /// rescales the precision so the median distance matches chi-square.
    pub fn fit(parameters: &[String], positive: &ReferenceTable, opts: &EllipticOpts) -> Result<Self, FormError> {
        const NAME: &str = "elliptic-envelope";
        check_unit_open(NAME, "support_fraction", opts.support_fraction)?;
        check_unit_open(NAME, "shrinkage", opts.shrinkage)?;
        let (basis, z) = fit_positive(NAME, parameters, positive, 2)?;
        let width = parameters.len();
        let keep = ((z.len() as f64 * opts.support_fraction).ceil() as usize).clamp(2, z.len());

        let mut support: Vec<usize> = (0..z.len()).collect();
        let mut ellipsoid = Ellipsoid::fit(NAME, &z.iter().collect::<Vec<_>>(), width, opts.shrinkage)?;
        for _ in 0..opts.c_steps {
            let mut order: Vec<(f64, usize)> =
                z.iter().enumerate().map(|(i, row)| (ellipsoid.squared(row), i)).collect();
            order.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            let mut next: Vec<usize> = order.iter().take(keep).map(|(_, i)| *i).collect();
            next.sort_unstable();
            if next == support {
                break;
            }
            support = next;
            let rows: Vec<&Vec<f64>> = support.iter().map(|&i| &z[i]).collect();
            ellipsoid = Ellipsoid::fit(NAME, &rows, width, opts.shrinkage)?;
        }

        let distances: Vec<f64> = z.iter().map(|row| ellipsoid.squared(row)).collect();
        let observed = median(&distances);
        if observed > f64::EPSILON {
            ellipsoid.precision *= chi2_median(width) / observed;
        }
        Ok(Self {
            basis,
            ellipsoid,
            dof: width,
        })
    }
}

impl Evaluator for EllipticEnvelope {
    fn name(&self) -> &'static str {
        "elliptic-envelope"
    }

    fn parameters(&self) -> &[String] {
        &self.basis.parameters
    }

    fn score_row(&self, row: &[f64]) -> f64 {
        1.0 - chi2_cdf(self.ellipsoid.squared(&self.basis.z(row)), self.dof)
    }
}
