//! The twelve evaluator variants.

mod boosting;
mod deviation;
mod iforest;
mod knn;
mod lof;
mod mahalanobis;
mod mlp;
mod ocsvm;
mod svm;

pub use boosting::{BoostingOpts, GradientBoostingBinary};
pub use deviation::{Kde, KdeOpts, NormalisedDeviation};
pub use iforest::{IsolationForestOpts, IsolationForestPercentile};
pub use knn::{KnnBinary, KnnOpts};
pub use lof::{LofOpts, LofPercentile};
pub use mahalanobis::{
    EllipticEnvelope, EllipticOpts, Mahalanobis, MahalanobisOpts, MahalanobisPercentile,
};
pub use mlp::{MlpBinary, MlpOpts};
pub use ocsvm::{OneClassSvm, OneClassSvmOpts};
pub use svm::{RbfSvmBinary, RbfSvmOpts};

use form_core::errors::{codes, FormError};
use tracing::debug;

use crate::standardise::Standardiser;
use crate::table::ReferenceTable;

/// Parameter names and the standardiser every variant carries.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Basis {
    pub(crate) parameters: Vec<String>,
    pub(crate) standardiser: Standardiser,
}

impl Basis {
    pub(crate) fn z(&self, row: &[f64]) -> Vec<f64> {
        self.standardiser.transform(row)
    }
}

fn select(name: &str, parameters: &[String], table: &ReferenceTable) -> Result<Vec<Vec<f64>>, FormError> {
    if parameters.is_empty() {
        return Err(FormError::evaluator(
            codes::EVALUATOR_CONFIG,
            name,
            "evaluator needs at least one parameter",
        ));
    }
    if let Some(missing) = parameters.iter().find(|p| table.column_index(p).is_none()) {
        return Err(FormError::missing_parameter(name, missing));
    }
    Ok(table.select(parameters)?.rows().to_vec())
}

fn require_rows(name: &str, role: &str, rows: usize, min: usize) -> Result<(), FormError> {
    if rows < min {
        return Err(FormError::evaluator(
            codes::INSUFFICIENT_DATA,
            name,
            format!("{role} sample has {rows} rows, at least {min} required"),
        )
        .with_context("rows", rows.to_string())
        .with_context("required", min.to_string()));
    }
    Ok(())
}

/// Fits the basis on a positive sample and returns its standardised rows.
pub(crate) fn fit_positive(
    name: &str,
    parameters: &[String],
    positive: &ReferenceTable,
    min_rows: usize,
) -> Result<(Basis, Vec<Vec<f64>>), FormError> {
    let rows = select(name, parameters, positive)?;
    require_rows(name, "positive", rows.len(), min_rows)?;
    let standardiser = Standardiser::fit(&rows, parameters.len());
    let z = standardiser.transform_all(&rows);
    debug!(evaluator = name, rows = z.len(), width = parameters.len(), "evaluator fitted");
    Ok((
        Basis {
            parameters: parameters.to_vec(),
            standardiser,
        },
        z,
    ))
}

/// Fits the basis on positive and contrast rows together.
///
/// Returns standardised rows with labels, positives first (label `1.0`).
pub(crate) fn fit_binary(
    name: &str,
    parameters: &[String],
    positive: &ReferenceTable,
    contrast: &ReferenceTable,
) -> Result<(Basis, Vec<Vec<f64>>, Vec<f64>), FormError> {
    let pos = select(name, parameters, positive)?;
    let neg = select(name, parameters, contrast)?;
    require_rows(name, "positive", pos.len(), 1)?;
    require_rows(name, "contrast", neg.len(), 1)?;
    let labels: Vec<f64> = std::iter::repeat(1.0)
        .take(pos.len())
        .chain(std::iter::repeat(0.0).take(neg.len()))
        .collect();
    let rows: Vec<Vec<f64>> = pos.into_iter().chain(neg).collect();
    let standardiser = Standardiser::fit(&rows, parameters.len());
    let z = standardiser.transform_all(&rows);
    debug!(evaluator = name, rows = z.len(), width = parameters.len(), "binary evaluator fitted");
    Ok((
        Basis {
            parameters: parameters.to_vec(),
            standardiser,
        },
        z,
        labels,
    ))
}

pub(crate) fn check_positive(name: &str, field: &str, value: f64) -> Result<(), FormError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(FormError::evaluator(
            codes::EVALUATOR_CONFIG,
            name,
            format!("{field} must be positive and finite"),
        )
        .with_context("field", field)
        .with_context("value", value.to_string()));
    }
    Ok(())
}

pub(crate) fn check_unit_open(name: &str, field: &str, value: f64) -> Result<(), FormError> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(FormError::evaluator(
            codes::EVALUATOR_CONFIG,
            name,
            format!("{field} must lie in (0, 1]"),
        )
        .with_context("field", field)
        .with_context("value", value.to_string()));
    }
    Ok(())
}

/// Gaussian RBF kernel.
pub(crate) fn rbf(gamma: f64, a: &[f64], b: &[f64]) -> f64 {
    let sq: f64 = a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum();
    (-gamma * sq).exp()
}
