//! Serde-tagged selection of an evaluator variant and its hyperparameters.

use form_core::errors::{codes, FormError};
use serde::{Deserialize, Serialize};

use crate::evaluator::Evaluator;
use crate::table::ReferenceTable;
use crate::variants::{
    BoostingOpts, EllipticEnvelope, EllipticOpts, GradientBoostingBinary, IsolationForestOpts,
    IsolationForestPercentile, Kde, KdeOpts, KnnBinary, KnnOpts, LofOpts, LofPercentile, Mahalanobis,
    MahalanobisOpts, MahalanobisPercentile, MlpBinary, MlpOpts, NormalisedDeviation, OneClassSvm,
    OneClassSvmOpts, RbfSvmBinary, RbfSvmOpts,
};

/// Evaluator variant selected by configuration.
///
/// ```yaml
/// type: elliptic-envelope
/// support_fraction: 0.8
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EvaluatorConfig {
    /// Per-parameter standardised deviation.
    #[default]
    NormalisedDeviation,
    /// Per-parameter Gaussian density.
    Kde(KdeOpts),
    /// Joint Mahalanobis distance.
    Mahalanobis(MahalanobisOpts),
    /// Tail share of training Mahalanobis distances.
    MahalanobisPercentile(MahalanobisOpts),
    /// Robust covariance with a chi-squared tail.
    EllipticEnvelope(EllipticOpts),
    /// Tail share of reference local outlier factors.
    LofPercentile(LofOpts),
    /// Tail share of reference isolation scores.
    IsolationForestPercentile(IsolationForestOpts),
    /// Sigmoid of the one-class SVM decision.
    OneClassSvm(OneClassSvmOpts),
    /// Distance-weighted neighbour vote.
    KnnBinary(KnnOpts),
    /// Platt-calibrated RBF SVM.
    RbfSvmBinary(RbfSvmOpts),
    /// Boosted regression trees on log-odds.
    GradientBoostingBinary(BoostingOpts),
    /// One-hidden-layer perceptron.
    MlpBinary(MlpOpts),
}

impl EvaluatorConfig {
    /// Name matching [`Evaluator::name`] of the fitted variant.
    pub fn name(&self) -> &'static str {
        match self {
            EvaluatorConfig::NormalisedDeviation => "normalised-deviation",
            EvaluatorConfig::Kde(_) => "kde",
            EvaluatorConfig::Mahalanobis(_) => "mahalanobis",
            EvaluatorConfig::MahalanobisPercentile(_) => "mahalanobis-percentile",
            EvaluatorConfig::EllipticEnvelope(_) => "elliptic-envelope",
            EvaluatorConfig::LofPercentile(_) => "lof-percentile",
            EvaluatorConfig::IsolationForestPercentile(_) => "isolation-forest-percentile",
            EvaluatorConfig::OneClassSvm(_) => "one-class-svm",
            EvaluatorConfig::KnnBinary(_) => "knn-binary",
            EvaluatorConfig::RbfSvmBinary(_) => "rbf-svm-binary",
            EvaluatorConfig::GradientBoostingBinary(_) => "gradient-boosting-binary",
            EvaluatorConfig::MlpBinary(_) => "mlp-binary",
        }
    }

    /// Whether the variant also trains on a contrast sample.
    pub fn is_binary(&self) -> bool {
        matches!(
            self,
            EvaluatorConfig::KnnBinary(_)
                | EvaluatorConfig::RbfSvmBinary(_)
                | EvaluatorConfig::GradientBoostingBinary(_)
                | EvaluatorConfig::MlpBinary(_)
        )
    }

    /// Fits the selected variant on `parameters` of the reference tables.
    ///
    /// `seed` drives the stochastic variants; the others ignore it.
    pub fn fit(
        &self,
        parameters: &[String],
        positive: &ReferenceTable,
        contrast: Option<&ReferenceTable>,
        seed: u64,
    ) -> Result<Box<dyn Evaluator>, FormError> {
        let contrast = || {
            contrast.ok_or_else(|| {
                FormError::evaluator(
                    codes::EVALUATOR_CONFIG,
                    self.name(),
                    "binary evaluator needs a contrast table",
                )
            })
        };
        let evaluator: Box<dyn Evaluator> = match self {
            EvaluatorConfig::NormalisedDeviation => Box::new(NormalisedDeviation::fit(parameters, positive)?),
            EvaluatorConfig::Kde(opts) => Box::new(Kde::fit(parameters, positive, opts)?),
            EvaluatorConfig::Mahalanobis(opts) => Box::new(Mahalanobis::fit(parameters, positive, opts)?),
            EvaluatorConfig::MahalanobisPercentile(opts) => {
                Box::new(MahalanobisPercentile::fit(parameters, positive, opts)?)
            }
            EvaluatorConfig::EllipticEnvelope(opts) => Box::new(EllipticEnvelope::fit(parameters, positive, opts)?),
            EvaluatorConfig::LofPercentile(opts) => Box::new(LofPercentile::fit(parameters, positive, opts)?),
            EvaluatorConfig::IsolationForestPercentile(opts) => {
                Box::new(IsolationForestPercentile::fit(parameters, positive, opts, seed)?)
            }
            EvaluatorConfig::OneClassSvm(opts) => Box::new(OneClassSvm::fit(parameters, positive, opts)?),
            EvaluatorConfig::KnnBinary(opts) => Box::new(KnnBinary::fit(parameters, positive, contrast()?, opts)?),
            EvaluatorConfig::RbfSvmBinary(opts) => {
                Box::new(RbfSvmBinary::fit(parameters, positive, contrast()?, opts, seed)?)
            }
            EvaluatorConfig::GradientBoostingBinary(opts) => {
                Box::new(GradientBoostingBinary::fit(parameters, positive, contrast()?, opts)?)
            }
            EvaluatorConfig::MlpBinary(opts) => Box::new(MlpBinary::fit(parameters, positive, contrast()?, opts, seed)?),
        };
        Ok(evaluator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_variants_need_contrast() {
        let table = ReferenceTable::from_column("a", vec![0.0, 1.0, 2.0]).expect("table");
        let params = vec!["a".to_string()];
        let err = EvaluatorConfig::KnnBinary(KnnOpts::default())
            .fit(&params, &table, None, 0)
            .err()
            .expect("missing contrast");
        assert_eq!(err.code(), codes::EVALUATOR_CONFIG);
        assert!(EvaluatorConfig::default().fit(&params, &table, None, 0).is_ok());
    }
}
