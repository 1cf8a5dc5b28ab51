#![deny(missing_docs)]
#![doc = "Evaluators scoring how typical an exemplar's parameters are against reference samples."]

pub mod config;
pub mod evaluator;
pub mod special;
pub mod standardise;
pub mod table;
pub mod variants;

pub use config::EvaluatorConfig;
pub use evaluator::{clamp_unit, extract_row, Evaluator};
pub use standardise::Standardiser;
pub use table::ReferenceTable;
pub use variants::{
    EllipticEnvelope, GradientBoostingBinary, IsolationForestPercentile, Kde, KnnBinary,
    LofPercentile, Mahalanobis, MahalanobisPercentile, MlpBinary, NormalisedDeviation,
    OneClassSvm, RbfSvmBinary,
};
