//! Engine settings loaded from YAML.

use std::fs;
use std::path::Path;

use form_core::errors::{codes, ErrorInfo, FormError};
use form_eval::EvaluatorConfig;
use serde::{Deserialize, Serialize};

/// YAML-configurable engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Beam width of the exemplar pool; unbounded when absent.
    #[serde(default)]
    pub max_pool_size: Option<usize>,
    /// Coordinates closer than this many seconds are near-duplicates.
    #[serde(default = "default_epsilon_for_dubles")]
    pub epsilon_for_dubles: f64,
    /// Evaluator fitted on the reference tables.
    #[serde(default)]
    pub evaluator: Option<EvaluatorConfig>,
    /// Master seed of the stochastic evaluators.
    #[serde(default)]
    pub seed: u64,
}

fn default_epsilon_for_dubles() -> f64 {
    0.01
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_pool_size: None,
            epsilon_for_dubles: default_epsilon_for_dubles(),
            evaluator: None,
            seed: 0,
        }
    }
}

impl EngineConfig {
    /// Parses and validates a YAML document.
    pub fn from_yaml_str(source: &str) -> Result<Self, FormError> {
        let config: EngineConfig = serde_yaml::from_str(source)
            .map_err(|err| FormError::Config(ErrorInfo::new(codes::CONFIG_PARSE, err.to_string())))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a YAML file.
    pub fn from_path(path: &Path) -> Result<Self, FormError> {
        let source = fs::read_to_string(path).map_err(|err| {
            FormError::Config(
                ErrorInfo::new(codes::CONFIG_PARSE, err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Self::from_yaml_str(&source)
            .map_err(|err| err.with_context("path", path.display().to_string()))
    }

    /// Rejects a zero pool and a non-positive epsilon.
    pub fn validate(&self) -> Result<(), FormError> {
        if self.max_pool_size == Some(0) {
            return Err(FormError::config("max_pool_size", "pool capacity must be positive")
                .with_hint("omit the field for an unbounded pool"));
        }
        if !(self.epsilon_for_dubles.is_finite() && self.epsilon_for_dubles > 0.0) {
            return Err(FormError::config(
                "epsilon_for_dubles",
                "near-duplicate distance must be positive",
            )
            .with_context("value", self.epsilon_for_dubles.to_string()));
        }
        Ok(())
    }

    /// Configured evaluator, defaulting to the normalised deviation.
    pub fn evaluator_or_default(&self) -> EvaluatorConfig {
        self.evaluator.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config = EngineConfig::from_yaml_str("max_pool_size: 8\n").expect("yaml");
        assert_eq!(config.max_pool_size, Some(8));
        assert_eq!(config.epsilon_for_dubles, 0.01);
        assert_eq!(config.evaluator, None);
        assert_eq!(config.evaluator_or_default(), EvaluatorConfig::NormalisedDeviation);
    }

    #[test]
    fn zero_pool_is_rejected() {
        let err = EngineConfig::from_yaml_str("max_pool_size: 0").expect_err("zero");
        assert_eq!(err.code(), codes::CONFIG);
        assert_eq!(err.info().context.get("field").map(String::as_str), Some("max_pool_size"));
    }

    #[test]
    fn epsilon_must_be_positive() {
        let err = EngineConfig::from_yaml_str("epsilon_for_dubles: 0.0").expect_err("zero epsilon");
        assert_eq!(err.code(), codes::CONFIG);
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let err = EngineConfig::from_yaml_str("max_pool_size: [").expect_err("broken");
        assert_eq!(err.code(), codes::CONFIG_PARSE);
    }
}
