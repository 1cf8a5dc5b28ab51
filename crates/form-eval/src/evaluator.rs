//! The scoring contract shared by every evaluator variant.

use form_core::errors::{codes, FormError};
use form_core::{Exemplar, ParamValue};

/// Scores how typical an exemplar is, in `[0, 1]`, higher meaning more typical.
pub trait Evaluator: Send + Sync {
    /// Variant name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Parameters the evaluator was fitted on, in row order.
    fn parameters(&self) -> &[String];

    /// Raw score of one row in the parameters' original units.
    fn score_row(&self, row: &[f64]) -> f64;

    /// Scores an exemplar; absent parameters are an error.
    fn eval_exemplar(&self, exemplar: &Exemplar) -> Result<f64, FormError> {
        let row = extract_row(self.name(), self.parameters(), exemplar)?;
        Ok(clamp_unit(self.score_row(&row)))
    }
}

/// Reads the named parameters of an exemplar as numbers.
pub fn extract_row(
    evaluator: &str,
    parameters: &[String],
    exemplar: &Exemplar,
) -> Result<Vec<f64>, FormError> {
    parameters
        .iter()
        .map(|name| {
            let value = exemplar
                .parameter(name)
                .ok_or_else(|| FormError::missing_parameter(evaluator, name))?;
            match value.as_f64() {
                Some(number) if number.is_finite() => Ok(number),
                _ => Err(non_numeric(evaluator, name, value)),
            }
        })
        .collect()
}

fn non_numeric(evaluator: &str, name: &str, value: &ParamValue) -> FormError {
    FormError::evaluator(
        codes::NON_NUMERIC,
        evaluator,
        format!("parameter '{name}' is not a finite number"),
    )
    .with_context("parameter", name)
    .with_context("value", value.to_string())
}

/// Clamps to `[0, 1]`; NaN maps to zero.
pub fn clamp_unit(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_handles_nan_and_bounds() {
        assert_eq!(clamp_unit(f64::NAN), 0.0);
        assert_eq!(clamp_unit(-0.5), 0.0);
        assert_eq!(clamp_unit(1.5), 1.0);
        assert_eq!(clamp_unit(0.25), 0.25);
    }
}
