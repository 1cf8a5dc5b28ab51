//! Strategy contract implemented by signal modifiers, point selectors,
//! parameter calculators and hard conditions.

use std::collections::BTreeMap;

use form_core::{ArgValue, ParamValue, PuzzleKind, Signal};
use indexmap::IndexMap;
use thiserror::Error;

/// Failure raised by a strategy's `run`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyError {
    /// Not enough signal on the window; the candidate branch is dropped.
    #[error("not enough signal")]
    OutOfSignal,
    /// Constructor argument missing or of the wrong type.
    #[error("invalid argument '{name}': {reason}")]
    InvalidArgument {
        /// Argument name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },
    /// Any other strategy failure.
    #[error("{0}")]
    Failed(String),
}

impl StrategyError {
    /// Shorthand for [`StrategyError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        StrategyError::Failed(message.into())
    }
}

/// Converted constructor arguments keyed by declared name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategyArgs {
    values: IndexMap<String, ArgValue>,
}

impl StrategyArgs {
    /// Creates an empty argument set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an argument.
    pub fn insert(&mut self, name: impl Into<String>, value: ArgValue) {
        self.values.insert(name.into(), value);
    }

    /// Builder form of [`StrategyArgs::insert`].
    pub fn with(mut self, name: impl Into<String>, value: ArgValue) -> Self {
        self.insert(name, value);
        self
    }

    /// Raw argument value.
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    /// Arguments in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no argument is set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn typed<T>(
        &self,
        name: &str,
        expected: &str,
        view: impl Fn(&ArgValue) -> Option<T>,
    ) -> Result<T, StrategyError> {
        let value = self.values.get(name).ok_or_else(|| StrategyError::InvalidArgument {
            name: name.to_string(),
            reason: "argument is not set".into(),
        })?;
        view(value).ok_or_else(|| StrategyError::InvalidArgument {
            name: name.to_string(),
            reason: format!("expected {expected}, got {}", value.to_literal()),
        })
    }

    /// Float argument; integers widen.
    pub fn float(&self, name: &str) -> Result<f64, StrategyError> {
        self.typed(name, "float", ArgValue::as_f64)
    }

    /// Integer argument.
    pub fn int(&self, name: &str) -> Result<i64, StrategyError> {
        self.typed(name, "int", ArgValue::as_i64)
    }

    /// Boolean argument.
    pub fn flag(&self, name: &str) -> Result<bool, StrategyError> {
        self.typed(name, "bool", ArgValue::as_bool)
    }

    /// Text argument.
    pub fn text(&self, name: &str) -> Result<String, StrategyError> {
        self.typed(name, "str", |value| value.as_str().map(str::to_string))
    }

    /// List of floats.
    pub fn float_list(&self, name: &str) -> Result<Vec<f64>, StrategyError> {
        self.typed(name, "list<float>", |value| {
            value
                .as_list()?
                .iter()
                .map(ArgValue::as_f64)
                .collect::<Option<Vec<_>>>()
        })
    }
}

/// Inputs handed to PC and HC strategies under their class-side names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PuzzleInputs {
    /// Point coordinates in seconds.
    pub points: BTreeMap<String, f64>,
    /// Parameter values.
    pub params: BTreeMap<String, ParamValue>,
}

impl PuzzleInputs {
    /// Coordinate of a bound input point.
    pub fn point(&self, name: &str) -> Result<f64, StrategyError> {
        self.points
            .get(name)
            .copied()
            .ok_or_else(|| StrategyError::failed(format!("input point '{name}' is not bound")))
    }

    /// Numeric value of a bound input parameter.
    pub fn number(&self, name: &str) -> Result<f64, StrategyError> {
        self.params
            .get(name)
            .and_then(ParamValue::as_f64)
            .ok_or_else(|| StrategyError::failed(format!("input parameter '{name}' is not numeric")))
    }
}

/// Returns a new signal with the same sample count.
///
/// The window is advisory: a modifier may process context outside it.
pub trait SignalModifier: Send + Sync {
    /// Applies the modification.
    fn run(&self, signal: &Signal, t_left: f64, t_right: f64) -> Result<Signal, StrategyError>;
}

/// Proposes coordinates inside `[t_left, t_right]`.
pub trait PointSelector: Send + Sync {
    /// Selects candidate coordinates in seconds.
    fn run(&self, signal: &Signal, t_left: f64, t_right: f64) -> Result<Vec<f64>, StrategyError>;
}

/// Computes named outputs from the signal and bound inputs.
pub trait ParameterCalculator: Send + Sync {
    /// Returns values keyed by declared output name.
    fn run(
        &self,
        signal: &Signal,
        inputs: &PuzzleInputs,
    ) -> Result<BTreeMap<String, ParamValue>, StrategyError>;
}

/// Boolean verdict over bound parameters.
pub trait HardCondition: Send + Sync {
    /// Returns whether the condition holds.
    fn run(&self, inputs: &PuzzleInputs) -> Result<bool, StrategyError>;
}

/// Constructed strategy of any kind.
pub enum StrategyInstance {
    /// Signal modifier.
    Sm(Box<dyn SignalModifier>),
    /// Point selector.
    Ps(Box<dyn PointSelector>),
    /// Parameter calculator.
    Pc(Box<dyn ParameterCalculator>),
    /// Hard condition.
    Hc(Box<dyn HardCondition>),
}

impl StrategyInstance {
    /// Kind of the constructed strategy.
    pub fn kind(&self) -> PuzzleKind {
        match self {
            StrategyInstance::Sm(_) => PuzzleKind::Sm,
            StrategyInstance::Ps(_) => PuzzleKind::Ps,
            StrategyInstance::Pc(_) => PuzzleKind::Pc,
            StrategyInstance::Hc(_) => PuzzleKind::Hc,
        }
    }
}

impl std::fmt::Debug for StrategyInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyInstance")
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}
