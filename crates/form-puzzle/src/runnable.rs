//! Runnable wrappers adapting the four strategy kinds to one protocol:
//! construct, bind inputs, invoke, translate.

use std::fmt;

use form_core::errors::{codes, FormError};
use form_core::{DataType, Exemplar, Form, ParamValue, Puzzle, PuzzleId, PuzzleKind, Signal};
use indexmap::IndexMap;
use tracing::debug;

use crate::binder::{PuzzleBinder, PuzzleBinding};
use crate::descriptor::StrategyClass;
use crate::registry::StrategyRegistry;
use crate::strategy::{
    HardCondition, ParameterCalculator, PointSelector, PuzzleInputs, SignalModifier,
    StrategyError, StrategyInstance,
};

/// Result of a wrapper call: a value or the benign opt-out.
#[derive(Debug, Clone, PartialEq)]
pub enum PuzzleOutcome<T> {
    /// The strategy produced a value.
    Done(T),
    /// The strategy declined the window.
    OutOfSignal {
        /// Class that opted out.
        class_name: String,
    },
}

impl<T> PuzzleOutcome<T> {
    /// Whether the strategy opted out.
    pub fn is_out_of_signal(&self) -> bool {
        matches!(self, PuzzleOutcome::OutOfSignal { .. })
    }

    /// Treats the opt-out as [`FormError::PuzzleOutOfSignal`].
    pub fn into_result(self) -> Result<T, FormError> {
        match self {
            PuzzleOutcome::Done(value) => Ok(value),
            PuzzleOutcome::OutOfSignal { class_name } => Err(FormError::out_of_signal(&class_name)),
        }
    }

    /// Maps the produced value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> PuzzleOutcome<U> {
        match self {
            PuzzleOutcome::Done(value) => PuzzleOutcome::Done(f(value)),
            PuzzleOutcome::OutOfSignal { class_name } => PuzzleOutcome::OutOfSignal { class_name },
        }
    }
}

/// Sorts coordinates and drops every one closer than `epsilon` to the last kept.
pub fn dedup_coordinates(coords: Vec<f64>, epsilon: f64) -> Vec<f64> {
    dedup_by_coordinate(coords, epsilon, |t| *t)
}

/// Epsilon deduplication over items carrying a coordinate.
///
/// The sort is stable, so among equal coordinates the earliest item wins.
pub fn dedup_by_coordinate<T>(mut items: Vec<T>, epsilon: f64, coord: impl Fn(&T) -> f64) -> Vec<T> {
    items.sort_by(|a, b| coord(a).total_cmp(&coord(b)));
    let mut kept: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        match kept.last() {
            Some(last) if coord(&item) - coord(last) < epsilon => {}
            _ => kept.push(item),
        }
    }
    kept
}

fn construct(
    puzzle: &Puzzle,
    form: &Form,
    class: &StrategyClass,
    expected: PuzzleKind,
) -> Result<(PuzzleBinding, StrategyInstance), FormError> {
    let binding = PuzzleBinder::new(puzzle, form, class).bind()?;
    let instance = class.instantiate(&binding.arguments).map_err(|err| {
        FormError::run_puzzle(
            codes::CLASS_CREATION,
            puzzle.id,
            &binding.class_name,
            "strategy constructor failed",
        )
        .with_context("cause", err.to_string())
    })?;
    if instance.kind() != expected {
        return Err(FormError::run_puzzle(
            codes::CLASS_CREATION,
            puzzle.id,
            &binding.class_name,
            format!("constructed a {} where a {expected} was expected", instance.kind()),
        ));
    }
    Ok((binding, instance))
}

fn translate<T>(binding: &PuzzleBinding, result: Result<T, StrategyError>) -> Result<PuzzleOutcome<T>, FormError> {
    match result {
        Ok(value) => Ok(PuzzleOutcome::Done(value)),
        Err(StrategyError::OutOfSignal) => {
            debug!(puzzle_id = %binding.puzzle_id, class = %binding.class_name, "strategy out of signal");
            Ok(PuzzleOutcome::OutOfSignal {
                class_name: binding.class_name.clone(),
            })
        }
        Err(err) => Err(FormError::run_puzzle(
            codes::EXECUTION,
            binding.puzzle_id,
            &binding.class_name,
            "strategy failed",
        )
        .with_context("cause", err.to_string())),
    }
}

fn collect_inputs(binding: &PuzzleBinding, exemplar: &Exemplar) -> Result<PuzzleInputs, FormError> {
    let mut inputs = PuzzleInputs::default();
    let mut absent = Vec::new();
    for (class_side, form_side) in &binding.point_names {
        match exemplar.point(form_side) {
            Some(t) => {
                inputs.points.insert(class_side.clone(), t);
            }
            None => absent.push(form_side.clone()),
        }
    }
    if !absent.is_empty() {
        return Err(FormError::missing_inputs(
            codes::MISSING_INPUT_POINTS,
            binding.puzzle_id,
            &binding.class_name,
            &absent,
        ));
    }
    for (class_side, form_side) in &binding.input_param_names {
        match exemplar.parameter(form_side) {
            Some(value) => {
                inputs.params.insert(class_side.clone(), value.clone());
            }
            None => absent.push(form_side.clone()),
        }
    }
    if !absent.is_empty() {
        return Err(FormError::missing_inputs(
            codes::MISSING_INPUT_PARAMS,
            binding.puzzle_id,
            &binding.class_name,
            &absent,
        ));
    }
    Ok(inputs)
}

/// Runnable signal modifier.
pub struct RunnableSm {
    binding: PuzzleBinding,
    strategy: Box<dyn SignalModifier>,
}

impl RunnableSm {
    /// Binds and constructs the puzzle.
    pub fn new(puzzle: &Puzzle, form: &Form, class: &StrategyClass) -> Result<Self, FormError> {
        match construct(puzzle, form, class, PuzzleKind::Sm)? {
            (binding, StrategyInstance::Sm(strategy)) => Ok(Self { binding, strategy }),
            (binding, _) => Err(wrong_kind(&binding)),
        }
    }

    /// Resolved bindings.
    pub fn binding(&self) -> &PuzzleBinding {
        &self.binding
    }

    /// Applies the modifier; the sample count must not change.
    pub fn run(&self, signal: &Signal, t_left: f64, t_right: f64) -> Result<PuzzleOutcome<Signal>, FormError> {
        let outcome = translate(&self.binding, self.strategy.run(signal, t_left, t_right))?;
        if let PuzzleOutcome::Done(modified) = &outcome {
            if modified.len() != signal.len() {
                return Err(FormError::sm_changed_len(
                    self.binding.puzzle_id,
                    &self.binding.class_name,
                    signal.len(),
                    modified.len(),
                ));
            }
        }
        Ok(outcome)
    }
}

/// Runnable point selector.
pub struct RunnablePs {
    binding: PuzzleBinding,
    strategy: Box<dyn PointSelector>,
}

impl RunnablePs {
    /// Binds and constructs the puzzle.
    pub fn new(puzzle: &Puzzle, form: &Form, class: &StrategyClass) -> Result<Self, FormError> {
        match construct(puzzle, form, class, PuzzleKind::Ps)? {
            (binding, StrategyInstance::Ps(strategy)) => Ok(Self { binding, strategy }),
            (binding, _) => Err(wrong_kind(&binding)),
        }
    }

    /// Resolved bindings.
    pub fn binding(&self) -> &PuzzleBinding {
        &self.binding
    }

    /// Selects coordinates inside `[t_left, t_right]`, deduplicated by `epsilon`.
    pub fn run(
        &self,
        signal: &Signal,
        t_left: f64,
        t_right: f64,
        epsilon: f64,
    ) -> Result<PuzzleOutcome<Vec<f64>>, FormError> {
        let outcome = translate(&self.binding, self.strategy.run(signal, t_left, t_right))?;
        let coords = match outcome {
            PuzzleOutcome::Done(coords) => coords,
            other => return Ok(other),
        };
        if let Some(bad) = coords
            .iter()
            .copied()
            .find(|t| !t.is_finite() || *t < t_left || *t > t_right)
        {
            return Err(FormError::point_out_of_interval(
                self.binding.puzzle_id,
                &self.binding.class_name,
                t_left,
                t_right,
                bad,
            ));
        }
        Ok(PuzzleOutcome::Done(dedup_coordinates(coords, epsilon)))
    }
}

/// Runnable parameter calculator.
pub struct RunnablePc {
    binding: PuzzleBinding,
    strategy: Box<dyn ParameterCalculator>,
}

impl RunnablePc {
    /// Binds and constructs the puzzle.
    pub fn new(puzzle: &Puzzle, form: &Form, class: &StrategyClass) -> Result<Self, FormError> {
        match construct(puzzle, form, class, PuzzleKind::Pc)? {
            (binding, StrategyInstance::Pc(strategy)) => Ok(Self { binding, strategy }),
            (binding, _) => Err(wrong_kind(&binding)),
        }
    }

    /// Resolved bindings.
    pub fn binding(&self) -> &PuzzleBinding {
        &self.binding
    }

    /// Computes outputs keyed by form parameter name.
    pub fn run(&self, exemplar: &Exemplar) -> Result<PuzzleOutcome<IndexMap<String, ParamValue>>, FormError> {
        let inputs = collect_inputs(&self.binding, exemplar)?;
        let outcome = translate(&self.binding, self.strategy.run(exemplar.signal(), &inputs))?;
        let PuzzleOutcome::Done(raw) = outcome else {
            return Ok(PuzzleOutcome::OutOfSignal {
                class_name: self.binding.class_name.clone(),
            });
        };
        let mut produced: IndexMap<String, ParamValue> = IndexMap::new();
        for (class_side, value) in raw {
            let bound = self.binding.output_params.get(&class_side).ok_or_else(|| {
                FormError::run_puzzle(
                    codes::EXECUTION,
                    self.binding.puzzle_id,
                    &self.binding.class_name,
                    "strategy returned an undeclared output",
                )
                .with_context("output", class_side.as_str())
            })?;
            if !value.conforms_to(&bound.data_type) {
                return Err(FormError::run_puzzle(
                    codes::EXECUTION,
                    self.binding.puzzle_id,
                    &self.binding.class_name,
                    "output value does not match the parameter type",
                )
                .with_context("output", class_side.as_str())
                .with_context("expected", bound.data_type.to_string())
                .with_context("value", value.to_string()));
            }
            let value = match (value, &bound.data_type) {
                (ParamValue::Int(int), DataType::Float) => ParamValue::Float(int as f64),
                (value, _) => value,
            };
            produced.insert(bound.name.clone(), value);
        }
        let absent: Vec<String> = self
            .binding
            .output_params
            .values()
            .filter(|bound| !produced.contains_key(&bound.name))
            .map(|bound| bound.name.clone())
            .collect();
        if !absent.is_empty() {
            return Err(FormError::missing_inputs(
                codes::MISSING_OUTPUTS,
                self.binding.puzzle_id,
                &self.binding.class_name,
                &absent,
            ));
        }
        Ok(PuzzleOutcome::Done(produced))
    }
}

/// Runnable hard condition.
pub struct RunnableHc {
    binding: PuzzleBinding,
    strategy: Box<dyn HardCondition>,
}

impl RunnableHc {
    /// Binds and constructs the puzzle.
    pub fn new(puzzle: &Puzzle, form: &Form, class: &StrategyClass) -> Result<Self, FormError> {
        match construct(puzzle, form, class, PuzzleKind::Hc)? {
            (binding, StrategyInstance::Hc(strategy)) => Ok(Self { binding, strategy }),
            (binding, _) => Err(wrong_kind(&binding)),
        }
    }

    /// Resolved bindings.
    pub fn binding(&self) -> &PuzzleBinding {
        &self.binding
    }

    /// Evaluates the condition on the exemplar's parameters.
    pub fn run(&self, exemplar: &Exemplar) -> Result<PuzzleOutcome<bool>, FormError> {
        let inputs = collect_inputs(&self.binding, exemplar)?;
        translate(&self.binding, self.strategy.run(&inputs))
    }
}

fn wrong_kind(binding: &PuzzleBinding) -> FormError {
    FormError::run_puzzle(
        codes::CLASS_CREATION,
        binding.puzzle_id,
        &binding.class_name,
        "strategy instance has the wrong kind",
    )
}

/// Runnable puzzle of any kind.
pub enum RunnablePuzzle {
    /// Signal modifier.
    Sm(RunnableSm),
    /// Point selector.
    Ps(RunnablePs),
    /// Parameter calculator.
    Pc(RunnablePc),
    /// Hard condition.
    Hc(RunnableHc),
}

impl RunnablePuzzle {
    /// Looks the class up in `registry`, binds and constructs the puzzle.
    pub fn from_registry(puzzle: &Puzzle, form: &Form, registry: &StrategyRegistry) -> Result<Self, FormError> {
        let class = registry.get(&puzzle.class_ref.name)?;
        Ok(match puzzle.kind() {
            PuzzleKind::Sm => RunnablePuzzle::Sm(RunnableSm::new(puzzle, form, &class)?),
            PuzzleKind::Ps => RunnablePuzzle::Ps(RunnablePs::new(puzzle, form, &class)?),
            PuzzleKind::Pc => RunnablePuzzle::Pc(RunnablePc::new(puzzle, form, &class)?),
            PuzzleKind::Hc => RunnablePuzzle::Hc(RunnableHc::new(puzzle, form, &class)?),
        })
    }

    /// Resolved bindings.
    pub fn binding(&self) -> &PuzzleBinding {
        match self {
            RunnablePuzzle::Sm(inner) => inner.binding(),
            RunnablePuzzle::Ps(inner) => inner.binding(),
            RunnablePuzzle::Pc(inner) => inner.binding(),
            RunnablePuzzle::Hc(inner) => inner.binding(),
        }
    }

    /// Catalogue id.
    pub fn id(&self) -> PuzzleId {
        self.binding().puzzle_id
    }
}

macro_rules! debug_runnable {
    ($($name:ident),*) => {
        $(impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("binding", &self.binding)
                    .finish_non_exhaustive()
            }
        })*
    };
}

debug_runnable!(RunnableSm, RunnablePs, RunnablePc, RunnableHc);

impl fmt::Debug for RunnablePuzzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RunnablePuzzle").field(self.binding()).finish()
    }
}
