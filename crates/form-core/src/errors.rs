//! Structured error types shared across the form engine crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable machine readable error codes.
pub mod codes {
    /// Strategy opted out on the current window.
    pub const OUT_OF_SIGNAL: &str = "puzzle.out_of_signal";

    /// Strategy class could not be instantiated or does not match the catalogue.
    pub const CLASS_CREATION: &str = "run_puzzle.class_creation";
    /// Point bindings of a puzzle are inconsistent.
    pub const POINTS_MAPPING: &str = "run_puzzle.points_mapping";
    /// Parameter bindings of a puzzle are inconsistent.
    pub const PARAMS_MAPPING: &str = "run_puzzle.params_mapping";
    /// Required points are absent from the exemplar.
    pub const MISSING_INPUT_POINTS: &str = "run_puzzle.missing_input_points";
    /// Required parameters are absent from the exemplar.
    pub const MISSING_INPUT_PARAMS: &str = "run_puzzle.missing_input_params";
    /// Declared outputs were not produced by the strategy.
    pub const MISSING_OUTPUTS: &str = "run_puzzle.missing_outputs";
    /// Strategy raised while running.
    pub const EXECUTION: &str = "run_puzzle.execution";
    /// Signal modifier changed the number of samples.
    pub const SM_CHANGED_LEN: &str = "run_puzzle.sm_changed_len";
    /// Point selector returned a coordinate outside the interval.
    pub const POINT_OUT_OF_INTERVAL: &str = "run_puzzle.point_out_of_interval";
    /// Argument literal could not be converted to its declared type.
    pub const CONVERSION: &str = "run_puzzle.conversion";
    /// Catalogue declaration and strategy class disagree.
    pub const MISMATCH: &str = "run_puzzle.mismatch";

    /// Track interval holds no samples.
    pub const EMPTY_SIGNAL: &str = "run_track.empty_signal";
    /// Track produced a coordinate outside its interval.
    pub const TRACK_OUT_OF_INTERVAL: &str = "run_track.out_of_interval";
    /// Step interval could not be resolved for a candidate.
    pub const TRACK_INVALID_INTERVAL: &str = "run_track.invalid_interval";
    /// Unexpected failure inside the track runner.
    pub const TRACK_INTERNAL: &str = "run_track.internal";

    /// Step declares no tracks.
    pub const NO_TRACKS: &str = "run_step.no_tracks";
    /// Step target point is unknown or already placed.
    pub const INVALID_TARGET: &str = "run_step.invalid_target";

    /// Schema could not schedule every puzzle.
    pub const SCHEMA_BLOCKED: &str = "schema.blocked";

    /// Form violates a structural invariant.
    pub const INVALID_FORM: &str = "form.invalid";
    /// Form interval or seminal point is invalid.
    pub const INVALID_INTERVAL: &str = "form.invalid_interval";

    /// Requested window lies outside the signal.
    pub const OUT_OF_RANGE: &str = "signal.out_of_range";

    /// Attempt to re-write an existing exemplar entry.
    pub const DUPLICATE: &str = "exemplar.duplicate";
    /// Value rejected by an exemplar setter.
    pub const INVALID_VALUE: &str = "exemplar.invalid_value";

    /// Strategy class is not registered.
    pub const UNKNOWN: &str = "registry.unknown";
    /// Process-wide registry was already installed.
    pub const ALREADY_INSTALLED: &str = "registry.already_installed";
    /// Process-wide registry has not been installed yet.
    pub const NOT_INSTALLED: &str = "registry.not_installed";
    /// Two strategy classes share a name.
    pub const DUPLICATE_CLASS: &str = "registry.duplicate_class";
    /// Strategy library could not be read.
    pub const REGISTRY_IO: &str = "registry.io";
    /// Strategy manifest could not be parsed.
    pub const MANIFEST: &str = "registry.manifest";

    /// Exemplar lacks a parameter the evaluator was fitted on.
    pub const MISSING_PARAMETER: &str = "evaluator.missing_parameter";
    /// Parameter value cannot be used by an evaluator.
    pub const NON_NUMERIC: &str = "evaluator.non_numeric";
    /// Reference sample too small or degenerate for the variant.
    pub const INSUFFICIENT_DATA: &str = "evaluator.insufficient_data";
    /// Evaluator configuration is invalid.
    pub const EVALUATOR_CONFIG: &str = "evaluator.config";

    /// Dataset rows or columns are inconsistent.
    pub const DATASET_SHAPE: &str = "dataset.shape";
    /// Dataset column does not exist.
    pub const DATASET_COLUMN: &str = "dataset.column";
    /// Dataset export failed.
    pub const DATASET_EXPORT: &str = "dataset.export";

    /// Engine configuration is invalid.
    pub const CONFIG: &str = "config.invalid";
    /// Engine configuration could not be read or parsed.
    pub const CONFIG_PARSE: &str = "config.parse";
}

/// Code, message and the form entities a failure concerns.
///
/// Context keys name entities (`puzzle_id`, `class_name`, `step_num`,
/// `interval`, ...) so callers can filter failures without parsing messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// One of [`codes`].
    pub code: String,
    /// Diagnostic for humans.
    pub message: String,
    /// Entities involved, keyed by kind.
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// How to fix the catalogue entry or configuration, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Payload without context.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Payload naming the puzzle and strategy class at fault.
    pub fn for_puzzle(
        code: &str,
        puzzle_id: impl Display,
        class_name: &str,
        message: impl Into<String>,
    ) -> Self {
        Self::new(code, message)
            .with_context("puzzle_id", puzzle_id.to_string())
            .with_context("class_name", class_name)
    }

    /// Adds one context entry.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Adds a comma separated list of names.
    pub fn with_names<S: AsRef<str>>(self, key: impl Into<String>, names: &[S]) -> Self {
        self.with_context(key, join_names(names))
    }

    /// Sets the remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Context value recorded under `key`.
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context.get(key).map(String::as_str)
    }
}

fn join_names<S: AsRef<str>>(names: &[S]) -> String {
    names.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(",")
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        let mut entries = self.context.iter();
        if let Some((key, value)) = entries.next() {
            write!(f, " ({key}={value}")?;
            for (key, value) in entries {
                write!(f, " {key}={value}")?;
            }
            write!(f, ")")?;
        }
        match &self.hint {
            Some(hint) => write!(f, "; hint: {hint}"),
            None => Ok(()),
        }
    }
}

/// Canonical error type for the form engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum FormError {
    /// A strategy declined to work on the current window.
    #[error("puzzle out of signal: {0}")]
    PuzzleOutOfSignal(ErrorInfo),
    /// Binding or invocation of a puzzle failed.
    #[error("run puzzle error: {0}")]
    RunPuzzle(ErrorInfo),
    /// Track execution failed.
    #[error("run track error: {0}")]
    RunTrack(ErrorInfo),
    /// Step execution failed as a whole.
    #[error("run step error: {0}")]
    RunStep(ErrorInfo),
    /// Schema compilation failed.
    #[error("schema error: {0}")]
    Schema(ErrorInfo),
    /// Form structure or setup is invalid.
    #[error("form error: {0}")]
    Form(ErrorInfo),
    /// Signal window errors.
    #[error("signal error: {0}")]
    Signal(ErrorInfo),
    /// Exemplar bookkeeping errors.
    #[error("exemplar error: {0}")]
    Exemplar(ErrorInfo),
    /// Strategy registry errors.
    #[error("registry error: {0}")]
    Registry(ErrorInfo),
    /// Evaluator fit and scoring errors.
    #[error("evaluator error: {0}")]
    Evaluator(ErrorInfo),
    /// Dataset wrapper errors.
    #[error("dataset error: {0}")]
    Dataset(ErrorInfo),
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Programmer errors in core bookkeeping.
    #[error("core error: {0}")]
    Core(ErrorInfo),
}

impl FormError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            FormError::PuzzleOutOfSignal(info)
            | FormError::RunPuzzle(info)
            | FormError::RunTrack(info)
            | FormError::RunStep(info)
            | FormError::Schema(info)
            | FormError::Form(info)
            | FormError::Signal(info)
            | FormError::Exemplar(info)
            | FormError::Registry(info)
            | FormError::Evaluator(info)
            | FormError::Dataset(info)
            | FormError::Config(info)
            | FormError::Core(info) => info,
        }
    }

    fn info_mut(&mut self) -> &mut ErrorInfo {
        match self {
            FormError::PuzzleOutOfSignal(info)
            | FormError::RunPuzzle(info)
            | FormError::RunTrack(info)
            | FormError::RunStep(info)
            | FormError::Schema(info)
            | FormError::Form(info)
            | FormError::Signal(info)
            | FormError::Exemplar(info)
            | FormError::Registry(info)
            | FormError::Evaluator(info)
            | FormError::Dataset(info)
            | FormError::Config(info)
            | FormError::Core(info) => info,
        }
    }

    /// Returns the stable error code.
    pub fn code(&self) -> &str {
        &self.info().code
    }

    /// Adds a context entry without changing the family.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.info_mut().context.insert(key.into(), value.into());
        self
    }

    /// Adds a comma separated list of names to the context.
    pub fn with_names<S: AsRef<str>>(self, key: impl Into<String>, names: &[S]) -> Self {
        self.with_context(key, join_names(names))
    }

    /// Replaces the remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.info_mut().hint = Some(hint.into());
        self
    }

    /// Whether the failure only concerns the candidate being extended.
    ///
    /// Binding kinds (class creation, mappings) are broken catalogue entries
    /// and are never candidate-local.
    pub fn is_candidate_local(&self) -> bool {
        match self {
            FormError::PuzzleOutOfSignal(_) | FormError::RunTrack(_) => true,
            FormError::RunPuzzle(info) => !matches!(
                info.code.as_str(),
                codes::CLASS_CREATION
                    | codes::POINTS_MAPPING
                    | codes::PARAMS_MAPPING
                    | codes::MISMATCH
                    | codes::CONVERSION
            ),
            _ => false,
        }
    }

    /// A strategy opted out on the current window.
    pub fn out_of_signal(class_name: &str) -> Self {
        FormError::PuzzleOutOfSignal(
            ErrorInfo::new(codes::OUT_OF_SIGNAL, "not enough signal for the strategy")
                .with_context("class_name", class_name),
        )
    }

    /// Builds a puzzle error carrying the puzzle id and class name.
    pub fn run_puzzle(
        code: &str,
        puzzle_id: impl Display,
        class_name: &str,
        message: impl Into<String>,
    ) -> Self {
        FormError::RunPuzzle(ErrorInfo::for_puzzle(code, puzzle_id, class_name, message))
    }

    /// Required inputs are absent from the exemplar.
    pub fn missing_inputs(
        code: &str,
        puzzle_id: impl Display,
        class_name: &str,
        absent: &[String],
    ) -> Self {
        FormError::RunPuzzle(
            ErrorInfo::for_puzzle(
                code,
                puzzle_id,
                class_name,
                "required inputs are absent from the exemplar",
            )
            .with_names("missing", absent),
        )
    }

    /// Signal modifier changed the sample count.
    pub fn sm_changed_len(
        puzzle_id: impl Display,
        class_name: &str,
        expected: usize,
        actual: usize,
    ) -> Self {
        let delta = actual as i64 - expected as i64;
        FormError::RunPuzzle(
            ErrorInfo::for_puzzle(
                codes::SM_CHANGED_LEN,
                puzzle_id,
                class_name,
                "signal modifier changed the number of samples",
            )
            .with_context("expected", expected.to_string())
            .with_context("actual", actual.to_string())
            .with_context("delta", delta.to_string()),
        )
    }

    /// Point selector returned a coordinate outside the interval.
    pub fn point_out_of_interval(
        puzzle_id: impl Display,
        class_name: &str,
        t_left: f64,
        t_right: f64,
        point: f64,
    ) -> Self {
        FormError::RunPuzzle(
            ErrorInfo::for_puzzle(
                codes::POINT_OUT_OF_INTERVAL,
                puzzle_id,
                class_name,
                "point selector returned a coordinate outside the interval",
            )
            .with_context("interval", format!("[{t_left}, {t_right}]"))
            .with_context("point", point.to_string()),
        )
    }

    /// Argument literal could not be converted.
    pub fn conversion(literal: &str, data_type: impl Display, reason: impl Into<String>) -> Self {
        FormError::RunPuzzle(
            ErrorInfo::new(codes::CONVERSION, reason)
                .with_context("literal", literal)
                .with_context("data_type", data_type.to_string()),
        )
    }

    /// Track level failure.
    pub fn run_track(code: &str, track_id: impl Display, message: impl Into<String>) -> Self {
        FormError::RunTrack(
            ErrorInfo::new(code, message).with_context("track_id", track_id.to_string()),
        )
    }

    /// Step level failure.
    pub fn run_step(code: &str, step_num: usize, message: impl Into<String>) -> Self {
        FormError::RunStep(
            ErrorInfo::new(code, message).with_context("step_num", step_num.to_string()),
        )
    }

    /// Form structural failure.
    pub fn invalid_form(form_id: impl Display, message: impl Into<String>) -> Self {
        FormError::Form(
            ErrorInfo::new(codes::INVALID_FORM, message)
                .with_context("form_id", form_id.to_string()),
        )
    }

    /// Invalid interval at form setup.
    pub fn invalid_interval(
        form_id: impl Display,
        step_num: Option<usize>,
        message: impl Into<String>,
    ) -> Self {
        let mut info = ErrorInfo::new(codes::INVALID_INTERVAL, message)
            .with_context("form_id", form_id.to_string());
        if let Some(step) = step_num {
            info = info.with_context("step_num", step.to_string());
        }
        FormError::Form(info)
    }

    /// Signal window error.
    pub fn out_of_range(t_left: f64, t_right: f64, message: impl Into<String>) -> Self {
        FormError::Signal(
            ErrorInfo::new(codes::OUT_OF_RANGE, message)
                .with_context("interval", format!("[{t_left}, {t_right}]")),
        )
    }

    /// Exemplar entry already present.
    pub fn duplicate(kind: &str, name: &str) -> Self {
        FormError::Exemplar(
            ErrorInfo::new(codes::DUPLICATE, format!("{kind} '{name}' is already set"))
                .with_context("kind", kind)
                .with_context("name", name),
        )
    }

    /// Rejected exemplar value.
    pub fn invalid_value(field: &str, value: impl Display) -> Self {
        FormError::Exemplar(
            ErrorInfo::new(codes::INVALID_VALUE, format!("invalid value for {field}"))
                .with_context("field", field)
                .with_context("value", value.to_string()),
        )
    }

    /// Strategy class not found in the registry.
    pub fn unknown_class(name: &str) -> Self {
        FormError::Registry(
            ErrorInfo::new(codes::UNKNOWN, format!("strategy class '{name}' is not registered"))
                .with_context("class_name", name),
        )
    }

    /// Evaluator asked for a parameter the exemplar does not hold.
    pub fn missing_parameter(evaluator: &str, name: &str) -> Self {
        FormError::Evaluator(
            ErrorInfo::new(
                codes::MISSING_PARAMETER,
                format!("exemplar has no parameter '{name}'"),
            )
            .with_context("evaluator", evaluator)
            .with_context("parameter", name),
        )
    }

    /// Evaluator fit or scoring failure.
    pub fn evaluator(code: &str, evaluator: &str, message: impl Into<String>) -> Self {
        FormError::Evaluator(ErrorInfo::new(code, message).with_context("evaluator", evaluator))
    }

    /// Rejected configuration field.
    pub fn config(field: &str, message: impl Into<String>) -> Self {
        FormError::Config(ErrorInfo::new(codes::CONFIG, message).with_context("field", field))
    }

    /// Dataset wrapper failure.
    pub fn dataset(code: &str, message: impl Into<String>) -> Self {
        FormError::Dataset(ErrorInfo::new(code, message))
    }

    /// Programmer error.
    pub fn core(message: impl Into<String>) -> Self {
        FormError::Core(ErrorInfo::new("core.internal", message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context_in_key_order() {
        let err = FormError::sm_changed_len(7, "Shrink", 100, 99);
        let text = err.to_string();
        assert!(text.starts_with("run puzzle error: signal modifier changed"));
        assert!(text.contains("delta=-1"));
        assert!(text.contains("puzzle_id=7"));
    }

    #[test]
    fn binding_kinds_are_not_candidate_local() {
        let binding = FormError::run_puzzle(codes::POINTS_MAPPING, 1, "X", "bad");
        assert!(!binding.is_candidate_local());
        let execution = FormError::run_puzzle(codes::EXECUTION, 1, "X", "boom");
        assert!(execution.is_candidate_local());
        assert!(FormError::out_of_signal("X").is_candidate_local());
        assert!(!FormError::run_step(codes::NO_TRACKS, 0, "none").is_candidate_local());
    }
}
