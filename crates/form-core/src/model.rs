//! Declarative form model hydrated from the catalogue.
//!
//! Every entity is owned by its [`Form`] in an ordered sequence; references
//! between entities are integer ids resolved with the lookup helpers below.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::errors::FormError;
use crate::ids::{ClassId, DeclId, FormId, ParameterId, PointId, PuzzleId, TrackId};
use crate::value::DataType;

/// Strategy kind carried by a catalogue class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PuzzleKind {
    /// Signal modifier.
    Sm,
    /// Point selector.
    Ps,
    /// Parameter calculator.
    Pc,
    /// Hard condition.
    Hc,
}

impl PuzzleKind {
    /// All kinds in library folder order.
    pub const ALL: [PuzzleKind; 4] = [PuzzleKind::Sm, PuzzleKind::Ps, PuzzleKind::Pc, PuzzleKind::Hc];

    /// Library subfolder holding classes of this kind.
    pub fn folder(&self) -> &'static str {
        match self {
            PuzzleKind::Sm => "sm",
            PuzzleKind::Ps => "ps",
            PuzzleKind::Pc => "pc",
            PuzzleKind::Hc => "hc",
        }
    }
}

impl std::fmt::Display for PuzzleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PuzzleKind::Sm => "SM",
            PuzzleKind::Ps => "PS",
            PuzzleKind::Pc => "PC",
            PuzzleKind::Hc => "HC",
        };
        write!(f, "{label}")
    }
}

/// Named point placed on a signal by a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    /// Catalogue identifier.
    pub id: PointId,
    /// Unique name within the form.
    pub name: String,
    /// Free comment.
    #[serde(default)]
    pub comment: String,
}

/// Named value computed by parameter calculators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Catalogue identifier.
    pub id: ParameterId,
    /// Unique name within the form.
    pub name: String,
    /// Free comment.
    #[serde(default)]
    pub comment: String,
    /// Scalar data type of the value.
    pub data_type: DataType,
}

/// One side of a step interval.
///
/// Serialized as a map holding exactly one of `point` or `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BoundaryColumns", into = "BoundaryColumns")]
pub enum Boundary {
    /// Coordinate of an already placed point.
    Point(PointId),
    /// Signed offset in seconds from the opposite anchor.
    Offset(f64),
}

/// Catalogue columns of a boundary.
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct BoundaryColumns {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    point: Option<PointId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    offset: Option<f64>,
}

impl TryFrom<BoundaryColumns> for Boundary {
    type Error = FormError;

    fn try_from(columns: BoundaryColumns) -> Result<Self, Self::Error> {
        Boundary::from_parts(columns.point, columns.offset)
    }
}

impl From<Boundary> for BoundaryColumns {
    fn from(boundary: Boundary) -> Self {
        match boundary {
            Boundary::Point(point) => BoundaryColumns {
                point: Some(point),
                offset: None,
            },
            Boundary::Offset(offset) => BoundaryColumns {
                point: None,
                offset: Some(offset),
            },
        }
    }
}

impl Boundary {
    /// Builds a boundary from the catalogue's two optional columns.
    pub fn from_parts(point: Option<PointId>, offset: Option<f64>) -> Result<Self, FormError> {
        match (point, offset) {
            (Some(point), None) => Ok(Boundary::Point(point)),
            (None, Some(offset)) if offset.is_finite() => Ok(Boundary::Offset(offset)),
            (None, Some(offset)) => Err(FormError::invalid_form(
                "-",
                format!("boundary offset {offset} is not finite"),
            )),
            (Some(_), Some(_)) => Err(FormError::invalid_form(
                "-",
                "boundary declares both a point and an offset",
            )),
            (None, None) => Err(FormError::invalid_form(
                "-",
                "boundary declares neither a point nor an offset",
            )),
        }
    }

    /// Referenced point, if any.
    pub fn point(&self) -> Option<PointId> {
        match self {
            Boundary::Point(id) => Some(*id),
            Boundary::Offset(_) => None,
        }
    }
}

/// SM-then-PS pipeline proposing coordinates for a step target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Catalogue identifier.
    pub id: TrackId,
    /// Signal modifiers applied in order.
    #[serde(default)]
    pub sms: Vec<Puzzle>,
    /// Point selectors whose outputs are unioned.
    pub pss: Vec<Puzzle>,
}

impl Track {
    /// A track is valid iff it holds at least one point selector.
    pub fn is_valid(&self) -> bool {
        !self.pss.is_empty()
    }
}

/// One unit of the execution plan placing a single target point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Position declared by the catalogue.
    pub num_in_form: usize,
    /// Point placed by this step.
    pub target_point: PointId,
    /// Left interval boundary.
    pub left_boundary: Boundary,
    /// Right interval boundary.
    pub right_boundary: Boundary,
    /// Alternative tracks proposing coordinates.
    pub tracks: Vec<Track>,
    /// Free comment.
    #[serde(default)]
    pub comment: String,
}

impl Step {
    /// Points this step reads from the exemplar to resolve its interval.
    pub fn boundary_points(&self) -> impl Iterator<Item = PointId> + '_ {
        self.left_boundary
            .point()
            .into_iter()
            .chain(self.right_boundary.point())
    }
}

/// Declared argument, input or output of a catalogue class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    /// Catalogue identifier.
    pub id: DeclId,
    /// Class-side name.
    pub name: String,
    /// Free comment.
    #[serde(default)]
    pub comment: String,
    /// Declared type when the catalogue records one.
    #[serde(default)]
    pub data_type: Option<DataType>,
}

/// Catalogue record describing a strategy class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseClass {
    /// Catalogue identifier.
    pub id: ClassId,
    /// Strategy class name used for registry lookup.
    pub name: String,
    /// Free comment.
    #[serde(default)]
    pub comment: String,
    /// Strategy kind.
    pub kind: PuzzleKind,
    /// Constructor arguments.
    #[serde(default)]
    pub constructor_arguments: Vec<Declaration>,
    /// Points read by the class.
    #[serde(default)]
    pub input_points: Vec<Declaration>,
    /// Parameters read by the class.
    #[serde(default)]
    pub input_params: Vec<Declaration>,
    /// Parameters produced by the class.
    #[serde(default)]
    pub output_params: Vec<Declaration>,
}

/// Literal bound to a constructor argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentValue {
    /// Declared argument.
    pub argument: DeclId,
    /// Textual literal converted at bind time.
    pub value: String,
}

/// Class input point bound to a form point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointBinding {
    /// Declared class input.
    pub input: DeclId,
    /// Form point.
    pub point: PointId,
}

/// Class input or output parameter bound to a form parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamBinding {
    /// Declared class input or output.
    pub slot: DeclId,
    /// Form parameter.
    pub parameter: ParameterId,
}

/// Instantiation of a catalogue class bound to form entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Puzzle {
    /// Catalogue identifier.
    pub id: PuzzleId,
    /// Display name.
    pub name: String,
    /// Free comment.
    #[serde(default)]
    pub comment: String,
    /// Referenced catalogue class.
    pub class_ref: BaseClass,
    /// Constructor argument literals.
    #[serde(default)]
    pub argument_values: Vec<ArgumentValue>,
    /// Input point bindings.
    #[serde(default)]
    pub input_point_values: Vec<PointBinding>,
    /// Input parameter bindings.
    #[serde(default)]
    pub input_param_values: Vec<ParamBinding>,
    /// Output parameter bindings (PC only).
    #[serde(default)]
    pub output_param_values: Vec<ParamBinding>,
    /// Allows outputs to replace parameters already present on an exemplar.
    #[serde(default)]
    pub overwrite: bool,
}

impl Puzzle {
    /// Strategy kind of the referenced class.
    pub fn kind(&self) -> PuzzleKind {
        self.class_ref.kind
    }

    /// Form points read by this puzzle.
    pub fn input_point_ids(&self) -> BTreeSet<PointId> {
        self.input_point_values.iter().map(|b| b.point).collect()
    }

    /// Form parameters read by this puzzle.
    pub fn input_param_ids(&self) -> BTreeSet<ParameterId> {
        self.input_param_values.iter().map(|b| b.parameter).collect()
    }

    /// Form parameters written by this puzzle.
    pub fn output_param_ids(&self) -> BTreeSet<ParameterId> {
        self.output_param_values.iter().map(|b| b.parameter).collect()
    }
}

fn default_complete() -> bool {
    true
}

/// Named declarative template for labelling a signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    /// Catalogue identifier.
    pub id: FormId,
    /// Unique non-empty name.
    pub name: String,
    /// Free comment.
    #[serde(default)]
    pub comment: String,
    /// Points placed by the steps.
    pub points: Vec<Point>,
    /// Parameters computed by the PCs.
    pub parameters: Vec<Parameter>,
    /// Execution plan in order.
    pub steps: Vec<Step>,
    /// Parameter calculators and hard conditions.
    #[serde(default, rename = "hc_pc_objects")]
    pub puzzles: Vec<Puzzle>,
    /// Enforces one step per point when set.
    #[serde(default = "default_complete")]
    pub complete: bool,
}

impl Form {
    /// Looks up a point by id.
    pub fn point(&self, id: PointId) -> Option<&Point> {
        self.points.iter().find(|point| point.id == id)
    }

    /// Looks up a point by name.
    pub fn point_by_name(&self, name: &str) -> Option<&Point> {
        self.points.iter().find(|point| point.name == name)
    }

    /// Looks up a parameter by id.
    pub fn parameter(&self, id: ParameterId) -> Option<&Parameter> {
        self.parameters.iter().find(|param| param.id == id)
    }

    /// Looks up a parameter by name.
    pub fn parameter_by_name(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|param| param.name == name)
    }

    /// Looks up a PC or HC puzzle by id.
    pub fn puzzle(&self, id: PuzzleId) -> Option<&Puzzle> {
        self.puzzles.iter().find(|puzzle| puzzle.id == id)
    }

    /// Parameter calculators in declaration order.
    pub fn pcs(&self) -> impl Iterator<Item = &Puzzle> {
        self.puzzles.iter().filter(|p| p.kind() == PuzzleKind::Pc)
    }

    /// Hard conditions in declaration order.
    pub fn hcs(&self) -> impl Iterator<Item = &Puzzle> {
        self.puzzles.iter().filter(|p| p.kind() == PuzzleKind::Hc)
    }

    /// Every puzzle the form declares, tracks included.
    pub fn all_puzzles(&self) -> impl Iterator<Item = &Puzzle> {
        self.steps
            .iter()
            .flat_map(|step| step.tracks.iter())
            .flat_map(|track| track.sms.iter().chain(track.pss.iter()))
            .chain(self.puzzles.iter())
    }

    /// Name of the point with the given id, or an error naming the form.
    pub fn point_name(&self, id: PointId) -> Result<&str, FormError> {
        self.point(id)
            .map(|point| point.name.as_str())
            .ok_or_else(|| FormError::invalid_form(self.id, format!("unknown point id {id}")))
    }

    /// Checks the structural invariants of the form.
    ///
    /// Dependency level checks (interval references, PC/HC reachability) are
    /// the scheduler's concern.
    pub fn validate(&self) -> Result<(), FormError> {
        let fail = |message: String| Err(FormError::invalid_form(self.id, message));
        if self.name.trim().is_empty() {
            return fail("form name is empty".into());
        }
        if self.points.is_empty() {
            return fail("form declares no points".into());
        }
        if self.parameters.is_empty() {
            return fail("form declares no parameters".into());
        }
        if self.steps.is_empty() {
            return fail("form declares no steps".into());
        }
        let mut names = BTreeSet::new();
        let mut point_ids = BTreeSet::new();
        for point in &self.points {
            if point.name.trim().is_empty() || !names.insert(point.name.as_str()) {
                return fail(format!("point name '{}' is empty or duplicated", point.name));
            }
            if !point_ids.insert(point.id) {
                return fail(format!("point id {} is duplicated", point.id));
            }
        }
        let mut names = BTreeSet::new();
        let mut param_ids = BTreeSet::new();
        for param in &self.parameters {
            if param.name.trim().is_empty() || !names.insert(param.name.as_str()) {
                return fail(format!("parameter name '{}' is empty or duplicated", param.name));
            }
            if !param_ids.insert(param.id) {
                return fail(format!("parameter id {} is duplicated", param.id));
            }
            if !param.data_type.is_scalar() {
                return fail(format!("parameter '{}' has non scalar type", param.name));
            }
        }
        if self.complete && self.steps.len() != self.points.len() {
            return fail(format!(
                "complete form has {} steps for {} points",
                self.steps.len(),
                self.points.len()
            ));
        }
        let mut targets = BTreeSet::new();
        for (idx, step) in self.steps.iter().enumerate() {
            if self.point(step.target_point).is_none() {
                return fail(format!("step {idx} targets unknown point {}", step.target_point));
            }
            if !targets.insert(step.target_point) {
                return fail(format!(
                    "point {} is targeted by more than one step",
                    step.target_point
                ));
            }
            if step.tracks.is_empty() {
                return fail(format!("step {idx} declares no tracks"));
            }
            for track in &step.tracks {
                if !track.is_valid() {
                    return fail(format!("track {} of step {idx} has no point selector", track.id));
                }
                for sm in &track.sms {
                    if sm.kind() != PuzzleKind::Sm {
                        return fail(format!("puzzle {} in SM slot is a {}", sm.id, sm.kind()));
                    }
                }
                for ps in &track.pss {
                    if ps.kind() != PuzzleKind::Ps {
                        return fail(format!("puzzle {} in PS slot is a {}", ps.id, ps.kind()));
                    }
                }
            }
        }
        if self.complete && targets != point_ids {
            return fail("step targets do not cover every point".into());
        }
        let mut puzzle_ids = BTreeSet::new();
        for puzzle in &self.puzzles {
            if !matches!(puzzle.kind(), PuzzleKind::Pc | PuzzleKind::Hc) {
                return fail(format!(
                    "puzzle {} in the PC/HC list is a {}",
                    puzzle.id,
                    puzzle.kind()
                ));
            }
            if !puzzle_ids.insert(puzzle.id) {
                return fail(format!("puzzle id {} is duplicated", puzzle.id));
            }
        }
        Ok(())
    }
}
