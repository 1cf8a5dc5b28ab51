//! Terse builders for catalogue forms.

use form_core::{
    ArgumentValue, Boundary, ClassId, DataType, DeclId, Declaration, Form, FormId, ParamBinding,
    Parameter, ParameterId, Point, PointBinding, PointId, Puzzle, PuzzleId, Step, Track, TrackId,
};
use form_puzzle::{StrategyDescriptor, StrategyLibrary};

/// Incrementally assembles a [`Form`] with unique ids.
pub struct FormBuilder {
    form: Form,
    next_id: u64,
}

impl FormBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            form: Form {
                id: FormId::from_raw(1),
                name: name.to_string(),
                comment: String::new(),
                points: Vec::new(),
                parameters: Vec::new(),
                steps: Vec::new(),
                puzzles: Vec::new(),
                complete: true,
            },
            next_id: 100,
        }
    }

    fn fresh(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn point(&mut self, name: &str) -> PointId {
        let id = PointId::from_raw(self.fresh());
        self.form.points.push(Point {
            id,
            name: name.to_string(),
            comment: String::new(),
        });
        id
    }

    pub fn parameter(&mut self, name: &str, data_type: DataType) -> ParameterId {
        let id = ParameterId::from_raw(self.fresh());
        self.form.parameters.push(Parameter {
            id,
            name: name.to_string(),
            comment: String::new(),
            data_type,
        });
        id
    }

    /// Unbound puzzle of a linked class; panics on unknown names.
    pub fn puzzle(&mut self, library: &StrategyLibrary, class_name: &str) -> PuzzleBuilder {
        let descriptor = library
            .get(class_name)
            .unwrap_or_else(|| panic!("class {class_name} is not linked"))
            .descriptor()
            .clone();
        self.puzzle_from(&descriptor)
    }

    pub fn puzzle_from(&mut self, descriptor: &StrategyDescriptor) -> PuzzleBuilder {
        let id = self.fresh();
        let class_id = self.fresh();
        let first_decl = self.next_id + 1;
        let class_ref = descriptor.to_base_class(ClassId::from_raw(class_id), first_decl);
        self.next_id += (descriptor.arguments.len()
            + descriptor.input_points.len()
            + descriptor.input_params.len()
            + descriptor.outputs.len()) as u64;
        PuzzleBuilder {
            puzzle: Puzzle {
                id: PuzzleId::from_raw(id),
                name: format!("{}#{id}", descriptor.name),
                comment: String::new(),
                class_ref,
                argument_values: Vec::new(),
                input_point_values: Vec::new(),
                input_param_values: Vec::new(),
                output_param_values: Vec::new(),
                overwrite: false,
            },
        }
    }

    pub fn track(&mut self, sms: Vec<Puzzle>, pss: Vec<Puzzle>) -> Track {
        Track {
            id: TrackId::from_raw(self.fresh()),
            sms,
            pss,
        }
    }

    pub fn step(&mut self, target: PointId, left: Boundary, right: Boundary, tracks: Vec<Track>) {
        let num_in_form = self.form.steps.len();
        self.form.steps.push(Step {
            num_in_form,
            target_point: target,
            left_boundary: left,
            right_boundary: right,
            tracks,
            comment: String::new(),
        });
    }

    /// Adds a PC or HC to the form.
    pub fn add(&mut self, puzzle: Puzzle) -> PuzzleId {
        let id = puzzle.id;
        self.form.puzzles.push(puzzle);
        id
    }

    pub fn incomplete(&mut self) {
        self.form.complete = false;
    }

    pub fn build(self) -> Form {
        self.form
    }
}

/// Binds a puzzle's declared slots by class-side name.
pub struct PuzzleBuilder {
    puzzle: Puzzle,
}

impl PuzzleBuilder {
    fn decl(list: &[Declaration], name: &str) -> DeclId {
        list.iter()
            .find(|decl| decl.name == name)
            .unwrap_or_else(|| panic!("slot {name} is not declared"))
            .id
    }

    pub fn id(&self) -> PuzzleId {
        self.puzzle.id
    }

    pub fn arg(mut self, name: &str, literal: &str) -> Self {
        let argument = Self::decl(&self.puzzle.class_ref.constructor_arguments, name);
        self.puzzle.argument_values.push(ArgumentValue {
            argument,
            value: literal.to_string(),
        });
        self
    }

    pub fn point(mut self, name: &str, point: PointId) -> Self {
        let input = Self::decl(&self.puzzle.class_ref.input_points, name);
        self.puzzle
            .input_point_values
            .push(PointBinding { input, point });
        self
    }

    pub fn input(mut self, name: &str, parameter: ParameterId) -> Self {
        let slot = Self::decl(&self.puzzle.class_ref.input_params, name);
        self.puzzle
            .input_param_values
            .push(ParamBinding { slot, parameter });
        self
    }

    pub fn output(mut self, name: &str, parameter: ParameterId) -> Self {
        let slot = Self::decl(&self.puzzle.class_ref.output_params, name);
        self.puzzle
            .output_param_values
            .push(ParamBinding { slot, parameter });
        self
    }

    pub fn overwrite(mut self) -> Self {
        self.puzzle.overwrite = true;
        self
    }

    pub fn build(self) -> Puzzle {
        self.puzzle
    }
}

/// Padding boundaries `[-pad, +pad]` around the runtime centre.
pub fn padding(pad: f64) -> (Boundary, Boundary) {
    (Boundary::Offset(-pad), Boundary::Offset(pad))
}
