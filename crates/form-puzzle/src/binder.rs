//! Binding of catalogue puzzles to form entities and strategy arguments.

use std::collections::{BTreeMap, BTreeSet};

use form_core::errors::{codes, FormError};
use form_core::{
    ArgValue, DataType, DeclId, Declaration, Form, ParameterId, PointId, Puzzle, PuzzleId, PuzzleKind,
};
use indexmap::IndexMap;
use tracing::debug;

use crate::descriptor::{StrategyClass, StrategyDescriptor};
use crate::strategy::StrategyArgs;

/// Form parameter bound to a class output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundOutput {
    /// Form-side parameter name.
    pub name: String,
    /// Declared type of the form parameter.
    pub data_type: DataType,
}

/// Fully resolved bindings of one puzzle.
#[derive(Debug, Clone, PartialEq)]
pub struct PuzzleBinding {
    /// Catalogue id.
    pub puzzle_id: PuzzleId,
    /// Strategy class name.
    pub class_name: String,
    /// Strategy kind.
    pub kind: PuzzleKind,
    /// Class input point name to form point name.
    pub point_names: IndexMap<String, String>,
    /// Class input parameter name to form parameter name.
    pub input_param_names: IndexMap<String, String>,
    /// Class output name to form parameter.
    pub output_params: IndexMap<String, BoundOutput>,
    /// Converted constructor arguments.
    pub arguments: StrategyArgs,
    /// Whether outputs may replace existing parameter values.
    pub overwrite: bool,
}

/// Resolves a puzzle's catalogue bindings against its form and class.
#[derive(Debug)]
pub struct PuzzleBinder<'a> {
    puzzle: &'a Puzzle,
    form: &'a Form,
    descriptor: &'a StrategyDescriptor,
}

impl<'a> PuzzleBinder<'a> {
    /// Creates a binder for `puzzle` owned by `form`.
    pub fn new(puzzle: &'a Puzzle, form: &'a Form, class: &'a StrategyClass) -> Self {
        Self {
            puzzle,
            form,
            descriptor: class.descriptor(),
        }
    }

    fn class_name(&self) -> &str {
        &self.puzzle.class_ref.name
    }

    fn error(&self, code: &str, message: impl Into<String>) -> FormError {
        FormError::run_puzzle(code, self.puzzle.id, self.class_name(), message)
    }

    /// Checks the catalogue class record against the linked class.
    pub fn check_class(&self) -> Result<(), FormError> {
        let class_ref = &self.puzzle.class_ref;
        if class_ref.name != self.descriptor.name {
            return Err(self
                .error(codes::MISMATCH, "catalogue class name differs from linked class")
                .with_context("linked", &self.descriptor.name));
        }
        if class_ref.kind != self.descriptor.kind {
            return Err(self
                .error(codes::MISMATCH, "catalogue kind differs from linked class")
                .with_context("declared", &class_ref.kind.to_string())
                .with_context("linked", &self.descriptor.kind.to_string()));
        }
        let linked_args: Vec<&str> = self.descriptor.arguments.iter().map(|a| a.name.as_str()).collect();
        let linked_outputs: Vec<&str> = self.descriptor.outputs.iter().map(|o| o.name.as_str()).collect();
        let linked_points: Vec<&str> = self.descriptor.input_points.iter().map(String::as_str).collect();
        let linked_params: Vec<&str> = self.descriptor.input_params.iter().map(String::as_str).collect();
        let sections: [(&str, &[Declaration], Vec<&str>); 4] = [
            ("constructor_arguments", &class_ref.constructor_arguments, linked_args),
            ("input_points", &class_ref.input_points, linked_points),
            ("input_params", &class_ref.input_params, linked_params),
            ("output_params", &class_ref.output_params, linked_outputs),
        ];
        for (section, declared, linked) in sections {
            let declared: BTreeSet<&str> = declared.iter().map(|d| d.name.as_str()).collect();
            let linked: BTreeSet<&str> = linked.into_iter().collect();
            if declared != linked {
                let missing_on_class: Vec<&str> = declared.difference(&linked).copied().collect();
                let missing_in_catalogue: Vec<&str> = linked.difference(&declared).copied().collect();
                return Err(self
                    .error(codes::MISMATCH, format!("{section} differ between catalogue and class"))
                    .with_names("missing_on_class", &missing_on_class)
                    .with_names("missing_in_catalogue", &missing_in_catalogue));
            }
        }
        for declared in &class_ref.constructor_arguments {
            if let (Some(declared_type), Some(linked)) =
                (&declared.data_type, self.descriptor.argument_decl(&declared.name))
            {
                if *declared_type != linked.data_type {
                    return Err(self
                        .error(codes::MISMATCH, "argument type differs from linked class")
                        .with_context("argument", &declared.name));
                }
            }
        }
        Ok(())
    }

    /// Class-side input point names to form point names.
    pub fn map_point_names(&self) -> Result<IndexMap<String, String>, FormError> {
        let bindings: Vec<(DeclId, u64)> = self
            .puzzle
            .input_point_values
            .iter()
            .map(|b| (b.input, b.point.as_raw()))
            .collect();
        self.map_names(
            codes::POINTS_MAPPING,
            &self.puzzle.class_ref.input_points,
            &bindings,
            |raw| {
                self.form
                    .point(PointId::from_raw(raw))
                    .map(|p| p.name.clone())
            },
        )
    }

    /// Class-side input parameter names to form parameter names.
    pub fn map_input_params_names(&self) -> Result<IndexMap<String, String>, FormError> {
        let bindings: Vec<(DeclId, u64)> = self
            .puzzle
            .input_param_values
            .iter()
            .map(|b| (b.slot, b.parameter.as_raw()))
            .collect();
        self.map_names(
            codes::PARAMS_MAPPING,
            &self.puzzle.class_ref.input_params,
            &bindings,
            |raw| {
                self.form
                    .parameter(ParameterId::from_raw(raw))
                    .map(|p| p.name.clone())
            },
        )
    }

    /// Class-side output names to form parameter names (PC only).
    pub fn map_output_params_names(&self) -> Result<IndexMap<String, String>, FormError> {
        if self.puzzle.kind() != PuzzleKind::Pc {
            if !self.puzzle.output_param_values.is_empty() {
                return Err(self.error(codes::PARAMS_MAPPING, "only parameter calculators bind outputs"));
            }
            return Ok(IndexMap::new());
        }
        let bindings: Vec<(DeclId, u64)> = self
            .puzzle
            .output_param_values
            .iter()
            .map(|b| (b.slot, b.parameter.as_raw()))
            .collect();
        self.map_names(
            codes::PARAMS_MAPPING,
            &self.puzzle.class_ref.output_params,
            &bindings,
            |raw| {
                self.form
                    .parameter(ParameterId::from_raw(raw))
                    .map(|p| p.name.clone())
            },
        )
    }

    fn map_names(
        &self,
        code: &str,
        declared: &[Declaration],
        bindings: &[(DeclId, u64)],
        resolve: impl Fn(u64) -> Option<String>,
    ) -> Result<IndexMap<String, String>, FormError> {
        if bindings.len() != declared.len() {
            return Err(self
                .error(code, "binding count differs from class declaration")
                .with_context("declared", &declared.len().to_string())
                .with_context("bound", &bindings.len().to_string()));
        }
        let mut names = BTreeSet::new();
        for decl in declared {
            if !names.insert(decl.name.as_str()) {
                return Err(self
                    .error(code, "class declares the same name twice")
                    .with_context("name", &decl.name));
            }
        }
        let mut bound: BTreeMap<DeclId, u64> = BTreeMap::new();
        for (slot, target) in bindings {
            if !declared.iter().any(|decl| decl.id == *slot) {
                return Err(self
                    .error(code, "binding references an undeclared class slot")
                    .with_context("slot", &slot.to_string()));
            }
            if bound.insert(*slot, *target).is_some() {
                return Err(self
                    .error(code, "class slot is bound more than once")
                    .with_context("slot", &slot.to_string()));
            }
        }
        let mut mapping = IndexMap::new();
        for decl in declared {
            let target = bound.get(&decl.id).ok_or_else(|| {
                self.error(code, "class slot is not bound")
                    .with_context("name", &decl.name)
            })?;
            let form_name = resolve(*target).ok_or_else(|| {
                self.error(code, "bound form entity does not exist")
                    .with_context("name", &decl.name)
                    .with_context("target", &target.to_string())
            })?;
            mapping.insert(decl.name.clone(), form_name);
        }
        Ok(mapping)
    }

    /// Converts the bound literal of every declared argument.
    ///
    /// Unbound arguments take the linked class default; more than one bound
    /// literal for the same argument is a mismatch.
    pub fn get_constructor_arguments(&self) -> Result<StrategyArgs, FormError> {
        let declared = &self.puzzle.class_ref.constructor_arguments;
        for value in &self.puzzle.argument_values {
            if !declared.iter().any(|decl| decl.id == value.argument) {
                return Err(self
                    .error(codes::MISMATCH, "literal bound to an undeclared argument")
                    .with_context("argument_id", &value.argument.to_string()));
            }
        }
        let mut args = StrategyArgs::new();
        for decl in declared {
            let linked = self.descriptor.argument_decl(&decl.name).ok_or_else(|| {
                self.error(codes::MISMATCH, "argument is not declared by the class")
                    .with_context("argument", &decl.name)
            })?;
            let literals: Vec<&str> = self
                .puzzle
                .argument_values
                .iter()
                .filter(|value| value.argument == decl.id)
                .map(|value| value.value.as_str())
                .collect();
            let value = match literals.as_slice() {
                [] => linked.default.clone(),
                [literal] => {
                    let data_type = decl.data_type.as_ref().unwrap_or(&linked.data_type);
                    ArgValue::convert(literal, data_type).map_err(|err| {
                        err.with_context("puzzle_id", &self.puzzle.id.to_string())
                            .with_context("argument", &decl.name)
                    })?
                }
                _ => {
                    return Err(self
                        .error(codes::MISMATCH, "argument is bound more than once")
                        .with_context("argument", &decl.name))
                }
            };
            args.insert(decl.name.clone(), value);
        }
        Ok(args)
    }

    /// Runs every check and mapping.
    pub fn bind(&self) -> Result<PuzzleBinding, FormError> {
        self.check_class()?;
        let point_names = self.map_point_names()?;
        let input_param_names = self.map_input_params_names()?;
        let output_names = self.map_output_params_names()?;
        let mut output_params = IndexMap::new();
        for (class_name, form_name) in output_names {
            let data_type = self
                .form
                .parameter_by_name(&form_name)
                .map(|param| param.data_type.clone())
                .ok_or_else(|| self.error(codes::PARAMS_MAPPING, "output parameter vanished"))?;
            output_params.insert(
                class_name,
                BoundOutput {
                    name: form_name,
                    data_type,
                },
            );
        }
        let arguments = self.get_constructor_arguments()?;
        debug!(
            puzzle_id = %self.puzzle.id,
            class = self.class_name(),
            arguments = arguments.len(),
            "puzzle bound"
        );
        Ok(PuzzleBinding {
            puzzle_id: self.puzzle.id,
            class_name: self.class_name().to_string(),
            kind: self.puzzle.kind(),
            point_names,
            input_param_names,
            output_params,
            arguments,
            overwrite: self.puzzle.overwrite,
        })
    }
}
