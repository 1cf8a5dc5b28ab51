//! Static description of a strategy class and its factory.

use std::fmt;
use std::sync::Arc;

use form_core::{ArgValue, BaseClass, ClassId, DataType, DeclId, Declaration, PuzzleKind};
use serde::{Deserialize, Serialize};

use crate::strategy::{StrategyArgs, StrategyError, StrategyInstance};

/// Typed constructor argument with its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentDecl {
    /// Argument name.
    pub name: String,
    /// Declared type.
    pub data_type: DataType,
    /// Value used when the catalogue binds none.
    pub default: ArgValue,
}

/// Declared output of a parameter calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputDecl {
    /// Output name.
    pub name: String,
    /// Declared type.
    pub data_type: DataType,
    /// Short description.
    pub doc: String,
}

/// Introspectable contract of a strategy class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyDescriptor {
    /// Class name referenced by the catalogue.
    pub name: String,
    /// Strategy kind.
    pub kind: PuzzleKind,
    /// Constructor arguments.
    pub arguments: Vec<ArgumentDecl>,
    /// Input points read by the strategy.
    pub input_points: Vec<String>,
    /// Input parameters read by the strategy.
    pub input_params: Vec<String>,
    /// Output schema (parameter calculators only).
    pub outputs: Vec<OutputDecl>,
}

impl StrategyDescriptor {
    /// Starts a descriptor with no arguments, inputs or outputs.
    pub fn new(name: impl Into<String>, kind: PuzzleKind) -> Self {
        Self {
            name: name.into(),
            kind,
            arguments: Vec::new(),
            input_points: Vec::new(),
            input_params: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Declares a constructor argument.
    pub fn argument(mut self, name: impl Into<String>, data_type: DataType, default: ArgValue) -> Self {
        self.arguments.push(ArgumentDecl {
            name: name.into(),
            data_type,
            default,
        });
        self
    }

    /// Declares an input point.
    pub fn input_point(mut self, name: impl Into<String>) -> Self {
        self.input_points.push(name.into());
        self
    }

    /// Declares an input parameter.
    pub fn input_param(mut self, name: impl Into<String>) -> Self {
        self.input_params.push(name.into());
        self
    }

    /// Declares an output.
    pub fn output(mut self, name: impl Into<String>, data_type: DataType, doc: impl Into<String>) -> Self {
        self.outputs.push(OutputDecl {
            name: name.into(),
            data_type,
            doc: doc.into(),
        });
        self
    }

    /// Looks up a constructor argument.
    pub fn argument_decl(&self, name: &str) -> Option<&ArgumentDecl> {
        self.arguments.iter().find(|arg| arg.name == name)
    }

    /// Looks up an output.
    pub fn output_decl(&self, name: &str) -> Option<&OutputDecl> {
        self.outputs.iter().find(|out| out.name == name)
    }

    /// Catalogue record isomorphic to this descriptor.
    ///
    /// Declarations receive consecutive ids starting at `first_decl`, in the
    /// order arguments, input points, input params, outputs.
    pub fn to_base_class(&self, id: ClassId, first_decl: u64) -> BaseClass {
        let mut next = first_decl;
        let mut decl = |name: &str, data_type: Option<DataType>| {
            let declaration = Declaration {
                id: DeclId::from_raw(next),
                name: name.to_string(),
                comment: String::new(),
                data_type,
            };
            next += 1;
            declaration
        };
        let constructor_arguments = self
            .arguments
            .iter()
            .map(|arg| decl(&arg.name, Some(arg.data_type.clone())))
            .collect();
        let input_points = self.input_points.iter().map(|name| decl(name, None)).collect();
        let input_params = self.input_params.iter().map(|name| decl(name, None)).collect();
        let output_params = self
            .outputs
            .iter()
            .map(|out| decl(&out.name, Some(out.data_type.clone())))
            .collect();
        BaseClass {
            id,
            name: self.name.clone(),
            comment: String::new(),
            kind: self.kind,
            constructor_arguments,
            input_points,
            input_params,
            output_params,
        }
    }
}

type Factory = dyn Fn(&StrategyArgs) -> Result<StrategyInstance, StrategyError> + Send + Sync;

/// Strategy class linked into the process: descriptor plus constructor.
#[derive(Clone)]
pub struct StrategyClass {
    descriptor: StrategyDescriptor,
    factory: Arc<Factory>,
}

impl StrategyClass {
    /// Pairs a descriptor with its constructor.
    pub fn new<F>(descriptor: StrategyDescriptor, factory: F) -> Self
    where
        F: Fn(&StrategyArgs) -> Result<StrategyInstance, StrategyError> + Send + Sync + 'static,
    {
        Self {
            descriptor,
            factory: Arc::new(factory),
        }
    }

    /// Class name.
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Strategy kind.
    pub fn kind(&self) -> PuzzleKind {
        self.descriptor.kind
    }

    /// Declared contract.
    pub fn descriptor(&self) -> &StrategyDescriptor {
        &self.descriptor
    }

    /// Constructs an instance from converted arguments.
    pub fn instantiate(&self, args: &StrategyArgs) -> Result<StrategyInstance, StrategyError> {
        (self.factory)(args)
    }
}

impl fmt::Debug for StrategyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyClass")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}
