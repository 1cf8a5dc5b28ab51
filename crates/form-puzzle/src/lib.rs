#![deny(missing_docs)]
#![doc = "Strategy contract, registry, puzzle binder and runnable wrappers for the form engine."]

pub mod binder;
pub mod descriptor;
pub mod manifest;
pub mod registry;
pub mod runnable;
pub mod strategy;

pub use binder::{BoundOutput, PuzzleBinder, PuzzleBinding};
pub use descriptor::{ArgumentDecl, OutputDecl, StrategyClass, StrategyDescriptor};
pub use manifest::{load_manifest, StrategyManifest};
pub use registry::{RegistryEntry, StrategyLibrary, StrategyRegistry};
pub use runnable::{
    dedup_by_coordinate, dedup_coordinates, PuzzleOutcome, RunnableHc, RunnablePc, RunnablePs,
    RunnablePuzzle, RunnableSm,
};
pub use strategy::{
    HardCondition, ParameterCalculator, PointSelector, PuzzleInputs, SignalModifier, StrategyArgs,
    StrategyError, StrategyInstance,
};
