#![deny(missing_docs)]
#![doc = "Per-step scheduling of parameter calculators and hard conditions for forms."]

mod analysis;
mod context;
mod cycles;
mod schema;

pub use analysis::{analyse, SchemaReport, StepPlan};
pub use context::Context;
pub use cycles::blocked_cycles;
pub use schema::{validate_boundaries, Schema};
