#![deny(missing_docs)]
#![doc = "Runs forms over signals: track, step and form runners, post-fit parametrisation and labelled datasets."]

pub mod config;
pub mod dataset;
pub mod form;
pub mod parametrise;
pub mod step;
pub mod telemetry;
pub mod track;

pub use config::EngineConfig;
pub use dataset::{LabelledDataset, LabelledRecord, ParametersFrame, RecordKey, SkippedRecord, ViolationsFrame};
pub use form::{numeric_parameters, FormRun, FormRunner, RunSummary};
pub use parametrise::Parametriser;
pub use step::{ExemplarIds, StepReport, StepRunner};
pub use telemetry::init_tracing;
pub use track::TrackRunner;
