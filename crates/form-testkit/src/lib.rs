//! Testing utilities for the form engine workspace.
//!
//! Reference strategies, deterministic generators and form builders.

#![allow(missing_docs)]

pub mod forms;
pub mod scenarios;
pub mod signals;
pub mod strategies;

pub use forms::{padding, FormBuilder, PuzzleBuilder};
pub use scenarios::{single_peak, single_peak_with_threshold, staircase, SinglePeak};
pub use signals::{normal_samples, single_peak as single_peak_signal, sine};
pub use strategies::{reference_classes, reference_library};
