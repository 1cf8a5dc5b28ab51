//! Compiled schedule of a form and its queries.

use std::collections::BTreeSet;

use form_core::errors::{codes, ErrorInfo, FormError};
use form_core::{stable_hash_string, Form, FormId, PointId, PuzzleId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::{analyse, SchemaReport, StepPlan};

fn join_ids<T: ToString>(ids: &[T]) -> String {
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
}

/// Checks that every boundary point is placed by a strictly earlier step.
pub fn validate_boundaries(form: &Form) -> Result<(), FormError> {
    let mut placed: BTreeSet<PointId> = BTreeSet::new();
    for (idx, step) in form.steps.iter().enumerate() {
        for point in step.boundary_points() {
            if form.point(point).is_none() {
                return Err(FormError::invalid_interval(
                    form.id,
                    Some(idx),
                    format!("boundary references unknown point {point}"),
                ));
            }
            if !placed.contains(&point) {
                return Err(FormError::invalid_interval(
                    form.id,
                    Some(idx),
                    format!("boundary point {point} is not placed by an earlier step"),
                ));
            }
        }
        placed.insert(step.target_point);
    }
    Ok(())
}

/// Per-step execution plan of a form in which every PC and HC is scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    form_id: FormId,
    report: SchemaReport,
}

impl Schema {
    /// Diagnostics without failing; see [`analyse`].
    pub fn analyse(form: &Form) -> SchemaReport {
        analyse(form)
    }

    /// Validates the form and schedules every PC and HC.
    ///
    /// Fails with [`FormError::Form`] on structural problems and with
    /// [`FormError::Schema`] when some puzzle cannot be scheduled; the
    /// context of the latter lists the blockers and any cycles among them.
    pub fn compile(form: &Form) -> Result<Self, FormError> {
        form.validate()?;
        validate_boundaries(form)?;
        let report = analyse(form);
        if !report.is_complete() {
            let cycles = report
                .cycles
                .iter()
                .map(|group| format!("[{}]", join_ids(group)))
                .collect::<Vec<_>>()
                .join(" ");
            let mut info = ErrorInfo::new(codes::SCHEMA_BLOCKED, "some puzzles can never be scheduled")
                .with_context("form_id", form.id.to_string())
                .with_context("unscheduled_pcs", join_ids(&report.unscheduled_pcs))
                .with_context("unscheduled_hcs", join_ids(&report.unscheduled_hcs));
            if !cycles.is_empty() {
                info = info
                    .with_context("cycles", cycles)
                    .with_hint("break the cycle by letting a step place the point or one PC produce the parameter");
            }
            return Err(FormError::Schema(info));
        }
        debug!(
            form_id = %form.id,
            steps = report.steps.len(),
            pcs = report.steps.iter().map(|s| s.pcs.len()).sum::<usize>(),
            hcs = report.steps.iter().map(|s| s.hcs.len()).sum::<usize>(),
            "schema compiled"
        );
        Ok(Self {
            form_id: form.id,
            report,
        })
    }

    /// Form the schema was compiled from.
    pub fn form_id(&self) -> FormId {
        self.form_id
    }

    /// Full diagnostics.
    pub fn report(&self) -> &SchemaReport {
        &self.report
    }

    /// Plan of every step in order.
    pub fn steps(&self) -> &[StepPlan] {
        &self.report.steps
    }

    /// Plan of step `n`.
    pub fn step(&self, n: usize) -> Option<&StepPlan> {
        self.report.steps.get(n)
    }

    /// PCs invoked after step `n` places its point; empty for unknown steps.
    pub fn pcs_by_step(&self, n: usize) -> &[PuzzleId] {
        self.step(n).map(|plan| plan.pcs.as_slice()).unwrap_or(&[])
    }

    /// HCs checked after step `n`; empty for unknown steps.
    pub fn hcs_by_step(&self, n: usize) -> &[PuzzleId] {
        self.step(n).map(|plan| plan.hcs.as_slice()).unwrap_or(&[])
    }

    /// Points a parent must carry before step `n` can resolve its interval.
    pub fn required_points_of_step(&self, n: usize) -> &[PointId] {
        self.step(n)
            .map(|plan| plan.boundary_points.as_slice())
            .unwrap_or(&[])
    }

    /// Every PC in dependency order.
    pub fn pc_order(&self) -> Vec<PuzzleId> {
        self.report
            .steps
            .iter()
            .flat_map(|plan| plan.pcs.iter().copied())
            .collect()
    }

    /// Every HC in step order.
    pub fn hc_order(&self) -> Vec<PuzzleId> {
        self.report
            .steps
            .iter()
            .flat_map(|plan| plan.hcs.iter().copied())
            .collect()
    }

    /// Content hash of the schedule and diagnostics.
    pub fn fingerprint(&self) -> Result<String, FormError> {
        stable_hash_string(self)
    }
}
