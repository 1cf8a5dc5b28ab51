//! Fixpoint scheduling and the diagnostics that accompany it.

use std::collections::BTreeSet;

use form_core::{Form, ParameterId, PointId, Puzzle, PuzzleId};
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::cycles::blocked_cycles;

/// Work assigned to one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepPlan {
    /// Position of the step in the form.
    pub num_in_form: usize,
    /// Point placed by the step.
    pub target_point: PointId,
    /// Points a parent must already carry for the interval to resolve.
    pub boundary_points: Vec<PointId>,
    /// PCs invoked on every child, in invocation order.
    pub pcs: Vec<PuzzleId>,
    /// HCs checked on every child, by id.
    pub hcs: Vec<PuzzleId>,
}

/// Outcome of scheduling a form, including blockers and unused entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaReport {
    /// Per-step schedule.
    pub steps: Vec<StepPlan>,
    /// PCs no step could schedule.
    pub unscheduled_pcs: Vec<PuzzleId>,
    /// HCs no step could schedule.
    pub unscheduled_hcs: Vec<PuzzleId>,
    /// Points no step targets.
    pub unplaced_points: Vec<PointId>,
    /// Points never read by an interval or a puzzle.
    pub unreferenced_points: Vec<PointId>,
    /// Parameters no PC produces.
    pub unproduced_params: Vec<ParameterId>,
    /// PCs whose outputs nothing reads.
    pub unconsumed_pcs: Vec<PuzzleId>,
    /// Strongly connected groups of blocked PCs feeding each other.
    pub cycles: Vec<Vec<PuzzleId>>,
}

impl SchemaReport {
    /// Whether every PC and HC found a step.
    pub fn is_complete(&self) -> bool {
        self.unscheduled_pcs.is_empty() && self.unscheduled_hcs.is_empty()
    }
}

fn sorted_by_id<'a>(puzzles: impl Iterator<Item = &'a Puzzle>) -> Vec<&'a Puzzle> {
    let mut list: Vec<&Puzzle> = puzzles.collect();
    list.sort_by_key(|puzzle| puzzle.id);
    list
}

/// Schedules the form's PCs and HCs step by step.
///
/// Never fails: problems are reported in the returned [`SchemaReport`].
pub fn analyse(form: &Form) -> SchemaReport {
    let pcs = sorted_by_id(form.pcs());
    let hcs = sorted_by_id(form.hcs());
    let mut ctx = Context::new();
    let mut steps = Vec::with_capacity(form.steps.len());

    for step in &form.steps {
        ctx.add_point(step.target_point);
        let boundary_points: Vec<PointId> = step.boundary_points().collect();
        for point in &boundary_points {
            ctx.add_point(*point);
        }
        let mut plan = StepPlan {
            num_in_form: step.num_in_form,
            target_point: step.target_point,
            boundary_points,
            pcs: Vec::new(),
            hcs: Vec::new(),
        };
        loop {
            let ready: Vec<&Puzzle> = pcs
                .iter()
                .copied()
                .filter(|pc| !ctx.is_pc_scheduled(pc.id) && ctx.is_ready(pc))
                .collect();
            for pc in &ready {
                ctx.schedule_pc(pc);
                plan.pcs.push(pc.id);
            }
            let checkable: Vec<PuzzleId> = hcs
                .iter()
                .filter(|hc| !ctx.is_hc_scheduled(hc.id) && ctx.is_ready(hc))
                .map(|hc| hc.id)
                .collect();
            for id in &checkable {
                ctx.schedule_hc(*id);
                plan.hcs.push(*id);
            }
            if ready.is_empty() && checkable.is_empty() {
                break;
            }
        }
        plan.hcs.sort();
        steps.push(plan);
    }

    let unscheduled_pcs: Vec<PuzzleId> = pcs
        .iter()
        .filter(|pc| !ctx.is_pc_scheduled(pc.id))
        .map(|pc| pc.id)
        .collect();
    let unscheduled_hcs: Vec<PuzzleId> = hcs
        .iter()
        .filter(|hc| !ctx.is_hc_scheduled(hc.id))
        .map(|hc| hc.id)
        .collect();

    let targets: BTreeSet<PointId> = form.steps.iter().map(|step| step.target_point).collect();
    let unplaced_points = form
        .points
        .iter()
        .map(|point| point.id)
        .filter(|id| !targets.contains(id))
        .collect();

    let mut referenced: BTreeSet<PointId> = form
        .steps
        .iter()
        .flat_map(|step| step.boundary_points())
        .collect();
    for puzzle in form.all_puzzles() {
        referenced.extend(puzzle.input_point_ids());
    }
    let unreferenced_points = form
        .points
        .iter()
        .map(|point| point.id)
        .filter(|id| !referenced.contains(id))
        .collect();

    let produced: BTreeSet<ParameterId> = pcs.iter().flat_map(|pc| pc.output_param_ids()).collect();
    let unproduced_params = form
        .parameters
        .iter()
        .map(|param| param.id)
        .filter(|id| !produced.contains(id))
        .collect();

    let consumed: BTreeSet<ParameterId> = form
        .puzzles
        .iter()
        .flat_map(|puzzle| puzzle.input_param_ids())
        .collect();
    let unconsumed_pcs = pcs
        .iter()
        .filter(|pc| pc.output_param_ids().is_disjoint(&consumed))
        .map(|pc| pc.id)
        .collect();

    let blocked: Vec<&Puzzle> = pcs
        .iter()
        .copied()
        .filter(|pc| unscheduled_pcs.contains(&pc.id))
        .collect();
    let cycles = blocked_cycles(&blocked);

    SchemaReport {
        steps,
        unscheduled_pcs,
        unscheduled_hcs,
        unplaced_points,
        unreferenced_points,
        unproduced_params,
        unconsumed_pcs,
        cycles,
    }
}
