//! Knowledge accumulated while walking the steps of a form.

use std::collections::BTreeSet;

use form_core::{ParameterId, PointId, Puzzle, PuzzleId};
use serde::{Deserialize, Serialize};

/// Points and parameters known so far plus the puzzles already scheduled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    known_points: BTreeSet<PointId>,
    known_params: BTreeSet<ParameterId>,
    scheduled_pcs: BTreeSet<PuzzleId>,
    scheduled_hcs: BTreeSet<PuzzleId>,
}

impl Context {
    /// Empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a point as placed.
    pub fn add_point(&mut self, point: PointId) {
        self.known_points.insert(point);
    }

    /// Marks parameters as produced.
    pub fn add_params(&mut self, params: impl IntoIterator<Item = ParameterId>) {
        self.known_params.extend(params);
    }

    /// Points placed so far.
    pub fn known_points(&self) -> &BTreeSet<PointId> {
        &self.known_points
    }

    /// Parameters produced so far.
    pub fn known_params(&self) -> &BTreeSet<ParameterId> {
        &self.known_params
    }

    /// Whether every input of `puzzle` is known.
    pub fn is_ready(&self, puzzle: &Puzzle) -> bool {
        puzzle.input_point_ids().is_subset(&self.known_points)
            && puzzle.input_param_ids().is_subset(&self.known_params)
    }

    /// Whether the PC has been scheduled.
    pub fn is_pc_scheduled(&self, id: PuzzleId) -> bool {
        self.scheduled_pcs.contains(&id)
    }

    /// Whether the HC has been scheduled.
    pub fn is_hc_scheduled(&self, id: PuzzleId) -> bool {
        self.scheduled_hcs.contains(&id)
    }

    /// Records a scheduled PC; its outputs become known.
    pub fn schedule_pc(&mut self, puzzle: &Puzzle) {
        self.scheduled_pcs.insert(puzzle.id);
        self.add_params(puzzle.output_param_ids());
    }

    /// Records a scheduled HC.
    pub fn schedule_hc(&mut self, id: PuzzleId) {
        self.scheduled_hcs.insert(id);
    }

    /// PCs scheduled so far.
    pub fn scheduled_pcs(&self) -> &BTreeSet<PuzzleId> {
        &self.scheduled_pcs
    }

    /// HCs scheduled so far.
    pub fn scheduled_hcs(&self) -> &BTreeSet<PuzzleId> {
        &self.scheduled_hcs
    }
}
