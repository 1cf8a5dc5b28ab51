//! Extends each parent exemplar by one step's target point.

use std::collections::BTreeMap;

use form_core::errors::{codes, FormError};
use form_core::{Boundary, Exemplar, ExemplarId, Form, PuzzleId, Step, TrackId};
use form_eval::Evaluator;
use form_puzzle::{dedup_by_coordinate, PuzzleOutcome, RunnableHc, RunnablePc, StrategyRegistry};
use form_schema::Schema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::track::TrackRunner;

/// Per-run exemplar id counter.
#[derive(Debug, Clone, Default)]
pub struct ExemplarIds {
    next: u64,
}

impl ExemplarIds {
    /// Hands out the next id.
    pub fn next_id(&mut self) -> ExemplarId {
        let id = ExemplarId::from_raw(self.next);
        self.next += 1;
        id
    }
}

/// Counters of one step over all its parents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    /// Position of the step in the form.
    pub step_num: usize,
    /// Parents extended.
    pub parents: usize,
    /// Deduplicated coordinates proposed by the tracks.
    pub candidates: usize,
    /// Children that survived puzzles and scoring.
    pub children: usize,
    /// Children left unscored because the evaluator lacked parameters.
    pub unscored: usize,
    /// Children evicted by the bounded pool.
    pub evicted: usize,
    /// Candidate-local failures keyed by error code.
    pub killed: BTreeMap<String, usize>,
}

impl StepReport {
    fn new(step_num: usize) -> Self {
        Self {
            step_num,
            ..Self::default()
        }
    }

    fn kill(&mut self, reason: &str) {
        *self.killed.entry(reason.to_string()).or_insert(0) += 1;
    }

    /// Total candidate-local failures.
    pub fn total_killed(&self) -> usize {
        self.killed.values().sum()
    }

    /// Failures recorded under `code`.
    pub fn killed_by(&self, code: &str) -> usize {
        self.killed.get(code).copied().unwrap_or(0)
    }
}

/// Side of the step interval.
#[derive(Debug, Clone, Copy)]
enum Side {
    Left,
    Right,
}

/// One bound step: tracks plus the PCs and HCs scheduled for it.
#[derive(Debug)]
pub struct StepRunner {
    num: usize,
    target: String,
    left: (Boundary, Option<String>),
    right: (Boundary, Option<String>),
    tracks: Vec<TrackRunner>,
    pcs: Vec<RunnablePc>,
    hcs: Vec<RunnableHc>,
    epsilon: f64,
}

pub(crate) fn bind_pc(form: &Form, registry: &StrategyRegistry, id: PuzzleId) -> Result<RunnablePc, FormError> {
    let puzzle = form
        .puzzle(id)
        .ok_or_else(|| FormError::invalid_form(form.id, "scheduled puzzle is not in the form").with_context("puzzle_id", id.to_string()))?;
    RunnablePc::new(puzzle, form, &*registry.get(&puzzle.class_ref.name)?)
}

pub(crate) fn bind_hc(form: &Form, registry: &StrategyRegistry, id: PuzzleId) -> Result<RunnableHc, FormError> {
    let puzzle = form
        .puzzle(id)
        .ok_or_else(|| FormError::invalid_form(form.id, "scheduled puzzle is not in the form").with_context("puzzle_id", id.to_string()))?;
    RunnableHc::new(puzzle, form, &*registry.get(&puzzle.class_ref.name)?)
}

impl StepRunner {
    /// Binds the step's tracks and its scheduled puzzles.
    ///
    /// `position` is the step's index in `form.steps`; the schema is keyed
    /// by it, whatever `num_in_form` the catalogue declares.
    pub fn new(
        position: usize,
        step: &Step,
        form: &Form,
        registry: &StrategyRegistry,
        schema: &Schema,
        epsilon: f64,
    ) -> Result<Self, FormError> {
        let num = position;
        if step.tracks.is_empty() {
            return Err(FormError::run_step(codes::NO_TRACKS, num, "step has no tracks"));
        }
        let target = form
            .point(step.target_point)
            .map(|point| point.name.clone())
            .ok_or_else(|| {
                FormError::run_step(codes::INVALID_TARGET, num, "target point is not in the form")
                    .with_context("point_id", step.target_point.to_string())
            })?;
        let side = |boundary: Boundary| -> Result<(Boundary, Option<String>), FormError> {
            let name = match boundary.point() {
                Some(id) => Some(form.point_name(id)?.to_string()),
                None => None,
            };
            Ok((boundary, name))
        };
        let tracks = step
            .tracks
            .iter()
            .map(|track| TrackRunner::new(track, form, registry))
            .collect::<Result<Vec<_>, _>>()?;
        let pcs = schema
            .pcs_by_step(num)
            .iter()
            .map(|id| bind_pc(form, registry, *id))
            .collect::<Result<Vec<_>, _>>()?;
        let hcs = schema
            .hcs_by_step(num)
            .iter()
            .map(|id| bind_hc(form, registry, *id))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            num,
            target,
            left: side(step.left_boundary)?,
            right: side(step.right_boundary)?,
            tracks,
            pcs,
            hcs,
            epsilon,
        })
    }

    /// Position of the step in the form.
    pub fn num(&self) -> usize {
        self.num
    }

    /// Name of the point this step places.
    pub fn target(&self) -> &str {
        &self.target
    }

    fn invalid_interval(&self, message: &str) -> FormError {
        FormError::run_track(codes::TRACK_INVALID_INTERVAL, "-", message).with_context("step_num", self.num.to_string())
    }

    fn placed(&self, parent: &Exemplar, side: Side) -> Result<Option<f64>, FormError> {
        let (_, name) = match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        };
        match name {
            Some(name) => parent
                .point(name)
                .map(Some)
                .ok_or_else(|| self.invalid_interval("boundary point is not placed").with_context("point", name.as_str())),
            None => Ok(None),
        }
    }

    /// Resolves `[t_left, t_right]` for `parent`.
    ///
    /// An offset side is anchored on the opposite point; with offsets on both
    /// sides the anchor is `centre`.
    pub fn resolve_interval(&self, parent: &Exemplar, centre: Option<f64>) -> Result<(f64, f64), FormError> {
        let left_point = self.placed(parent, Side::Left)?;
        let right_point = self.placed(parent, Side::Right)?;
        let (t_left, t_right) = match (self.left.0, self.right.0, left_point, right_point) {
            (Boundary::Point(_), Boundary::Point(_), Some(l), Some(r)) => (l, r),
            (Boundary::Point(_), Boundary::Offset(dr), Some(l), None) => (l, l + dr),
            (Boundary::Offset(dl), Boundary::Point(_), None, Some(r)) => (r + dl, r),
            (Boundary::Offset(dl), Boundary::Offset(dr), None, None) => {
                let centre = centre.ok_or_else(|| self.invalid_interval("no runtime centre for offset boundaries"))?;
                (centre + dl, centre + dr)
            }
            _ => return Err(self.invalid_interval("boundary did not resolve")),
        };
        if !(t_left.is_finite() && t_right.is_finite()) || t_left >= t_right {
            return Err(self
                .invalid_interval("interval is empty")
                .with_context("interval", format!("[{t_left}, {t_right}]")));
        }
        Ok((t_left, t_right))
    }

    /// Extends `parent` into scored children.
    ///
    /// Candidate-local failures are counted in `report` and drop only the
    /// affected track or child; anything else is returned.
    pub fn run(
        &self,
        parent: &Exemplar,
        centre: Option<f64>,
        ids: &mut ExemplarIds,
        evaluator: Option<&dyn Evaluator>,
        report: &mut StepReport,
    ) -> Result<Vec<Exemplar>, FormError> {
        report.parents += 1;
        let (t_left, t_right) = match self.resolve_interval(parent, centre) {
            Ok(interval) => interval,
            Err(err) => return absorb(err, report).map(|_| Vec::new()),
        };

        let mut proposals: Vec<(f64, TrackId)> = Vec::new();
        for track in &self.tracks {
            match track.run(parent, t_left, t_right, self.epsilon) {
                Ok(PuzzleOutcome::Done(coords)) => proposals.extend(coords.into_iter().map(|t| (t, track.id()))),
                Ok(PuzzleOutcome::OutOfSignal { .. }) => report.kill(codes::OUT_OF_SIGNAL),
                Err(err) => absorb(err, report)?,
            }
        }
        let proposals = dedup_by_coordinate(proposals, self.epsilon, |(t, _)| *t);
        report.candidates += proposals.len();

        let mut children = Vec::with_capacity(proposals.len());
        for (t, track) in proposals {
            let mut child = parent.spawn_child(ids.next_id());
            if !child.add_point(&self.target, t, Some(track))? {
                report.kill(codes::OUT_OF_RANGE);
                continue;
            }
            match self.complete(&mut child, evaluator, report) {
                Ok(true) => children.push(child),
                Ok(false) => {}
                Err(err) => absorb(err, report)?,
            }
        }
        report.children += children.len();
        Ok(children)
    }

    /// Runs scheduled PCs and HCs on `child`, then scores it.
    ///
    /// Returns `false` when a puzzle opted out.
    fn complete(
        &self,
        child: &mut Exemplar,
        evaluator: Option<&dyn Evaluator>,
        report: &mut StepReport,
    ) -> Result<bool, FormError> {
        for pc in &self.pcs {
            let PuzzleOutcome::Done(values) = pc.run(child)? else {
                report.kill(codes::OUT_OF_SIGNAL);
                return Ok(false);
            };
            for (name, value) in values {
                child.set_parameter(&name, value, pc.binding().overwrite)?;
            }
        }
        for hc in &self.hcs {
            let PuzzleOutcome::Done(passed) = hc.run(child)? else {
                report.kill(codes::OUT_OF_SIGNAL);
                return Ok(false);
            };
            child.record_hc(hc.binding().puzzle_id, passed)?;
        }
        if let Some(evaluator) = evaluator {
            match evaluator.eval_exemplar(child) {
                Ok(score) => child.set_evaluation(Some(score))?,
                Err(err) if err.code() == codes::MISSING_PARAMETER => report.unscored += 1,
                Err(err) => return Err(err),
            }
        }
        Ok(true)
    }

    pub(crate) fn report(&self) -> StepReport {
        StepReport::new(self.num)
    }
}

fn absorb(err: FormError, report: &mut StepReport) -> Result<(), FormError> {
    if err.is_candidate_local() {
        debug!(code = err.code(), error = %err, "candidate killed");
        report.kill(err.code());
        Ok(())
    } else {
        Err(err)
    }
}
