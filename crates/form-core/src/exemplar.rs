//! Growing labelling of a signal against a form.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::FormError;
use crate::ids::{ExemplarId, PuzzleId, TrackId};
use crate::signal::Signal;
use crate::value::ParamValue;

/// Coordinate of a placed point together with the track that proposed it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacedPoint {
    /// Absolute coordinate in seconds.
    pub t: f64,
    /// Track that proposed the coordinate; `None` for externally labelled points.
    pub track: Option<TrackId>,
}

/// One concrete in-progress labelling of a signal.
///
/// Points and parameters are write-once: a second write under the same name
/// fails with `Duplicate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exemplar {
    id: ExemplarId,
    signal: Signal,
    points: IndexMap<String, PlacedPoint>,
    parameters: IndexMap<String, ParamValue>,
    passed_hcs: BTreeSet<PuzzleId>,
    failed_hcs: BTreeSet<PuzzleId>,
    evaluation: Option<f64>,
}

impl Exemplar {
    /// Creates an empty exemplar on `signal`.
    pub fn new(id: ExemplarId, signal: Signal) -> Self {
        Self {
            id,
            signal,
            points: IndexMap::new(),
            parameters: IndexMap::new(),
            passed_hcs: BTreeSet::new(),
            failed_hcs: BTreeSet::new(),
            evaluation: None,
        }
    }

    /// Identifier within the run that produced the exemplar.
    pub fn id(&self) -> ExemplarId {
        self.id
    }

    /// Signal being labelled.
    pub fn signal(&self) -> &Signal {
        &self.signal
    }

    /// Places a point.
    ///
    /// Returns `Ok(false)` when `t` lies outside the signal; nothing is
    /// written in that case.
    pub fn add_point(
        &mut self,
        name: &str,
        t: f64,
        track: Option<TrackId>,
    ) -> Result<bool, FormError> {
        if self.points.contains_key(name) {
            return Err(FormError::duplicate("point", name));
        }
        if !self.signal.is_moment_in_signal(t) {
            return Ok(false);
        }
        self.points.insert(name.to_string(), PlacedPoint { t, track });
        Ok(true)
    }

    /// Stores a parameter value.
    pub fn add_parameter(&mut self, name: &str, value: ParamValue) -> Result<(), FormError> {
        self.set_parameter(name, value, false)
    }

    /// Stores a PC output; an existing value is replaced only with `overwrite`.
    pub fn set_parameter(&mut self, name: &str, value: ParamValue, overwrite: bool) -> Result<(), FormError> {
        if !overwrite && self.parameters.contains_key(name) {
            return Err(FormError::duplicate("parameter", name));
        }
        self.parameters.insert(name.to_string(), value);
        Ok(())
    }

    /// Coordinate of a placed point.
    pub fn point(&self, name: &str) -> Option<f64> {
        self.points.get(name).map(|placed| placed.t)
    }

    /// Placed point with provenance.
    pub fn placed_point(&self, name: &str) -> Option<&PlacedPoint> {
        self.points.get(name)
    }

    /// Stored parameter value.
    pub fn parameter(&self, name: &str) -> Option<&ParamValue> {
        self.parameters.get(name)
    }

    /// Points in placement order.
    pub fn points(&self) -> &IndexMap<String, PlacedPoint> {
        &self.points
    }

    /// Parameters in insertion order.
    pub fn parameters(&self) -> &IndexMap<String, ParamValue> {
        &self.parameters
    }

    /// Hard conditions that passed.
    pub fn passed_hcs(&self) -> &BTreeSet<PuzzleId> {
        &self.passed_hcs
    }

    /// Hard conditions that failed.
    pub fn failed_hcs(&self) -> &BTreeSet<PuzzleId> {
        &self.failed_hcs
    }

    /// Records a hard condition verdict exactly once.
    pub fn record_hc(&mut self, id: PuzzleId, passed: bool) -> Result<(), FormError> {
        if self.passed_hcs.contains(&id) || self.failed_hcs.contains(&id) {
            return Err(FormError::duplicate("hard condition", &id.to_string()));
        }
        if passed {
            self.passed_hcs.insert(id);
        } else {
            self.failed_hcs.insert(id);
        }
        Ok(())
    }

    /// Whether no recorded hard condition failed.
    pub fn all_hcs_passed(&self) -> bool {
        self.failed_hcs.is_empty()
    }

    /// Current score.
    pub fn evaluation(&self) -> Option<f64> {
        self.evaluation
    }

    /// Sets or clears the score; values must be finite and within `[0, 1]`.
    pub fn set_evaluation(&mut self, evaluation: Option<f64>) -> Result<(), FormError> {
        if let Some(score) = evaluation {
            if !score.is_finite() || !(0.0..=1.0).contains(&score) {
                return Err(FormError::invalid_value("evaluation", score));
            }
        }
        self.evaluation = evaluation;
        Ok(())
    }

    /// Structural clone under a new id with the score cleared.
    pub fn spawn_child(&self, id: ExemplarId) -> Exemplar {
        Exemplar {
            id,
            evaluation: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::codes;

    fn exemplar() -> Exemplar {
        let signal = Signal::new(vec![0.0; 100], 100.0).unwrap();
        Exemplar::new(ExemplarId::from_raw(0), signal)
    }

    #[test]
    fn point_outside_signal_is_refused_quietly() {
        let mut ex = exemplar();
        assert!(!ex.add_point("p", 1.5, None).unwrap());
        assert!(ex.point("p").is_none());
        assert!(ex.add_point("p", 0.5, Some(TrackId::from_raw(3))).unwrap());
        assert_eq!(ex.placed_point("p").unwrap().track, Some(TrackId::from_raw(3)));
    }

    #[test]
    fn rewrites_fail_with_duplicate() {
        let mut ex = exemplar();
        ex.add_point("p", 0.5, None).unwrap();
        assert_eq!(ex.add_point("p", 0.6, None).unwrap_err().code(), codes::DUPLICATE);
        ex.add_parameter("a", ParamValue::Float(1.0)).unwrap();
        let err = ex.add_parameter("a", ParamValue::Float(2.0)).unwrap_err();
        assert_eq!(err.code(), codes::DUPLICATE);
        assert_eq!(ex.parameter("a"), Some(&ParamValue::Float(1.0)));
    }

    #[test]
    fn overwrite_flag_gates_replacement() {
        let mut ex = exemplar();
        ex.set_parameter("a", ParamValue::Float(1.0), false).unwrap();
        let err = ex.set_parameter("a", ParamValue::Float(2.0), false).unwrap_err();
        assert_eq!(err.code(), codes::DUPLICATE);
        ex.set_parameter("a", ParamValue::Float(3.0), true).unwrap();
        assert_eq!(ex.parameter("a"), Some(&ParamValue::Float(3.0)));
    }

    #[test]
    fn evaluation_range_is_enforced() {
        let mut ex = exemplar();
        ex.set_evaluation(Some(1.0)).unwrap();
        for bad in [f64::NAN, -0.1, 1.01, f64::INFINITY] {
            let err = ex.set_evaluation(Some(bad)).unwrap_err();
            assert_eq!(err.code(), codes::INVALID_VALUE);
        }
        assert_eq!(ex.evaluation(), Some(1.0));
        ex.set_evaluation(None).unwrap();
        assert_eq!(ex.evaluation(), None);
    }

    #[test]
    fn hc_verdicts_are_recorded_once() {
        let mut ex = exemplar();
        let hc = PuzzleId::from_raw(9);
        ex.record_hc(hc, false).unwrap();
        assert!(ex.record_hc(hc, true).is_err());
        assert!(ex.failed_hcs().contains(&hc));
        assert!(!ex.all_hcs_passed());
    }

    #[test]
    fn child_keeps_content_but_not_score() {
        let mut ex = exemplar();
        ex.add_point("p", 0.2, None).unwrap();
        ex.set_evaluation(Some(0.7)).unwrap();
        let child = ex.spawn_child(ExemplarId::from_raw(5));
        assert_eq!(child.id(), ExemplarId::from_raw(5));
        assert_eq!(child.point("p"), Some(0.2));
        assert_eq!(child.evaluation(), None);
    }
}
