//! SM-then-PS pipeline of one track.

use form_core::errors::{codes, FormError};
use form_core::{Exemplar, Form, Track, TrackId};
use form_puzzle::{dedup_coordinates, PuzzleOutcome, RunnablePs, RunnableSm, StrategyRegistry};
use tracing::trace;

/// Bound signal modifiers and point selectors of a track.
#[derive(Debug)]
pub struct TrackRunner {
    id: TrackId,
    sms: Vec<RunnableSm>,
    pss: Vec<RunnablePs>,
}

impl TrackRunner {
    /// Binds every puzzle of `track`; binding failures are fatal.
    pub fn new(track: &Track, form: &Form, registry: &StrategyRegistry) -> Result<Self, FormError> {
        if !track.is_valid() {
            return Err(FormError::invalid_form(form.id, "track has no point selector")
                .with_context("track_id", track.id.to_string()));
        }
        let sms = track
            .sms
            .iter()
            .map(|puzzle| RunnableSm::new(puzzle, form, &*registry.get(&puzzle.class_ref.name)?))
            .collect::<Result<Vec<_>, _>>()?;
        let pss = track
            .pss
            .iter()
            .map(|puzzle| RunnablePs::new(puzzle, form, &*registry.get(&puzzle.class_ref.name)?))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { id: track.id, sms, pss })
    }

    /// Track id recorded as point provenance.
    pub fn id(&self) -> TrackId {
        self.id
    }

    /// Selects deduplicated coordinates for the interval.
    ///
    /// An opt-out from any puzzle ends the track with that outcome.
    pub fn run(
        &self,
        exemplar: &Exemplar,
        t_left: f64,
        t_right: f64,
        epsilon: f64,
    ) -> Result<PuzzleOutcome<Vec<f64>>, FormError> {
        exemplar.signal().get_fragment(t_left, t_right).map_err(|err| {
            FormError::run_track(codes::EMPTY_SIGNAL, self.id, "interval holds no samples")
                .with_context("interval", format!("[{t_left}, {t_right}]"))
                .with_context("cause", err.to_string())
        })?;

        let mut signal = exemplar.signal().clone();
        for sm in &self.sms {
            signal = match sm.run(&signal, t_left, t_right)? {
                PuzzleOutcome::Done(modified) => modified,
                PuzzleOutcome::OutOfSignal { class_name } => {
                    return Ok(PuzzleOutcome::OutOfSignal { class_name })
                }
            };
        }

        let mut coords = Vec::new();
        for ps in &self.pss {
            match ps.run(&signal, t_left, t_right, epsilon)? {
                PuzzleOutcome::Done(selected) => coords.extend(selected),
                PuzzleOutcome::OutOfSignal { class_name } => {
                    return Ok(PuzzleOutcome::OutOfSignal { class_name })
                }
            }
        }
        let coords = dedup_coordinates(coords, epsilon);
        if let Some(bad) = coords.iter().find(|t| **t < t_left || **t > t_right) {
            return Err(
                FormError::run_track(codes::TRACK_OUT_OF_INTERVAL, self.id, "coordinate left the interval")
                    .with_context("interval", format!("[{t_left}, {t_right}]"))
                    .with_context("point", bad.to_string()),
            );
        }
        trace!(track_id = %self.id, selected = coords.len(), "track finished");
        Ok(PuzzleOutcome::Done(coords))
    }
}
