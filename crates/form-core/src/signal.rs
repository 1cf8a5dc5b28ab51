//! Uniformly sampled 1-D signals and windows over them.

use std::ops::Range;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::FormError;

/// Finite uniformly sampled sequence with a sample rate.
///
/// A signal is a view over a shared sample buffer; fragments keep the buffer
/// and absolute time axis of their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    samples: Arc<[f64]>,
    range: Range<usize>,
    sample_rate: f64,
}

impl Signal {
    /// Creates a signal starting at time zero.
    pub fn new(samples: Vec<f64>, sample_rate: f64) -> Result<Self, FormError> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(FormError::invalid_value("sample_rate", sample_rate));
        }
        let len = samples.len();
        Ok(Self {
            samples: samples.into(),
            range: 0..len,
            sample_rate,
        })
    }

    /// Samples rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Number of samples in the view.
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Whether the view holds no samples.
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Duration covered by the view in seconds.
    pub fn len_seconds(&self) -> f64 {
        self.len() as f64 / self.sample_rate
    }

    /// Samples of the view.
    pub fn samples(&self) -> &[f64] {
        &self.samples[self.range.clone()]
    }

    /// Absolute time of the first sample.
    pub fn start_time(&self) -> f64 {
        self.range.start as f64 / self.sample_rate
    }

    /// Absolute time of the last sample.
    pub fn end_time(&self) -> f64 {
        (self.range.end.saturating_sub(1)) as f64 / self.sample_rate
    }

    /// Absolute time of the sample at `index` within the view.
    pub fn time_of(&self, index: usize) -> f64 {
        (self.range.start + index) as f64 / self.sample_rate
    }

    /// Index within the view of the sample nearest to `t`, if inside.
    pub fn index_of(&self, t: f64) -> Option<usize> {
        if !self.is_moment_in_signal(t) {
            return None;
        }
        let absolute = (t * self.sample_rate).round() as usize;
        Some(absolute.clamp(self.range.start, self.range.end - 1) - self.range.start)
    }

    /// Value of the sample nearest to `t`.
    pub fn value_at(&self, t: f64) -> Option<f64> {
        self.index_of(t).map(|idx| self.samples()[idx])
    }

    /// Inclusive membership test on the view's time span.
    pub fn is_moment_in_signal(&self, t: f64) -> bool {
        !self.is_empty() && t.is_finite() && t >= self.start_time() && t <= self.end_time()
    }

    /// View over the samples whose times lie in `[t_left, t_right]`.
    pub fn get_fragment(&self, t_left: f64, t_right: f64) -> Result<Signal, FormError> {
        if !(t_left.is_finite() && t_right.is_finite()) || t_left >= t_right {
            return Err(FormError::out_of_range(
                t_left,
                t_right,
                "fragment bounds must be finite and ordered",
            ));
        }
        let first = (t_left * self.sample_rate).ceil().max(self.range.start as f64);
        let last = (t_right * self.sample_rate)
            .floor()
            .min(self.range.end as f64 - 1.0);
        if self.is_empty() || first > last {
            return Err(FormError::out_of_range(
                t_left,
                t_right,
                "fragment holds no samples",
            ));
        }
        Ok(Signal {
            samples: Arc::clone(&self.samples),
            range: first as usize..last as usize + 1,
            sample_rate: self.sample_rate,
        })
    }

    /// Same-geometry signal carrying new samples.
    ///
    /// The sample count may differ; callers that require it unchanged check
    /// it themselves.
    pub fn with_samples(&self, samples: Vec<f64>) -> Signal {
        let start = self.range.start;
        let mut buffer = vec![0.0; start];
        let len = samples.len();
        buffer.extend(samples);
        Signal {
            samples: buffer.into(),
            range: start..start + len,
            sample_rate: self.sample_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Signal {
        Signal::new((0..100).map(|i| i as f64).collect(), 100.0).unwrap()
    }

    #[test]
    fn fragment_preserves_rate_and_time_axis() {
        let signal = ramp();
        let fragment = signal.get_fragment(0.105, 0.195).unwrap();
        assert_eq!(fragment.sample_rate(), 100.0);
        assert_eq!(fragment.len(), 9);
        assert_eq!(fragment.samples()[0], 11.0);
        assert!((fragment.start_time() - 0.11).abs() < 1e-12);
        assert!((fragment.end_time() - 0.19).abs() < 1e-12);
    }

    #[test]
    fn fragment_rejects_empty_and_reversed_windows() {
        let signal = ramp();
        assert!(signal.get_fragment(0.5, 0.5).is_err());
        assert!(signal.get_fragment(0.6, 0.5).is_err());
        assert!(signal.get_fragment(2.0, 3.0).is_err());
        assert!(signal.get_fragment(0.101, 0.109).is_err());
    }

    #[test]
    fn membership_is_inclusive() {
        let signal = ramp();
        assert!(signal.is_moment_in_signal(0.0));
        assert!(signal.is_moment_in_signal(0.99));
        assert!(!signal.is_moment_in_signal(0.995));
        assert!(!signal.is_moment_in_signal(-0.001));
    }

    #[test]
    fn with_samples_keeps_offset() {
        let fragment = ramp().get_fragment(0.5, 0.6).unwrap();
        let doubled: Vec<f64> = fragment.samples().iter().map(|v| v * 2.0).collect();
        let modified = fragment.with_samples(doubled);
        assert_eq!(modified.start_time(), fragment.start_time());
        assert_eq!(modified.samples()[0], 100.0);
    }
}
