//! Deterministic signal and sample generators.

use std::f64::consts::PI;

use form_core::{RngHandle, Signal, Stream};

/// `amplitude * sin(2π·freq·t + phase)` sampled at `rate` Hz for `seconds`.
pub fn sine(freq: f64, phase: f64, amplitude: f64, rate: f64, seconds: f64) -> Signal {
    let n = (seconds * rate).round() as usize;
    let samples = (0..n)
        .map(|i| amplitude * (2.0 * PI * freq * i as f64 / rate + phase).sin())
        .collect();
    Signal::new(samples, rate).expect("positive sample rate")
}

/// Half sine over one second peaking at `t = 0.5` with unit amplitude.
pub fn single_peak(rate: f64) -> Signal {
    sine(0.5, 0.0, 1.0, rate, 1.0)
}

/// Normal draws from the samples stream of `seed`.
pub fn normal_samples(n: usize, mean: f64, std: f64, seed: u64) -> Vec<f64> {
    let mut rng = RngHandle::for_stream(seed, Stream::Samples);
    (0..n).map(|_| mean + std * rng.standard_normal()).collect()
}
