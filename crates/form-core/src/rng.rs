//! Seeded randomness for stochastic evaluator fits and test generators.
//!
//! Every draw traces back to `EngineConfig::seed`: a fit asks for the
//! [`Stream`] it drives and gets a generator of its own, so adding trees or
//! changing the holdout split never shifts the draws of another stream.

use std::f64::consts::PI;
use std::hash::Hasher;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use siphasher::sip::SipHasher13;

/// Consumer of a derived random stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    /// Row subsample and splits of one isolation tree.
    Tree(usize),
    /// Initial network weights.
    Weights,
    /// Train/validation shuffle.
    Holdout,
    /// Row picks of a stochastic solver.
    Solver,
    /// Synthetic reference samples.
    Samples,
}

impl Stream {
    fn key(self) -> (u64, u64) {
        match self {
            Stream::Tree(tree) => (1, tree as u64),
            Stream::Weights => (2, 0),
            Stream::Holdout => (3, 0),
            Stream::Solver => (4, 0),
            Stream::Samples => (5, 0),
        }
    }
}

/// Seed of `stream` under `master_seed`: SipHash-1-3, zero keys.
pub fn stream_seed(master_seed: u64, stream: Stream) -> u64 {
    let (kind, index) = stream.key();
    let mut hasher = SipHasher13::new_with_keys(0, 0);
    hasher.write_u64(master_seed);
    hasher.write_u64(kind);
    hasher.write_u64(index);
    hasher.finish()
}

/// Generator bound to one stream.
#[derive(Debug, Clone)]
pub struct RngHandle {
    rng: StdRng,
}

impl RngHandle {
    /// Generator of `stream` under `master_seed`.
    pub fn for_stream(master_seed: u64, stream: Stream) -> Self {
        Self {
            rng: StdRng::seed_from_u64(stream_seed(master_seed, stream)),
        }
    }

    /// Uniform draw in `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Uniform index in `0..upper`; `upper` must be positive.
    pub fn index(&mut self, upper: usize) -> usize {
        self.rng.gen_range(0..upper)
    }

    /// Standard normal draw (Box-Muller, cosine branch).
    pub fn standard_normal(&mut self) -> f64 {
        let u1 = self.unit().max(f64::MIN_POSITIVE);
        let u2 = self.unit();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// Shuffles the first `take` slots of `items` with draws from the whole
    /// slice (partial Fisher-Yates); `take == items.len()` is a full shuffle.
    pub fn shuffle_prefix<T>(&mut self, items: &mut [T], take: usize) {
        let take = take.min(items.len());
        for i in 0..take {
            let j = i + self.index(items.len() - i);
            items.swap(i, j);
        }
    }
}
