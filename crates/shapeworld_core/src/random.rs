//! Injectable randomness.
//!
//! Every random draw in shapeworld (shape adoption, pattern choice,
//! menu shuffling, configuration sampling) goes through [`RandomSource`],
//! so a trial can be replayed exactly from a seed or scripted in tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::instrument;

/// Source of uniform random draws.
pub trait RandomSource {
    /// Uniform draw in `[0.0, 1.0)`.
    fn next_f64(&mut self) -> f64;

    /// Uniform index in `[0, len)`. `len` must be non-zero.
    fn next_index(&mut self, len: usize) -> usize;
}

/// Reproducible generator seeded from a `u64`.
///
/// The same seed yields the same draw sequence for a given `rand` release.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    seed: u64,
    rng: StdRng,
}

impl SeededRandom {
    /// Creates a generator from `seed`.
    #[instrument]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// The seed this generator started from.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.r#gen::<f64>()
    }

    fn next_index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

/// Non-reproducible generator backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&mut self) -> f64 {
        rand::thread_rng().r#gen::<f64>()
    }

    fn next_index(&mut self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Scripted source that replays a fixed sequence of draws, cycling.
///
/// Index draws map a value `v` to `floor(v * len)`, so `0.0` always picks
/// the first element and values just below `1.0` pick the last.
#[derive(Debug, Clone)]
pub struct FixedRandom {
    values: Vec<f64>,
    index: usize,
}

impl FixedRandom {
    /// Creates a source cycling through `values`, each clamped to `[0, 1)`.
    ///
    /// An empty sequence behaves like a constant `0.0`.
    pub fn new(values: Vec<f64>) -> Self {
        let values = if values.is_empty() {
            vec![0.0]
        } else {
            values.into_iter().map(|v| v.clamp(0.0, 0.999_999)).collect()
        };
        Self { values, index: 0 }
    }

    /// Creates a source that always returns `value`.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// Number of draws taken so far.
    pub fn draws(&self) -> usize {
        self.index
    }
}

impl RandomSource for FixedRandom {
    fn next_f64(&mut self) -> f64 {
        let value = self.values[self.index % self.values.len()];
        self.index += 1;
        value
    }

    fn next_index(&mut self, len: usize) -> usize {
        let value = self.next_f64();
        ((value * len as f64) as usize).min(len.saturating_sub(1))
    }
}
