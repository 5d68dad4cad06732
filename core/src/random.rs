//! Injectable randomness and time sources.

use std::{
    fmt,
    time::{Duration, Instant},
};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Stream constant mixed into the session seed for level generation.
pub const RNG_STREAM_GENERATION: u64 = 0x6765_6e65_7261_7465;

/// Stream constant mixed into the session seed for turn resolution.
pub const RNG_STREAM_TURNS: u64 = 0x7475_726e_735f_5f31;

/// Source of uniform random values consumed by generation and turn resolution.
pub trait RandomSource: fmt::Debug {
    /// Uniform float in `[0, 1)`.
    fn unit(&mut self) -> f64;

    /// Uniform integer in `low..=high`. Returns `low` when the range is empty.
    fn roll(&mut self, low: u32, high: u32) -> u32;

    /// Uniform index in `0..len`. Returns 0 when `len` is 0.
    fn index(&mut self, len: usize) -> usize;
}

/// Seeded ChaCha generator used for reproducible sessions.
#[derive(Clone, Debug)]
pub struct SeededRandom {
    rng: ChaCha8Rng,
    seed: u64,
}

impl SeededRandom {
    /// Creates a generator from the provided seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Creates a generator for one named stream of a session seed.
    #[must_use]
    pub fn for_stream(seed: u64, stream: u64) -> Self {
        Self::new(seed ^ stream)
    }

    /// Seed the generator was created with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for SeededRandom {
    fn unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn roll(&mut self, low: u32, high: u32) -> u32 {
        if high < low {
            return low;
        }
        self.rng.gen_range(low..=high)
    }

    fn index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.rng.gen_range(0..len)
    }
}

/// Monotonic millisecond timestamp source gating action cadence.
pub trait Clock {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
}

/// Wall-clock backed monotonic clock.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Starts a clock at the current instant.
    #[must_use]
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}
