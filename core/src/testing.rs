//! Deterministic test doubles for the injectable collaborators.

use std::collections::VecDeque;

use crate::RandomSource;

/// Random source that replays queued values.
///
/// Exhausted queues fall back to the lowest legal value.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRandom {
    units: VecDeque<f64>,
    rolls: VecDeque<u32>,
    indices: VecDeque<usize>,
}

impl ScriptedRandom {
    /// Creates a source with empty queues.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues values returned by [`RandomSource::unit`].
    #[must_use]
    pub fn with_units(mut self, units: impl IntoIterator<Item = f64>) -> Self {
        self.units.extend(units);
        self
    }

    /// Queues values returned by [`RandomSource::roll`].
    #[must_use]
    pub fn with_rolls(mut self, rolls: impl IntoIterator<Item = u32>) -> Self {
        self.rolls.extend(rolls);
        self
    }

    /// Queues values returned by [`RandomSource::index`].
    #[must_use]
    pub fn with_indices(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.indices.extend(indices);
        self
    }
}

impl RandomSource for ScriptedRandom {
    fn unit(&mut self) -> f64 {
        self.units.pop_front().unwrap_or(0.0)
    }

    fn roll(&mut self, low: u32, high: u32) -> u32 {
        self.rolls
            .pop_front()
            .map_or(low, |value| value.clamp(low, high.max(low)))
    }

    fn index(&mut self, len: usize) -> usize {
        self.indices
            .pop_front()
            .map_or(0, |value| value.min(len.saturating_sub(1)))
    }
}
