//! Time sources driving the tick loop.

use std::{thread, time::Duration};

use delve_core::{Clock, MonotonicClock};

/// Fixed-step clock advanced explicitly by the tick loop.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SimulatedClock {
    step: Duration,
    elapsed: Duration,
}

impl SimulatedClock {
    pub(crate) const fn new(step: Duration) -> Self {
        Self {
            step,
            elapsed: Duration::ZERO,
        }
    }

    pub(crate) fn advance(&mut self) {
        self.elapsed = self.elapsed.saturating_add(self.step);
    }
}

impl Clock for SimulatedClock {
    fn now(&self) -> Duration {
        self.elapsed
    }
}

/// Decides how the loop observes and spends time between ticks.
#[derive(Debug)]
pub(crate) enum Pacing {
    /// Instantaneous ticks on a simulated clock.
    Simulated(SimulatedClock),
    /// Wall-clock ticks separated by sleeping for one step.
    Realtime {
        clock: MonotonicClock,
        step: Duration,
    },
}

impl Pacing {
    pub(crate) fn new(realtime: bool, step: Duration) -> Self {
        if realtime {
            Self::Realtime {
                clock: MonotonicClock::start(),
                step,
            }
        } else {
            Self::Simulated(SimulatedClock::new(step))
        }
    }

    pub(crate) fn now(&self) -> Duration {
        match self {
            Self::Simulated(clock) => clock.now(),
            Self::Realtime { clock, .. } => clock.now(),
        }
    }

    pub(crate) fn wait(&mut self) {
        match self {
            Self::Simulated(clock) => clock.advance(),
            Self::Realtime { step, .. } => thread::sleep(*step),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_time_advances_by_whole_steps() {
        let mut pacing = Pacing::new(false, Duration::from_millis(16));
        assert_eq!(pacing.now(), Duration::ZERO);
        pacing.wait();
        pacing.wait();
        assert_eq!(pacing.now(), Duration::from_millis(32));
    }
}
