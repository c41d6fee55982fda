//! Periodic Simulation Clock.
//!
//! Produces rising edges at `start_delay + k * period` and falling edges a
//! duty-cycle fraction of a period later. The clock level is published as an
//! ordinary traced signal named `clk`; processes wake on rising edges only.

use crate::sim::process::SimTime;
use crate::sim::signal::Signal;

pub(crate) struct Clock {
    period: SimTime,
    signal: Signal<bool>,
    next_rise: SimTime,
    next_fall: SimTime,
}

impl Clock {
    pub(crate) fn new(
        period: SimTime,
        duty_cycle: f64,
        start_delay: SimTime,
        signal: Signal<bool>,
    ) -> Self {
        assert!(period > 0, "clock period must be positive");
        assert!(
            duty_cycle > 0.0 && duty_cycle < 1.0,
            "duty cycle must lie strictly between 0 and 1"
        );
        let high = (period as f64 * duty_cycle).round() as SimTime;
        Self {
            period,
            signal,
            next_rise: start_delay,
            next_fall: start_delay + high,
        }
    }

    /// Time of the next clock transition (rising or falling).
    pub(crate) fn next_transition(&self) -> SimTime {
        self.next_rise.min(self.next_fall)
    }

    /// Advances the clock through the transition at `now`, if any.
    ///
    /// Returns `true` when `now` is a rising edge.
    pub(crate) fn advance_to(&mut self, now: SimTime) -> bool {
        if now == self.next_rise {
            self.signal.write(true);
            self.next_rise += self.period;
            true
        } else {
            if now == self.next_fall {
                self.signal.write(false);
                self.next_fall += self.period;
            }
            false
        }
    }
}
