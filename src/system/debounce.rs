//! Pulse debouncing state machine
//!
//! Turns raw edge transitions of a tipping-bucket sensor pin into
//! confirmed pulses. A pulse starts on a rising edge and is confirmed by
//! the first falling edge that arrives more than the debounce threshold
//! after it; earlier falling edges are contact bounce and are discarded
//! without restarting the stopwatch.
//!
//! Timestamps are raw microsecond counter values. The counter wraps at
//! 2^32 µs (~71.6 min); all elapsed-time math uses wrapping subtraction,
//! so a pulse spanning the wrap still measures correctly.
//!
//! # Operation
//! - Rising edge while idle: record the start time, enter the pulse.
//! - Rising edge while in a pulse: bounce after the pulse started, ignored.
//! - Falling edge while in a pulse: confirm if `elapsed > threshold`,
//!   otherwise discard and keep waiting on the original start time.
//! - Falling edge while idle: ignored.
//!
//! A threshold of zero disables debouncing: every rising edge restarts the
//! stopwatch and every falling edge confirms immediately.

use crate::system::accumulator::PulseAccumulator;

/// Default debounce threshold (µs)
pub const DEFAULT_DEBOUNCE_THRESHOLD_US: u32 = 5_000;

/// Per-channel debounce configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelConfig {
    /// Minimum pulse duration to count as genuine (µs); 0 disables
    /// debouncing entirely
    pub debounce_threshold_us: u32,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            debounce_threshold_us: DEFAULT_DEBOUNCE_THRESHOLD_US,
        }
    }
}

/// Debounce state for one monitored sensor line.
///
/// Created once at startup and mutated exclusively by the edge handler
/// bound to that line. There is no failure path: malformed signals are
/// absorbed by the state machine.
pub struct PulseChannel {
    config: ChannelConfig,
    in_pulse: bool,
    pulse_start_us: u32,
}

impl PulseChannel {
    /// Creates an idle channel with the given configuration.
    pub const fn new(config: ChannelConfig) -> Self {
        Self {
            config,
            in_pulse: false,
            pulse_start_us: 0,
        }
    }

    /// Handles one electrical transition of the monitored pin.
    ///
    /// `level_high` is the logic level after the transition, `now_us` the
    /// monotonic microsecond counter at the time it was observed. Confirmed
    /// pulses are recorded into `counters`; bounce is discarded silently.
    ///
    /// Bounded and non-blocking, safe to call from interrupt context.
    pub fn on_edge_event(&mut self, level_high: bool, now_us: u32, counters: &PulseAccumulator) {
        let threshold = self.config.debounce_threshold_us;

        if level_high {
            if threshold == 0 || !self.in_pulse {
                self.pulse_start_us = now_us;
                self.in_pulse = true;
            }
        } else if self.in_pulse {
            let elapsed = now_us.wrapping_sub(self.pulse_start_us);
            if threshold == 0 || elapsed > threshold {
                self.in_pulse = false;
                counters.record_pulse(elapsed);
            }
        }
    }

    /// True between a confirmed rising edge and its confirmed falling edge.
    pub fn in_pulse(&self) -> bool {
        self.in_pulse
    }
}
