//! Exclusive pulse accumulator
//!
//! Running totals shared between the edge interrupt handler (increments)
//! and the aggregator (drain). Both sides go through a critical-section
//! mutex, so a drain can never interleave with an increment: pulses
//! confirmed before the drain window are visible in that drain, pulses
//! confirmed after it land in the next one. Nothing is lost or counted
//! twice.
//!
//! The exclusive window spans only the copy and reset of two integers.
//! Checksumming and serialization happen outside it.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

/// Totals accumulated on one sensor channel since the last drain.
///
/// `pulse_count` wraps and `total_pulse_duration_us` saturates if a drain
/// period is long enough to overflow them. Neither is guarded; the
/// aggregation period in any real deployment is orders of magnitude too
/// short for that.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelTotals {
    /// Confirmed complete pulses since the last drain
    pub pulse_count: u32,
    /// Summed duration of those pulses (µs)
    pub total_pulse_duration_us: u32,
}

/// Per-channel counters with the mutual-exclusion discipline built into
/// the interface: the only operations are an increment (interrupt side)
/// and an atomic drain-and-reset (aggregator side).
pub struct PulseAccumulator {
    totals: Mutex<CriticalSectionRawMutex, Cell<ChannelTotals>>,
}

impl PulseAccumulator {
    /// Creates an accumulator with zeroed totals.
    pub const fn new() -> Self {
        Self {
            totals: Mutex::new(Cell::new(ChannelTotals {
                pulse_count: 0,
                total_pulse_duration_us: 0,
            })),
        }
    }

    /// Records one confirmed pulse of the given duration.
    ///
    /// Safe to call from interrupt context; holds the critical section for
    /// two integer read-modify-writes.
    pub fn record_pulse(&self, duration_us: u32) {
        self.totals.lock(|t| {
            let mut totals = t.get();
            totals.pulse_count = totals.pulse_count.wrapping_add(1);
            totals.total_pulse_duration_us =
                totals.total_pulse_duration_us.saturating_add(duration_us);
            t.set(totals);
        });
    }

    /// Copies the current totals out and zeroes them, as one atomic unit
    /// relative to [`record_pulse`](Self::record_pulse).
    pub fn drain_and_reset(&self) -> ChannelTotals {
        self.totals.lock(|t| t.replace(ChannelTotals::default()))
    }
}

impl Default for PulseAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
