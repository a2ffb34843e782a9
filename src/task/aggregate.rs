//! Periodic telemetry aggregation
//!
//! Drains the per-channel accumulators into the published status record
//! once per aggregation period. The drain of each channel is one atomic
//! unit relative to the edge interrupt path; serialization and the
//! Fletcher-16 computation happen outside any exclusive window, since
//! only this task touches the snapshot.
//!
//! Millisecond timestamps use the same wrapping discipline as the
//! debouncer's microsecond ones (wrap at 2^32 ms, ~49.7 days).

use embassy_time::{Duration, Instant, Timer};

use crate::system::accumulator::{ChannelTotals, PulseAccumulator};
use crate::system::snapshot::{record_len, SnapshotCell, StatusRecord};

/// Default aggregation period (ms)
pub const DEFAULT_AGGREGATE_PERIOD_MS: u32 = 1_000;

/// How often the run loop polls `tick`; must stay well below the period
const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Drains pulse totals into the snapshot on a fixed period.
pub struct Aggregator<'a, const N: usize, const LEN: usize> {
    channels: [&'a PulseAccumulator; N],
    snapshot: &'a SnapshotCell<LEN>,
    period_ms: u32,
    last_update_ms: u32,
}

impl<'a, const N: usize, const LEN: usize> Aggregator<'a, N, LEN> {
    /// Creates an aggregator over the given channels.
    ///
    /// `start_ms` seeds the period timer, so the first drain happens one
    /// full period after startup.
    ///
    /// # Panics
    /// If `LEN` does not match [`record_len`]`(N)`.
    pub fn new(
        channels: [&'a PulseAccumulator; N],
        snapshot: &'a SnapshotCell<LEN>,
        period_ms: u32,
        start_ms: u32,
    ) -> Self {
        assert_eq!(LEN, record_len(N));
        Self {
            channels,
            snapshot,
            period_ms,
            last_update_ms: start_ms,
        }
    }

    /// Polls the period timer; drains and publishes when it has elapsed.
    ///
    /// Call at arbitrary cadence, at least as often as the period. Returns
    /// whether a drain happened.
    pub fn tick(&mut self, now_ms: u32) -> bool {
        if now_ms.wrapping_sub(self.last_update_ms) <= self.period_ms {
            return false;
        }

        let mut record = StatusRecord {
            uptime_ms: now_ms,
            aggregate_period_ms: self.period_ms,
            channels: [ChannelTotals::default(); N],
        };
        for (slot, channel) in record.channels.iter_mut().zip(self.channels) {
            *slot = channel.drain_and_reset();
        }

        let mut buf = [0u8; LEN];
        record.write_to(&mut buf);
        self.snapshot.publish(&buf);
        self.last_update_ms = now_ms;

        let drained: u32 = record.channels.iter().map(|c| c.pulse_count).sum();
        debug!("telemetry drain at {} ms: {} pulses", record.uptime_ms, drained);
        true
    }

    /// Cooperative run loop, polling `tick` faster than the period.
    pub async fn run(&mut self) -> ! {
        info!("aggregator running, period {} ms", self.period_ms);
        loop {
            Timer::after(TICK_INTERVAL).await;
            self.tick(Instant::now().as_millis() as u32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::snapshot::verify_record;

    const LEN: usize = record_len(1);

    fn read<const L: usize>(snapshot: &SnapshotCell<L>) -> [u8; L] {
        let mut out = [0u8; L];
        snapshot.read_into(&mut out);
        out
    }

    fn uptime_of(record: &[u8]) -> u32 {
        u32::from_le_bytes([record[0], record[1], record[2], record[3]])
    }

    fn count_of(record: &[u8]) -> u32 {
        u32::from_le_bytes([record[8], record[9], record[10], record[11]])
    }

    #[test]
    fn no_drain_before_period_elapses() {
        let acc = PulseAccumulator::new();
        let snapshot: SnapshotCell<LEN> = SnapshotCell::new();
        let mut agg = Aggregator::new([&acc], &snapshot, 1_000, 0);

        acc.record_pulse(6_000);
        assert!(!agg.tick(500));
        assert!(!agg.tick(1_000));
        // Counters must be untouched by a no-op tick
        assert_eq!(count_of(&read(&snapshot)), 0);
    }

    #[test]
    fn drain_publishes_and_resets() {
        let acc = PulseAccumulator::new();
        let snapshot: SnapshotCell<LEN> = SnapshotCell::new();
        let mut agg = Aggregator::new([&acc], &snapshot, 1_000, 0);

        acc.record_pulse(6_000);
        acc.record_pulse(8_000);
        assert!(agg.tick(1_001));

        let record = read(&snapshot);
        assert!(verify_record(&record));
        assert_eq!(uptime_of(&record), 1_001);
        assert_eq!(count_of(&record), 2);

        // Totals were zeroed inside the drain window
        assert_eq!(acc.drain_and_reset(), ChannelTotals::default());
    }

    #[test]
    fn no_pulse_lost_across_drains() {
        let acc = PulseAccumulator::new();
        let snapshot: SnapshotCell<LEN> = SnapshotCell::new();
        let mut agg = Aggregator::new([&acc], &snapshot, 1_000, 0);

        let mut served_total = 0;
        let mut now = 0u32;
        for burst in [3u32, 0, 5, 1] {
            for _ in 0..burst {
                acc.record_pulse(6_000);
            }
            now = now.wrapping_add(1_001);
            assert!(agg.tick(now));
            served_total += count_of(&read(&snapshot));
        }
        assert_eq!(served_total, 9);
    }

    #[test]
    fn consecutive_drains_are_at_least_a_period_apart() {
        let acc = PulseAccumulator::new();
        let snapshot: SnapshotCell<LEN> = SnapshotCell::new();
        let mut agg = Aggregator::new([&acc], &snapshot, 1_000, 0);

        assert!(agg.tick(1_100));
        let first = uptime_of(&read(&snapshot));
        for now in (1_150..2_100).step_by(50) {
            assert!(!agg.tick(now));
        }
        assert!(agg.tick(2_150));
        let second = uptime_of(&read(&snapshot));
        assert!(second - first > 1_000);
    }

    #[test]
    fn period_timer_survives_wrap_around() {
        let acc = PulseAccumulator::new();
        let snapshot: SnapshotCell<LEN> = SnapshotCell::new();
        let start = u32::MAX - 500;
        let mut agg = Aggregator::new([&acc], &snapshot, 1_000, start);

        acc.record_pulse(6_000);
        assert!(!agg.tick(u32::MAX));
        // 501 ms before wrap + 500 ms after = 1001 ms elapsed
        assert!(agg.tick(500));
        assert_eq!(count_of(&read(&snapshot)), 1);
    }

    #[test]
    fn idle_channel_reports_zeros() {
        let active = PulseAccumulator::new();
        let idle = PulseAccumulator::new();
        let snapshot: SnapshotCell<{ record_len(2) }> = SnapshotCell::new();
        let mut agg = Aggregator::new([&active, &idle], &snapshot, 1_000, 0);

        active.record_pulse(6_000);
        assert!(agg.tick(1_500));

        let record = read(&snapshot);
        assert!(verify_record(&record));
        assert_eq!(count_of(&record), 1);
        assert_eq!(&record[16..24], &[0u8; 8]);
    }

    #[test]
    fn period_field_reflects_configuration() {
        let acc = PulseAccumulator::new();
        let snapshot: SnapshotCell<LEN> = SnapshotCell::new();
        let mut agg = Aggregator::new([&acc], &snapshot, 2_500, 0);

        assert!(agg.tick(2_501));
        let record = read(&snapshot);
        assert_eq!(
            u32::from_le_bytes([record[4], record[5], record[6], record[7]]),
            2_500
        );
    }
}
