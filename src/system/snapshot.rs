//! Status record layout and snapshot publication
//!
//! The served record is serialized through an explicit routine with a
//! documented field order rather than dumped from memory, so the checksum
//! is computed over a defined byte stream.
//!
//! # Wire layout (version 1, all fields little-endian)
//!
//! | offset        | field                              |
//! |---------------|------------------------------------|
//! | 0             | `uptime_ms: u32`                   |
//! | 4             | `aggregate_period_ms: u32`         |
//! | 8 + 8·i       | channel i `pulse_count: u32`       |
//! | 12 + 8·i      | channel i `total_pulse_duration_us: u32` |
//! | 8 + 8·N       | `checksum: u16` (Fletcher-16 over all preceding bytes) |
//!
//! The record is overwritten in place each aggregation period. Payload and
//! checksum are published as one step, so a reader can never observe a
//! mismatched pair.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::system::accumulator::ChannelTotals;
use crate::system::checksum::fletcher16;

/// Bytes occupied by the uptime and period fields
pub const HEADER_LEN: usize = 8;
/// Bytes occupied by one channel's counters
pub const CHANNEL_LEN: usize = 8;
/// Bytes occupied by the trailing checksum
pub const CHECKSUM_LEN: usize = 2;

/// Serialized length of a status record covering `channels` sensor lines.
pub const fn record_len(channels: usize) -> usize {
    HEADER_LEN + CHANNEL_LEN * channels + CHECKSUM_LEN
}

/// One aggregation period's telemetry, ready for serialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusRecord<const N: usize> {
    /// Milliseconds since startup at the time of the drain
    pub uptime_ms: u32,
    /// Configured aggregation period, for client-side rate normalization
    pub aggregate_period_ms: u32,
    /// Drained totals, one entry per sensor channel
    pub channels: [ChannelTotals; N],
}

impl<const N: usize> StatusRecord<N> {
    /// Serialized length including the checksum.
    pub const LEN: usize = record_len(N);

    /// Serializes the record and its checksum into `buf`.
    ///
    /// `buf` must be exactly [`Self::LEN`] bytes.
    pub fn write_to(&self, buf: &mut [u8]) {
        assert_eq!(buf.len(), Self::LEN);

        buf[0..4].copy_from_slice(&self.uptime_ms.to_le_bytes());
        buf[4..8].copy_from_slice(&self.aggregate_period_ms.to_le_bytes());
        let mut off = HEADER_LEN;
        for totals in &self.channels {
            buf[off..off + 4].copy_from_slice(&totals.pulse_count.to_le_bytes());
            buf[off + 4..off + 8].copy_from_slice(&totals.total_pulse_duration_us.to_le_bytes());
            off += CHANNEL_LEN;
        }

        let checksum = fletcher16(&buf[..off]);
        buf[off..off + 2].copy_from_slice(&checksum.to_le_bytes());
    }
}

/// Checks the trailing Fletcher-16 of a serialized record.
///
/// What a client does with a received reply; also exercised by the tests.
pub fn verify_record(bytes: &[u8]) -> bool {
    if bytes.len() < CHECKSUM_LEN {
        return false;
    }
    let (payload, checksum) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
    fletcher16(payload) == u16::from_le_bytes([checksum[0], checksum[1]])
}

/// The one published status record, shared between the aggregator (writer)
/// and the serving protocol (reader).
///
/// A freshly created cell is all zeroes, which is itself a
/// checksum-consistent record (the Fletcher-16 of a zero payload is zero),
/// so a client polling before the first drain still gets a valid reply.
pub struct SnapshotCell<const LEN: usize> {
    record: Mutex<CriticalSectionRawMutex, Cell<[u8; LEN]>>,
}

impl<const LEN: usize> SnapshotCell<LEN> {
    /// Creates a zeroed snapshot cell.
    pub const fn new() -> Self {
        Self {
            record: Mutex::new(Cell::new([0; LEN])),
        }
    }

    /// Replaces the published record. Payload and checksum land together.
    pub fn publish(&self, record: &[u8; LEN]) {
        self.record.lock(|r| r.set(*record));
    }

    /// Copies the current record into `out`.
    pub fn read_into(&self, out: &mut [u8; LEN]) {
        self.record.lock(|r| *out = r.get());
    }
}

impl<const LEN: usize> Default for SnapshotCell<LEN> {
    fn default() -> Self {
        Self::new()
    }
}
