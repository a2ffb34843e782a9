//! Rain gauge telemetry node core
//!
//! Counts the electrical pulses of a tipping-bucket rain sensor, debounces
//! them in interrupt context, periodically drains the totals into a
//! checksummed status record and serves that record to a polling client
//! over a byte-stream connection.
//!
//! The crate is platform-neutral: pin setup, network bring-up and the
//! watchdog peripheral belong to the consuming firmware. It plugs into the
//! hardware through `embedded-hal-async` (sensor pin) and
//! `embedded-io-async` (client connection).

#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

/// System core modules
pub mod system;
/// Task implementations
pub mod task;

pub use system::accumulator::{ChannelTotals, PulseAccumulator};
pub use system::debounce::{ChannelConfig, PulseChannel};
pub use system::snapshot::{record_len, SnapshotCell, StatusRecord};
pub use task::aggregate::Aggregator;
pub use task::serve_status::Watchdog;
