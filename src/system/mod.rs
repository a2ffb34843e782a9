//! Core system components for rain gauge telemetry
pub mod accumulator;
pub mod checksum;
pub mod debounce;
pub mod snapshot;
