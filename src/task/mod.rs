//! Cooperative run loops tying the core components to the platform
pub mod aggregate;
pub mod pulse_detect;
pub mod serve_status;
