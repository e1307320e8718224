//! Plan-Do-Check-Act and CAPA lifecycle engine for compliance management.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod telemetry;
