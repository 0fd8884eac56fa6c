//! Core types: the canonical maintenance record, validation, time helpers

pub mod maintenance;
pub mod time;
pub mod tracing;

pub use maintenance::{CircuitImpact, Impact, Maintenance, Status, ValidationError};
pub use self::tracing::{LogFormat, TracingConfig, TracingError, init_tracing};
