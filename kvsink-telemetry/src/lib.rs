//! Logging and metrics setup shared by the kvsink binaries and tests.

pub mod metrics;
pub mod tracing;
