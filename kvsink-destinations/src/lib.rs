//! Store clients for the kvsink sink.

#[cfg_attr(not(feature = "redis"), allow(dead_code))]
mod metrics;
#[cfg(feature = "redis")]
pub mod redis;
