//! Change-record sink for key-value stores.
//!
//! Turns ordered collections of keyed change records into the minimal set of upsert and remove
//! operations per destination, and applies them to the destinations of a key-value store.

pub mod batch;
pub mod destination;
pub mod error;
pub mod failpoints;
mod macros;
pub mod metrics;
pub mod router;
pub mod task;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
