//! Destination abstractions for the sink.
//!
//! This module provides the [`StoreClient`] and [`DestinationHandle`] traits through which the
//! sink talks to a key-value store, an in-memory implementation, and the
//! [`manager::DestinationManager`] that owns the live handles of a task.

mod base;
pub mod manager;
pub mod memory;

pub use base::{DestinationHandle, StoreClient};
