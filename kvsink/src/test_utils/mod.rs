//! Testing utilities for the sink.
//!
//! - [`record`] builds change records and route tables with little ceremony.
//! - [`test_store_wrapper`] wraps any [`crate::destination::StoreClient`] to observe the calls the
//!   sink makes and to inject failures into them.
//! - [`failpoints`] configures `fail` scenarios that are reset when dropped.

#[cfg(feature = "failpoints")]
pub mod failpoints;
pub mod record;
pub mod test_store_wrapper;
