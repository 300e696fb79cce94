//! Configuration types shared by the sink crates.

mod base;
mod batch;
mod routes;
mod sink;
mod store;

pub use base::ValidationError;
pub use batch::BatchConfig;
pub use routes::parse_topic_to_destinations;
pub use sink::SinkConfig;
pub use store::StoreConfig;
