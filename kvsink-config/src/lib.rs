//! Configuration of the kvsink workspace.
//!
//! [`shared`] holds the configuration types and their validation, [`load_config`] assembles them
//! from configuration files and `APP_`-prefixed environment variables.

pub mod environment;
mod load;
pub mod shared;

pub use load::{LoadConfigError, load_config, load_config_from};
