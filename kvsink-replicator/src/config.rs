use kvsink_config::load_config;
use kvsink_config::shared::SinkConfig;

use crate::error::{ReplicatorError, ReplicatorResult};

/// Loads and validates the sink configuration of the replicator.
pub fn load_replicator_config() -> ReplicatorResult<SinkConfig> {
    let config = load_config::<SinkConfig>().map_err(ReplicatorError::config)?;
    config.validate().map_err(ReplicatorError::config)?;

    Ok(config)
}
