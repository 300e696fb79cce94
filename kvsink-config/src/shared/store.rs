use secrecy::SecretString;
use serde::Deserialize;

use crate::shared::ValidationError;

const fn default_redis_port() -> u16 {
    StoreConfig::DEFAULT_REDIS_PORT
}

fn default_key_prefix() -> String {
    StoreConfig::DEFAULT_KEY_PREFIX.to_owned()
}

/// Key-value store the sink writes to.
///
/// This intentionally does not implement [`Serialize`] to avoid accidentally leaking secrets
/// into serialized forms.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreConfig {
    /// In-process store, lost when the process exits.
    #[default]
    Memory,
    /// Redis server. Destinations are hashes named `{key_prefix}:destination:{name}`.
    Redis {
        /// Redis host name or address.
        host: String,
        /// Redis port.
        #[serde(default = "default_redis_port")]
        port: u16,
        /// User for ACL authentication.
        username: Option<String>,
        /// Password for authentication.
        password: Option<SecretString>,
        /// Prefix of every key written by the sink.
        #[serde(default = "default_key_prefix")]
        key_prefix: String,
    },
}

impl StoreConfig {
    /// Default Redis port.
    pub const DEFAULT_REDIS_PORT: u16 = 6379;

    /// Default prefix of the keys written to Redis.
    pub const DEFAULT_KEY_PREFIX: &'static str = "kvsink";

    /// Validates the store settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            StoreConfig::Memory => Ok(()),
            StoreConfig::Redis {
                host,
                port,
                key_prefix,
                ..
            } => {
                if host.trim().is_empty() {
                    return Err(ValidationError::InvalidFieldValue {
                        field: "store.redis.host".to_string(),
                        constraint: "must not be empty".to_string(),
                    });
                }

                if *port == 0 {
                    return Err(ValidationError::InvalidFieldValue {
                        field: "store.redis.port".to_string(),
                        constraint: "must be greater than 0".to_string(),
                    });
                }

                if key_prefix.is_empty() || key_prefix.contains(':') {
                    return Err(ValidationError::InvalidFieldValue {
                        field: "store.redis.key_prefix".to_string(),
                        constraint: "must be non-empty and must not contain `:`".to_string(),
                    });
                }

                Ok(())
            }
        }
    }
}
