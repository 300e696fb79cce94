//! Redis backed [`StoreClient`].
//!
//! Every destination is a Redis hash named `{key_prefix}:destination:{name}` whose fields are the
//! record keys. Existing destinations are tracked in the set `{key_prefix}:destinations`, and
//! adding a name to that set is what creates a destination: the server answers whether the name
//! was new, so concurrent creations from several workers resolve to exactly one winner.

mod client;

use bytes::Bytes;
use kvsink::{bail, sink_error};
use kvsink::destination::{DestinationHandle, StoreClient};
use kvsink::error::{ErrorKind, SinkError, SinkResult};
use kvsink::types::RecordKey;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::redis::client::RedisClient;

/// Name of the set tracking the existing destinations, below the key prefix.
const DESTINATIONS_SET: &str = "destinations";

/// Namespace of the destination hashes, below the key prefix.
const DESTINATION_NAMESPACE: &str = "destination";

/// Connection settings of a [`RedisStore`].
#[derive(Clone, Debug)]
pub struct RedisConfig {
    /// Host on which Redis is running.
    pub host: String,
    /// Port on which Redis is running.
    pub port: u16,
    /// User name for ACL authentication.
    pub username: Option<String>,
    /// Password, if the server requires authentication.
    pub password: Option<String>,
    /// Prefix of every key written by the store.
    pub key_prefix: String,
}

fn destination_key(key_prefix: &str, destination: &str) -> String {
    format!("{key_prefix}:{DESTINATION_NAMESPACE}:{destination}")
}

fn destinations_set_key(key_prefix: &str) -> String {
    format!("{key_prefix}:{DESTINATIONS_SET}")
}

fn redis_error(kind: ErrorKind, description: &'static str, err: fred::error::Error) -> SinkError {
    sink_error!(kind, description, err.to_string(), source: err)
}

/// [`StoreClient`] writing destinations to a Redis server.
#[derive(Clone)]
pub struct RedisStore {
    client: RedisClient,
    key_prefix: Arc<str>,
}

impl RedisStore {
    /// Connects to the server described by `config`.
    pub async fn connect(config: RedisConfig) -> SinkResult<Self> {
        let client = RedisClient::connect(&config).await.map_err(|err| {
            redis_error(
                ErrorKind::StoreConnectionFailed,
                "Cannot connect to redis",
                err,
            )
        })?;

        info!(host = %config.host, port = config.port, key_prefix = %config.key_prefix, "redis store connected");

        Ok(Self {
            client,
            key_prefix: config.key_prefix.into(),
        })
    }

    fn handle(&self, name: &str) -> RedisDestination {
        RedisDestination {
            name: name.to_owned(),
            key: destination_key(&self.key_prefix, name),
            client: self.client.clone(),
        }
    }
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}

impl StoreClient for RedisStore {
    type Handle = RedisDestination;

    fn name() -> &'static str {
        "redis"
    }

    async fn create_destination(&self, name: &str) -> SinkResult<RedisDestination> {
        let added = self
            .client
            .add_member(&destinations_set_key(&self.key_prefix), name)
            .await
            .map_err(|err| {
                redis_error(
                    ErrorKind::DestinationCreationFailed,
                    "Cannot register destination in redis",
                    err,
                )
            })?;

        if !added {
            bail!(
                ErrorKind::DestinationAlreadyExists,
                "Destination already exists",
                format!("The destination '{name}' is already registered in redis")
            );
        }

        info!(destination = name, "created redis destination");

        Ok(self.handle(name))
    }

    async fn get_destination(&self, name: &str) -> SinkResult<RedisDestination> {
        let exists = self
            .client
            .is_member(&destinations_set_key(&self.key_prefix), name)
            .await
            .map_err(|err| {
                redis_error(
                    ErrorKind::DestinationError,
                    "Cannot look up destination in redis",
                    err,
                )
            })?;

        if !exists {
            bail!(
                ErrorKind::DestinationMissing,
                "Destination does not exist",
                format!("The destination '{name}' is not registered in redis")
            );
        }

        Ok(self.handle(name))
    }

    async fn close(&self) -> SinkResult<()> {
        self.client.quit().await.map_err(|err| {
            redis_error(ErrorKind::DestinationError, "Cannot close redis connection", err)
        })
    }
}

/// Handle to one destination hash of a [`RedisStore`].
#[derive(Clone)]
pub struct RedisDestination {
    name: String,
    key: String,
    client: RedisClient,
}

impl fmt::Debug for RedisDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisDestination")
            .field("name", &self.name)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl DestinationHandle for RedisDestination {
    fn name(&self) -> &str {
        &self.name
    }

    async fn upsert(&self, key: RecordKey, value: Option<Bytes>) -> SinkResult<()> {
        debug!(destination = %self.name, %key, "setting redis hash field");

        // Redis has no null value, a null value is stored as an empty one.
        self.client
            .set_field(&self.key, key.into_bytes(), value.unwrap_or_default())
            .await
            .map_err(|err| redis_error(ErrorKind::DestinationError, "Cannot set in redis", err))
    }

    async fn remove(&self, key: RecordKey) -> SinkResult<()> {
        debug!(destination = %self.name, %key, "deleting redis hash field");

        self.client
            .delete_field(&self.key, key.into_bytes())
            .await
            .map_err(|err| redis_error(ErrorKind::DestinationError, "Cannot del in redis", err))
    }
}
