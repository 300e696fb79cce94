use bytes::Bytes;
use fred::prelude::{
    ClientLike, EventInterface, FredResult, HashesInterface, Pool, ReconnectPolicy, Server,
    ServerConfig, SetsInterface, TcpConfig,
};
use fred::types::config::UnresponsiveConfig;
use fred::types::{Builder, Key};
use futures::future::join_all;
use metrics::counter;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error};

use crate::metrics::{
    KVSINK_STORE_CONNECTION_ERRORS_TOTAL, KVSINK_STORE_RECONNECTIONS_TOTAL, register_metrics,
};
use crate::redis::RedisConfig;

const POOL_SIZE: usize = 5;

/// Pooled connection to a Redis server, cheap to clone.
#[derive(Clone)]
pub(super) struct RedisClient {
    pool: Pool,
}

impl RedisClient {
    pub(super) async fn connect(config: &RedisConfig) -> FredResult<Self> {
        register_metrics();

        let pool = Builder::default_centralized()
            .with_config(|redis_config| {
                redis_config.password = config.password.clone();
                redis_config.username = config.username.clone();
                redis_config.server = ServerConfig::Centralized {
                    server: Server::new(config.host.clone(), config.port),
                };
            })
            .with_connection_config(|config| {
                config.internal_command_timeout = Duration::from_secs(5);
                config.reconnect_on_auth_error = true;
                config.tcp = TcpConfig {
                    #[cfg(target_os = "linux")]
                    user_timeout: Some(Duration::from_secs(5)),
                    ..Default::default()
                };
                config.unresponsive = UnresponsiveConfig {
                    max_timeout: Some(Duration::from_secs(10)),
                    interval: Duration::from_secs(3),
                };
            })
            .with_performance_config(|config| {
                config.default_command_timeout = Duration::from_secs(5);
            })
            .set_policy(ReconnectPolicy::new_exponential(0, 1, 2000, 5))
            .build_pool(POOL_SIZE)?;

        for client in pool.clients() {
            let mut error_rx = client.error_rx();
            let mut reconnect_rx = client.reconnect_rx();

            tokio::spawn(async move {
                loop {
                    match error_rx.recv().await {
                        Ok((error, server)) => {
                            counter!(KVSINK_STORE_CONNECTION_ERRORS_TOTAL).increment(1);
                            error!(?server, ?error, "redis connection error");
                        }
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break,
                    }
                }
            });

            tokio::spawn(async move {
                loop {
                    match reconnect_rx.recv().await {
                        Ok(server) => {
                            counter!(KVSINK_STORE_RECONNECTIONS_TOTAL).increment(1);
                            debug!(?server, "redis connection established");
                        }
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break,
                    }
                }
            });
        }

        let connection_tasks = pool.connect_pool();
        pool.wait_for_connect().await?;
        debug!(host = %config.host, port = config.port, "connected to redis");

        tokio::spawn(async move {
            let _results = join_all(connection_tasks).await;
        });

        Ok(Self { pool })
    }

    /// Adds `member` to the set `key`, returning `false` when it was already a member.
    pub(super) async fn add_member(&self, key: &str, member: &str) -> FredResult<bool> {
        let added: i64 = self.pool.sadd(key, member).await?;

        Ok(added > 0)
    }

    pub(super) async fn is_member(&self, key: &str, member: &str) -> FredResult<bool> {
        self.pool.sismember(key, member).await
    }

    /// Sets `field` of the hash `key` to `value`.
    pub(super) async fn set_field(&self, key: &str, field: Bytes, value: Bytes) -> FredResult<()> {
        self.pool
            .hset::<(), _, _>(key, (Key::from(field), value))
            .await
    }

    pub(super) async fn delete_field(&self, key: &str, field: Bytes) -> FredResult<()> {
        self.pool.hdel::<(), _, _>(key, Key::from(field)).await
    }

    pub(super) async fn quit(&self) -> FredResult<()> {
        self.pool.quit().await
    }
}
