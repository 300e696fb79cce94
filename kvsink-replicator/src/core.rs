use kvsink::destination::StoreClient;
use kvsink::destination::memory::MemoryStore;
use kvsink::task::SinkTask;
use kvsink_config::shared::{BatchConfig, SinkConfig, StoreConfig};
use kvsink_destinations::redis::{RedisConfig, RedisStore};
use secrecy::ExposeSecret;
use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, BufReader};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::ReplicatorResult;
use crate::input::RecordReader;

/// Where the replicator reads change records from.
#[derive(Debug, Clone)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

/// Runs a sink task over the whole input with the store selected by `config`.
///
/// Returns once the input is exhausted, on ctrl-c, or on the first failed invocation. The task is
/// stopped in every case.
pub async fn start_replicator_with_config(
    config: SinkConfig,
    input: InputSource,
) -> ReplicatorResult<()> {
    info!(task_id = config.task_id, "starting replicator service");

    log_config(&config);

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &input {
        InputSource::Stdin => Box::new(BufReader::new(tokio::io::stdin())),
        InputSource::File(path) => Box::new(BufReader::new(File::open(path).await?)),
    };
    let reader = RecordReader::new(reader);

    // Static dispatch per store.
    match &config.store {
        StoreConfig::Memory => {
            let task = SinkTask::start(&config, MemoryStore::new()).await?;
            run_task(task, reader, config.batch.max_size).await?;
        }
        StoreConfig::Redis {
            host,
            port,
            username,
            password,
            key_prefix,
        } => {
            let store = RedisStore::connect(RedisConfig {
                host: host.clone(),
                port: *port,
                username: username.clone(),
                password: password
                    .as_ref()
                    .map(|password| password.expose_secret().to_owned()),
                key_prefix: key_prefix.clone(),
            })
            .await?;

            let task = SinkTask::start(&config, store).await?;
            run_task(task, reader, config.batch.max_size).await?;
        }
    }

    info!("replicator service completed");

    Ok(())
}

async fn run_task<C, R>(
    mut task: SinkTask<C>,
    mut reader: RecordReader<R>,
    max_size: usize,
) -> ReplicatorResult<()>
where
    C: StoreClient,
    R: AsyncBufRead + Unpin,
{
    let (shutdown_tx, mut shutdown_rx) = watch::channel(());
    let shutdown_handle = tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c, shutdown on signal is disabled");
            return;
        }

        info!("ctrl-c received, shutting down");
        let _ = shutdown_tx.send(());
    });

    let mut invocations = 0u64;
    let result = loop {
        // A batch being read when shutdown is requested is dropped before reaching the sink.
        let batch = tokio::select! {
            biased;

            Ok(()) = shutdown_rx.changed() => break Ok(()),
            batch = reader.next_batch(max_size) => batch,
        };

        let batch = match batch {
            Ok(batch) if batch.is_empty() => {
                info!(invocations, "input exhausted");
                break Ok(());
            }
            Ok(batch) => batch,
            Err(err) => break Err(err),
        };

        match task.put(batch).await {
            Ok(summary) => {
                invocations += 1;
                debug!(
                    received = summary.records_received,
                    dropped = summary.records_dropped(),
                    applied = summary.total_operations_applied(),
                    "invocation completed"
                );
            }
            Err(err) => {
                error!(error = %err, "invocation failed");
                break Err(err.into());
            }
        }
    };

    shutdown_handle.abort();

    let stopped = task.stop().await;
    result?;
    stopped?;

    Ok(())
}

fn log_config(config: &SinkConfig) {
    for (topic, destinations) in &config.topic_to_destinations {
        debug!(%topic, ?destinations, "route");
    }
    debug!(
        null_value_means_remove = config.null_value_means_remove,
        "null value policy"
    );
    log_batch_config(&config.batch);
    log_store_config(&config.store);
}

fn log_batch_config(config: &BatchConfig) {
    debug!(max_size = config.max_size, "batch config");
}

fn log_store_config(config: &StoreConfig) {
    match config {
        StoreConfig::Memory => {
            debug!("using memory store config");
        }
        StoreConfig::Redis {
            host,
            port,
            username,
            password: _,
            key_prefix,
        } => {
            debug!(%host, port, ?username, %key_prefix, "using redis store config");
        }
    }
}
