//! Key-value sink replicator binary.
//!
//! Reads newline-delimited JSON change records from a file or stdin, and applies them through a
//! sink task to the store selected by the configuration. Includes telemetry, error reporting and
//! shutdown on ctrl-c.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use kvsink_config::shared::SinkConfig;
use kvsink_telemetry::metrics::{DEFAULT_METRICS_PORT, init_metrics, metrics_address};
use kvsink_telemetry::tracing::init_tracing;
use tracing::{error, info};

use crate::config::load_replicator_config;
use crate::core::{InputSource, start_replicator_with_config};
use crate::error::{ReplicatorError, ReplicatorResult};

mod config;
mod core;
mod error;
mod input;

#[derive(Debug, Parser)]
#[command(name = "kvsink-replicator", version, about)]
struct Args {
    /// File with one JSON change record per line, stdin when omitted or `-`.
    #[arg(long)]
    input: Option<PathBuf>,
    /// Port of the Prometheus metrics endpoint.
    #[arg(long, default_value_t = DEFAULT_METRICS_PORT)]
    metrics_port: u16,
    /// Do not serve metrics.
    #[arg(long)]
    disable_metrics: bool,
}

impl Args {
    fn input_source(&self) -> InputSource {
        match &self.input {
            Some(path) if path.as_os_str() != "-" => InputSource::File(path.clone()),
            _ => InputSource::Stdin,
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            eprint!("{}", err.render_report());

            ExitCode::FAILURE
        }
    }
}

/// Loads configuration, initializes tracing, starts the async runtime and runs the replicator.
fn run() -> ReplicatorResult<()> {
    let args = Args::parse();

    let config = load_replicator_config()?;

    init_tracing(env!("CARGO_BIN_NAME")).map_err(ReplicatorError::config)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(args, config))
}

async fn async_main(args: Args, config: SinkConfig) -> ReplicatorResult<()> {
    // The metrics listener is driven by the runtime.
    if args.disable_metrics {
        info!("metrics disabled");
    } else {
        init_metrics(
            metrics_address(args.metrics_port),
            env!("CARGO_BIN_NAME"),
            Some(config.task_id),
        )
        .map_err(ReplicatorError::config)?;
    }

    start_replicator_with_config(config, args.input_source()).await
}
