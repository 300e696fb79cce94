use std::net::{IpAddr, Ipv6Addr, SocketAddr};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Port the Prometheus endpoint listens on by default.
pub const DEFAULT_METRICS_PORT: u16 = 9000;

/// Returns the address of the Prometheus endpoint for `port` on every interface.
pub fn metrics_address(port: u16) -> SocketAddr {
    SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), port)
}

/// Installs the global metrics recorder and serves it for Prometheus on `address`.
///
/// Every metric carries the `app` label and, when given, the `task_id` label. Must be called
/// from within a tokio runtime, which drives the HTTP listener.
pub fn init_metrics(
    address: SocketAddr,
    app_name: &str,
    task_id: Option<u32>,
) -> Result<(), BuildError> {
    let mut builder = PrometheusBuilder::new()
        .with_http_listener(address)
        .add_global_label("app", app_name);

    if let Some(task_id) = task_id {
        builder = builder.add_global_label("task_id", task_id.to_string());
    }

    builder.install()?;

    tracing::info!(%address, "metrics endpoint started");

    Ok(())
}
