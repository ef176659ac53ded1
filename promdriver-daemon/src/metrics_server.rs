//! Self-observability endpoint.
//!
//! Uses the built-in HTTP listener from `metrics-exporter-prometheus`;
//! every `metrics::*!` call in the pipeline crates is recorded once this
//! is installed.

use std::net::{IpAddr, SocketAddr};

use anyhow::Result;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use promdriver_core::config::MetricsConfig;
use promdriver_core::metrics as m;

/// Resolve the listener socket from a bare IPv4 or IPv6 address and a port.
pub fn listen_socket(config: &MetricsConfig) -> Result<SocketAddr> {
    let ip: IpAddr = config
        .listen_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid metrics listen address: {}", e))?;
    Ok(SocketAddr::new(ip, config.port))
}

/// Install the global metrics recorder and start the HTTP listener.
///
/// # Errors
///
/// - `listen_addr` is not an IP address
/// - socket binding fails
/// - a global recorder is already installed
pub fn install_metrics_recorder(config: &MetricsConfig) -> Result<()> {
    let addr = listen_socket(config)?;

    if addr.ip().is_unspecified() {
        tracing::warn!(
            listen_addr = %addr,
            "metrics endpoint is exposed on all interfaces"
        );
    }

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Full(m::SCRAPE_DURATION_SECONDS.to_owned()),
            &m::SCRAPE_DURATION_BUCKETS,
        )
        .map_err(|e| anyhow::anyhow!("invalid histogram buckets: {}", e))?
        .install()
        .map_err(|e| anyhow::anyhow!("failed to install metrics recorder: {}", e))?;

    m::describe_all();
    metrics::gauge!(m::BUILD_INFO, "version" => env!("CARGO_PKG_VERSION")).set(1.0);

    tracing::info!(listen_addr = %addr, "Prometheus metrics endpoint active");
    Ok(())
}
