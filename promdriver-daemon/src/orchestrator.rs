//! Daemon assembly and lifecycle management.
//!
//! The [`Orchestrator`] turns a validated [`PromdriverConfig`] into running
//! scrape loops:
//!
//! 1. Install the metrics recorder (when `[metrics].enabled`)
//! 2. Build the shared HTTP fetcher
//! 3. Resolve credentials and build the Cloud Monitoring client
//! 4. Resolve every target
//!
//! Any failure here is fatal. Once running, a SIGTERM/SIGINT cancels every
//! loop; in-flight cycles are abandoned.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use promdriver_core::config::{PromdriverConfig, TargetConfig};
use promdriver_exposition::HttpFetcher;
use promdriver_stackdriver::{Credentials, MonitoringClient};

use crate::metrics_server;
use crate::registry::{ShutdownReport, TargetRegistry};

/// How long shutdown waits for loops to exit before aborting them.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// The main daemon orchestrator.
pub struct Orchestrator {
    config: PromdriverConfig,
    targets: Vec<TargetConfig>,
    fetcher: Arc<HttpFetcher>,
    sink: Arc<MonitoringClient<Credentials>>,
    registry: TargetRegistry,
}

impl Orchestrator {
    /// Load configuration from `config_path` and build the orchestrator.
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = PromdriverConfig::load(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        Self::build_from_config(config).await
    }

    /// Build from an already-loaded configuration.
    pub async fn build_from_config(config: PromdriverConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        if config.metrics.enabled {
            metrics_server::install_metrics_recorder(&config.metrics)?;
        }

        let fetcher = HttpFetcher::new(config.scrape.timeout)
            .map_err(|e| anyhow::anyhow!("failed to build fetcher: {}", e))?;

        let credentials = Credentials::from_mode(config.sink.credentials)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load credentials: {}", e))?;
        let sink = MonitoringClient::new(&config.sink.endpoint, config.sink.timeout, credentials)
            .map_err(|e| anyhow::anyhow!("failed to build monitoring client: {}", e))?;

        let targets = config
            .targets()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        tracing::info!(
            targets = targets.len(),
            endpoint = %config.sink.endpoint,
            batch_size = config.sink.batch_size,
            "orchestrator initialized"
        );

        Ok(Self {
            config,
            targets,
            fetcher: Arc::new(fetcher),
            sink: Arc::new(sink),
            registry: TargetRegistry::new(CancellationToken::new()),
        })
    }

    /// Spawn one scrape loop per target. Returns immediately.
    pub fn start(&mut self) {
        if self.registry.count() > 0 {
            tracing::warn!("scrape loops already started");
            return;
        }
        for target in &self.targets {
            tracing::info!(target_config = %target, "starting target");
        }
        self.registry.spawn_all(
            self.targets.clone(),
            Arc::clone(&self.fetcher),
            Arc::clone(&self.sink),
            self.config.sink.batch_size,
            self.config.scrape.on_translate_error,
        );
    }

    /// Start every loop and block until SIGTERM or SIGINT, then shut down.
    pub async fn run(&mut self) -> Result<()> {
        self.start();

        let signal = wait_for_shutdown_signal().await?;
        tracing::info!(signal = signal, "shutdown signal received");

        self.shutdown().await;
        Ok(())
    }

    /// Cancel every loop and wait for them to exit.
    pub async fn shutdown(&mut self) -> ShutdownReport {
        self.registry.shutdown(SHUTDOWN_TIMEOUT).await
    }

    /// Number of running scrape loops.
    pub fn running_targets(&self) -> usize {
        self.registry.count()
    }

    /// The resolved targets.
    pub fn targets(&self) -> &[TargetConfig] {
        &self.targets
    }

    /// The loaded configuration.
    pub fn config(&self) -> &PromdriverConfig {
        &self.config
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}
