//! Scrape task registry.
//!
//! Each configured target runs as its own tokio task. The [`TargetRegistry`]
//! only holds their join handles and the shared cancellation token; loops
//! share no mutable state with each other.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use promdriver_core::config::{TargetConfig, TranslateErrorPolicy};
use promdriver_core::metrics as m;
use promdriver_core::pipeline::{Fetcher, Sink};
use promdriver_pipeline::ScrapeLoop;

/// A spawned scrape loop.
struct TargetHandle {
    /// Source URL, for logging.
    url: String,
    task: JoinHandle<()>,
}

/// Outcome of [`TargetRegistry::shutdown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Loops that exited within the timeout.
    pub stopped: usize,
    /// Loops that had to be aborted.
    pub aborted: usize,
}

/// Registry of running scrape loops.
pub struct TargetRegistry {
    cancel: CancellationToken,
    targets: Vec<TargetHandle>,
}

impl TargetRegistry {
    /// Create an empty registry driven by `cancel`.
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            targets: Vec::new(),
        }
    }

    /// Spawn one scrape loop per target.
    ///
    /// Fetcher and sink are shared by every loop.
    pub fn spawn_all<F: Fetcher, S: Sink>(
        &mut self,
        targets: Vec<TargetConfig>,
        fetcher: Arc<F>,
        sink: Arc<S>,
        batch_size: usize,
        policy: TranslateErrorPolicy,
    ) {
        for target in targets {
            let scrape_loop =
                ScrapeLoop::new(target, Arc::clone(&fetcher), Arc::clone(&sink), batch_size, policy);
            self.spawn(scrape_loop);
        }
        tracing::info!(targets = self.targets.len(), "scrape loops spawned");
    }

    /// Spawn a single scrape loop.
    pub fn spawn<F: Fetcher, S: Sink>(&mut self, scrape_loop: ScrapeLoop<F, S>) {
        let url = scrape_loop.target().source_url.clone();
        let cancel = self.cancel.clone();
        let task = tokio::spawn(scrape_loop.run(cancel));
        self.targets.push(TargetHandle { url, task });
        metrics::gauge!(m::TARGETS_ACTIVE).set(self.targets.len() as f64);
    }

    /// Number of spawned loops.
    pub fn count(&self) -> usize {
        self.targets.len()
    }

    /// The token that stops every loop in this registry.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancel every loop and wait up to `timeout` for them to exit.
    ///
    /// Loops still running after the deadline are aborted.
    pub async fn shutdown(&mut self, timeout: Duration) -> ShutdownReport {
        self.cancel.cancel();
        let deadline = tokio::time::Instant::now() + timeout;
        let mut report = ShutdownReport::default();

        for handle in self.targets.drain(..) {
            let TargetHandle { url, mut task } = handle;
            match tokio::time::timeout_at(deadline, &mut task).await {
                Ok(Ok(())) => report.stopped += 1,
                Ok(Err(e)) => {
                    tracing::error!(url = %url, error = %e, "scrape loop terminated abnormally");
                    report.stopped += 1;
                }
                Err(_) => {
                    tracing::warn!(url = %url, "scrape loop did not stop in time, aborting");
                    task.abort();
                    report.aborted += 1;
                }
            }
        }

        metrics::gauge!(m::TARGETS_ACTIVE).set(0.0);
        tracing::info!(
            stopped = report.stopped,
            aborted = report.aborted,
            "scrape loops stopped"
        );
        report
    }
}
