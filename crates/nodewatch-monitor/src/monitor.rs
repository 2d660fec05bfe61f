//! Poll loop driving one health check against one endpoint.

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span, warn};

use crate::alert_router::AlertRouter;
use crate::alerts::{Alert, AlertSeverity};
use crate::checks::{BackgroundTask, HealthCheck};
use crate::error::MonitorError;
use crate::evaluator::Verdict;

/// A named poll loop. Runs until cancelled or until its background task fails.
pub struct Monitor {
    name: String,
    endpoint: String,
    poll_interval: Duration,
    check: Box<dyn HealthCheck>,
    router: AlertRouter,
}

impl Monitor {
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        poll_interval: Duration,
        check: Box<dyn HealthCheck>,
        router: AlertRouter,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            poll_interval,
            check,
            router,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.router.channel_names()
    }

    /// Run the poll loop.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), MonitorError> {
        let span = info_span!("monitor", name = %self.name, endpoint = %self.endpoint);
        self.run_inner(cancel).instrument(span).await
    }

    async fn run_inner(mut self, cancel: CancellationToken) -> Result<(), MonitorError> {
        info!(
            interval = ?self.poll_interval,
            channels = ?self.router.channel_names(),
            "monitor started"
        );

        let mut background = self.check.start(&cancel);

        let result = loop {
            if cancel.is_cancelled() {
                break Ok(());
            }

            let verdict = tokio::select! {
                biased;
                _ = cancel.cancelled() => break Ok(()),
                exit = background_exit(&mut background) => break exit,
                verdict = self.check.check() => verdict,
            };

            // Shutdown abandons alerts still in flight.
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break Ok(()),
                _ = self.report(verdict) => {}
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break Ok(()),
                exit = background_exit(&mut background) => break exit,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        };

        if let Some(task) = background {
            task.abort();
        }

        match &result {
            Ok(()) => info!("monitor stopped"),
            Err(e) => error!(error = %e, "monitor failed"),
        }
        result
    }

    async fn report(&self, verdict: Verdict) {
        let observed = self.check.observed();

        match verdict {
            Verdict::Healthy => match observed {
                Some((metric, value)) => info!(metric, value, "endpoint is healthy"),
                None => info!("endpoint is healthy"),
            },
            Verdict::Unhealthy(reason) => {
                error!(reason = %reason, "endpoint is unhealthy");

                let mut alert = Alert::new(&self.endpoint, reason, AlertSeverity::Error)
                    .with_metadata("monitor", &self.name);
                if let Some((metric, value)) = observed {
                    alert = alert.with_metadata(metric, value.to_string());
                }

                let report = self.router.raise_all(&alert).await;
                if !report.is_success() {
                    warn!(
                        failed = report.failures.len(),
                        attempted = report.attempted,
                        "alert not delivered on every channel"
                    );
                }
            }
        }
    }
}

/// Resolve when the background task exits. Pending forever without one.
async fn background_exit(task: &mut Option<BackgroundTask>) -> Result<(), MonitorError> {
    let Some(handle) = task.as_mut() else {
        return std::future::pending().await;
    };

    let result = match handle.await {
        Ok(result) => result,
        Err(e) => Err(MonitorError::Subscription(format!(
            "subscription task failed: {}",
            e
        ))),
    };
    *task = None;
    result
}
