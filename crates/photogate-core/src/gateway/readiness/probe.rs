//! Health-endpoint probe.

use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::debug;
use url::Url;

/// Result of a single health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub healthy: bool,
    pub latency: Duration,
}

/// Polls the backend's lightweight health endpoint.
#[derive(Debug, Clone)]
pub struct ReadinessProbe {
    client: Client,
    health_url: Url,
    timeout: Duration,
}

impl ReadinessProbe {
    pub fn new(client: Client, health_url: Url, timeout: Duration) -> Self {
        Self { client, health_url, timeout }
    }

    /// Resolve `health_path` against the backend base URL.
    pub fn for_backend(
        client: Client,
        backend: &Url,
        health_path: &str,
        timeout: Duration,
    ) -> Result<Self, url::ParseError> {
        let health_url = backend.join(health_path)?;
        Ok(Self::new(client, health_url, timeout))
    }

    pub fn health_url(&self) -> &Url {
        &self.health_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// True only on a 2xx within the probe timeout.
    pub async fn check_once(&self) -> bool {
        self.check_within(self.timeout).await.healthy
    }

    /// Single probe with an explicit bound.
    pub async fn check_within(&self, bound: Duration) -> ProbeOutcome {
        let started = Instant::now();
        let result = tokio::time::timeout(bound, self.client.get(self.health_url.clone()).send()).await;
        let latency = started.elapsed();

        let healthy = match result {
            Ok(Ok(response)) => {
                let ok = response.status().is_success();
                if !ok {
                    debug!("Health probe {} answered {}", self.health_url, response.status());
                }
                ok
            },
            Ok(Err(e)) => {
                debug!("Health probe {} failed: {}", self.health_url, e);
                false
            },
            Err(_elapsed) => {
                debug!("Health probe {} timed out after {}ms", self.health_url, bound.as_millis());
                false
            },
        };
        ProbeOutcome { healthy, latency }
    }

    /// Sleep `interval`, probe, repeat. Gives up once the next probe would
    /// start after `max_wait`; each probe is clipped to the remaining budget.
    /// A budget shorter than one interval still gets one immediate probe.
    pub async fn wait_until_ready(&self, max_wait: Duration, interval: Duration) -> bool {
        let started = Instant::now();
        let mut probes: u32 = 0;

        loop {
            if started.elapsed() + interval > max_wait {
                if probes > 0 {
                    debug!("Readiness wait gave up after {} probes", probes);
                    return false;
                }
            } else {
                sleep(interval).await;
            }

            let remaining = max_wait.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                return false;
            }

            probes += 1;
            let healthy = self.check_within(self.timeout.min(remaining)).await.healthy;
            if healthy {
                debug!(
                    "Backend ready after {} probes ({}ms)",
                    probes,
                    started.elapsed().as_millis()
                );
                return true;
            }
        }
    }
}
