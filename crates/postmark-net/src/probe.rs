//! Fixed-delay existence probing after an upload.

use crate::client::GatewayClient;
use crate::error::NetResult;
use postmark_core::config::ProbeConfig;
use std::future::Future;
use std::time::Duration;

/// Polls the gateway until a fresh upload becomes available.
///
/// The delay is constant between attempts (no backoff) and nothing is
/// waited before the first attempt or after the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExistenceProbe {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for ExistenceProbe {
    fn default() -> Self {
        Self::from_config(&ProbeConfig::default())
    }
}

impl ExistenceProbe {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new(config.attempts, Duration::from_millis(config.delay_ms))
    }

    /// Probe `id` until it is served as an image or attempts run out.
    pub async fn wait_until_available(&self, client: &GatewayClient, id: &str) -> bool {
        self.wait_for(|_| client.probe(id)).await
    }

    /// Run `check` until it yields `Ok(true)`.
    ///
    /// Errors count as failed attempts. At least one attempt is made.
    pub async fn wait_for<F, Fut>(&self, mut check: F) -> bool
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = NetResult<bool>>,
    {
        let attempts = self.attempts.max(1);
        for attempt in 1..=attempts {
            match check(attempt).await {
                Ok(true) => {
                    log::info!("Available after {} attempt(s)", attempt);
                    return true;
                }
                Ok(false) => log::debug!("Attempt {}/{}: not available yet", attempt, attempts),
                Err(e) => log::warn!("Attempt {}/{} failed: {}", attempt, attempts, e),
            }
            if attempt < attempts {
                tokio::time::sleep(self.delay).await;
            }
        }
        log::warn!("Gave up after {} attempts", attempts);
        false
    }
}
