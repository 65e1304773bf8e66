//! Network reachability.
//!
//! Sync only starts when the device looks online. The check is either a
//! fixed answer (the `--offline` flag, tests) or an HTTP `HEAD` probe where
//! any response at all counts as reachable.

use std::time::Duration;

use tracing::debug;

/// Probe timeout used when none is configured.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// How to decide whether the network is reachable.
#[derive(Debug, Clone)]
pub enum Reachability {
    /// Always report this answer.
    Forced(bool),
    /// Send a `HEAD` request to `url`.
    Probe { url: String, timeout: Duration },
}

impl Reachability {
    /// Probe `url` with the default timeout.
    #[must_use]
    pub fn probe(url: impl Into<String>) -> Self {
        Self::Probe {
            url: url.into(),
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Whether the network is currently reachable.
    pub async fn is_online(&self) -> bool {
        match self {
            Self::Forced(online) => *online,
            Self::Probe { url, timeout } => {
                let result = reqwest::Client::new()
                    .head(url)
                    .timeout(*timeout)
                    .send()
                    .await;
                match result {
                    Ok(response) => {
                        debug!(url = %url, status = %response.status(), "Probe answered");
                        true
                    }
                    Err(e) => {
                        debug!(url = %url, error = %e, "Probe failed");
                        false
                    }
                }
            }
        }
    }
}
