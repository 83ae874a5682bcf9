//! HTTP reachability probe for workload engine endpoints.

use async_trait::async_trait;
use conductor_application::ports::endpoint_probe::{EndpointProbe, ProbeOutcome};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

/// Probes with a plain `GET`; only `200 OK` counts as reachable.
pub struct HttpEndpointProbe {
    client: reqwest::Client,
}

impl HttpEndpointProbe {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpEndpointProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EndpointProbe for HttpEndpointProbe {
    async fn probe(&self, url: &str, timeout: Duration) -> ProbeOutcome {
        let response = match self.client.get(url).timeout(timeout).send().await {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                return ProbeOutcome::Unreachable(format!(
                    "no response within {}s",
                    timeout.as_secs_f64()
                ));
            }
            Err(e) => return ProbeOutcome::Unreachable(e.to_string()),
        };

        let status = response.status();
        debug!(url, status = status.as_u16(), "Endpoint probed");
        if status == StatusCode::OK {
            ProbeOutcome::Reachable
        } else {
            ProbeOutcome::Unreachable(format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            ))
        }
    }
}
