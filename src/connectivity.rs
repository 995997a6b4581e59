use async_trait::async_trait;
use std::time::Duration;

use crate::error::HealthError;

/// Runs on every allowed health check before the success body is written.
#[async_trait]
pub trait ConnectivityCheck: Send + Sync {
    async fn check(&self) -> Result<(), HealthError>;
}

// Base check - the process answering is proof enough
pub struct AlwaysUp;

#[async_trait]
impl ConnectivityCheck for AlwaysUp {
    async fn check(&self) -> Result<(), HealthError> {
        Ok(())
    }
}

/// Probes an upstream over HTTP. Any 2xx counts as connected.
pub struct HttpProbe {
    client: reqwest::Client,
    url: reqwest::Url,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(client: reqwest::Client, url: reqwest::Url, timeout: Duration) -> Self {
        Self { client, url, timeout }
    }

    pub fn url(&self) -> &reqwest::Url {
        &self.url
    }
}

#[async_trait]
impl ConnectivityCheck for HttpProbe {
    async fn check(&self) -> Result<(), HealthError> {
        let res = self
            .client
            .get(self.url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() { "timed out" } else { "unreachable" };
                HealthError::ConnectivityCheckFailed(format!("upstream {reason}"))
            })?;

        if res.status().is_success() {
            Ok(())
        } else {
            Err(HealthError::ConnectivityCheckFailed(format!(
                "upstream returned {}",
                res.status().as_u16()
            )))
        }
    }
}
