//! Grid Status Proxy
//!
//! Relays the load-shedding status endpoint verbatim. The upstream answers with
//! a bare stage number ("1" means no load-shedding); interpretation is left to
//! the client.

/// Served by `/api/waterstatus`; there is no upstream feed for water
pub const WATER_STATUS: &str = "No current outage updates";

#[derive(Debug, thiserror::Error)]
#[error("upstream status request failed: {0}")]
pub struct UpstreamError(#[from] reqwest::Error);

#[derive(Debug, Clone)]
pub struct StatusProxy {
    http: reqwest::Client,
    endpoint: String,
}

impl StatusProxy {
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Raw body of the upstream response. Non-2xx bodies are relayed too;
    /// only transport and decoding failures are errors.
    pub async fn fetch(&self) -> Result<String, UpstreamError> {
        let response = self.http.get(&self.endpoint).send().await?;

        if !response.status().is_success() {
            tracing::warn!("Status endpoint returned {}", response.status());
        }

        Ok(response.text().await?)
    }
}
