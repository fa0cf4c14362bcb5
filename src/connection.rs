use crate::error::{Result, SyncError};
use crate::protocol::Request;
use std::time::Duration;

/// Header carrying the TV's pre-shared key
pub const PSK_HEADER: &str = "X-Auth-PSK";

/// Low-level JSON-RPC over HTTP connection to the TV
///
/// Every call is a single authenticated POST. There are no retries; the
/// caller decides what to do with a failure.
#[derive(Debug, Clone)]
pub struct RpcConnection {
    http: reqwest::Client,
    base_url: String,
    psk: String,
}

impl RpcConnection {
    /// Create a connection for the API rooted at `base_url`
    ///
    /// `base_url` is the service root, e.g. `http://192.168.1.20/sony/`.
    /// A trailing slash is added when missing.
    pub fn new(base_url: impl Into<String>, psk: impl Into<String>, timeout: Duration) -> Result<Self> {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            psk: psk.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `request` to `<base_url><endpoint>` and return the raw body
    pub async fn post(&self, endpoint: &str, request: &Request) -> Result<Vec<u8>> {
        let url = format!("{}{}", self.base_url, endpoint);
        let body = serde_json::to_vec(request).map_err(SyncError::Encoding)?;
        tracing::debug!("POST {}: {}", url, String::from_utf8_lossy(&body));

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(PSK_HEADER, &self.psk)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Network(format!("POST {} failed: HTTP {}", url, status)));
        }

        let bytes = response.bytes().await?;
        tracing::debug!("Received: {}", String::from_utf8_lossy(&bytes));
        Ok(bytes.to_vec())
    }
}
