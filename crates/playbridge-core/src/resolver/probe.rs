//! Content-type probing for URIs whose extension says nothing about the format

use super::RetryPolicy;
use crate::{Error, Result};
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use tracing::{debug, instrument, warn};
use url::Url;

/// Issues `HEAD` requests with the engine's timeouts and reports the content type
pub struct ContentProbe {
    client: Client,
    user_agent: String,
}

impl ContentProbe {
    /// Create a probe using the given retry policy's timeouts
    pub fn new(user_agent: impl Into<String>, policy: &RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(policy.connect_timeout)
            .timeout(policy.connect_timeout + policy.read_timeout)
            .build()?;

        Ok(Self {
            client,
            user_agent: user_agent.into(),
        })
    }

    /// Returns the `Content-Type` essence, or `None` if the server did not send one
    #[instrument(skip(self))]
    pub async fn content_type(&self, url: &Url) -> Result<Option<String>> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::unsupported(format!(
                "cannot probe '{}' URIs",
                url.scheme()
            )));
        }

        let response = self
            .client
            .head(url.clone())
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "Probe returned non-success status");
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .filter(|v| !v.is_empty());

        debug!(content_type = ?content_type, "Probe complete");
        Ok(content_type)
    }
}
