use std::time::Duration;

use reqwest::Client;

use crate::error::PlatformError;

const DEFAULT_ENDPOINT: &str = "https://tinyurl.com/api-create.php";

/// Shortens links through a `GET endpoint?url=...` service that answers with
/// the short URL as plain text.
pub struct LinkShortener {
    client: Client,
    endpoint: String,
}

impl LinkShortener {
    /// # Errors
    ///
    /// Returns [`PlatformError::Http`] if the `reqwest::Client` cannot be
    /// constructed.
    pub fn new(timeout_secs: u64) -> Result<Self, PlatformError> {
        Self::with_endpoint(DEFAULT_ENDPOINT, timeout_secs)
    }

    /// Creates a shortener with a custom endpoint (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Http`] if the `reqwest::Client` cannot be
    /// constructed.
    pub fn with_endpoint(endpoint: &str, timeout_secs: u64) -> Result<Self, PlatformError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    /// # Errors
    ///
    /// - [`PlatformError::UnexpectedStatus`] for non-2xx responses.
    /// - [`PlatformError::InvalidResponse`] if the body is not an http(s) URL.
    /// - [`PlatformError::Http`] on network failure or timeout.
    pub async fn shorten(&self, url: &str) -> Result<String, PlatformError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("url", url)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(PlatformError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.endpoint.clone(),
                body: body.chars().take(200).collect(),
            });
        }

        let short = body.trim();
        if !(short.starts_with("http://") || short.starts_with("https://")) {
            return Err(PlatformError::InvalidResponse {
                url: self.endpoint.clone(),
                reason: format!("expected a URL, got {:?}", short.chars().take(80).collect::<String>()),
            });
        }
        Ok(short.to_string())
    }

    /// Shortens `url`, falling back to `url` itself on any failure.
    pub async fn shorten_or_original(&self, url: &str) -> String {
        match self.shorten(url).await {
            Ok(short) => short,
            Err(e) => {
                tracing::warn!(url, error = %e, "link shortening failed; using original URL");
                url.to_string()
            }
        }
    }
}
