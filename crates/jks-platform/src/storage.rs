//! Client for the platform's object storage REST API.
//!
//! Objects live in one public bucket. Uploads and deletes are authenticated
//! with the service key; public URLs need no request at all.

use std::time::Duration;

use jks_core::MAX_IMAGE_BYTES;
use reqwest::{Client, Url};
use serde::Serialize;

use crate::error::PlatformError;

/// Where an uploaded image ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedImage {
    /// Object path inside the bucket; kept on the product so the image can
    /// be deleted later.
    pub path: String,
    pub public_url: String,
}

pub struct StorageClient {
    client: Client,
    base_url: String,
    bucket: String,
    service_key: String,
}

/// Builds the object path for an uploaded file: `product-{millis}-{name}`,
/// with anything outside `[A-Za-z0-9._-]` in the name replaced by `-`.
#[must_use]
pub fn object_path_for(filename: &str, millis: i64) -> String {
    let name: String = filename
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let name = if name.is_empty() { "image".to_string() } else { name };
    format!("product-{millis}-{name}")
}

impl StorageClient {
    /// Creates a client for `bucket` on the platform at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::InvalidBaseUrl`] if `base_url` does not parse
    /// as a URL, or [`PlatformError::Http`] if the `reqwest::Client` cannot be
    /// constructed.
    pub fn with_base_url(
        base_url: &str,
        service_key: &str,
        bucket: &str,
        timeout_secs: u64,
    ) -> Result<Self, PlatformError> {
        Url::parse(base_url).map_err(|e| PlatformError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("jks-storefront/0.1")
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
            service_key: service_key.to_string(),
        })
    }

    /// Public URL of an object. Pure string construction; no request is made.
    #[must_use]
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            self.bucket,
            path.trim_start_matches('/')
        )
    }

    /// Uploads `bytes` to `path`. Oversized or empty bodies are refused
    /// before any request is sent.
    ///
    /// # Errors
    ///
    /// - [`PlatformError::ImageTooLarge`] / [`PlatformError::EmptyUpload`] for
    ///   bodies outside the accepted size.
    /// - [`PlatformError::UnexpectedStatus`] for any non-2xx response.
    /// - [`PlatformError::Http`] on network failure or timeout.
    pub async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<UploadedImage, PlatformError> {
        if bytes.is_empty() {
            return Err(PlatformError::EmptyUpload);
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(PlatformError::ImageTooLarge {
                size: bytes.len(),
                max: MAX_IMAGE_BYTES,
            });
        }

        let path = path.trim_start_matches('/');
        let url = format!("{}/storage/v1/object/{}/{path}", self.base_url, self.bucket);
        let size = bytes.len();

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;
        Self::check_status(response, &url).await?;

        tracing::info!(path, size, bucket = %self.bucket, "uploaded object");
        Ok(UploadedImage {
            path: path.to_string(),
            public_url: self.public_url(path),
        })
    }

    /// Deletes the object at `path`.
    ///
    /// # Errors
    ///
    /// [`PlatformError::UnexpectedStatus`] for non-2xx responses,
    /// [`PlatformError::Http`] on network failure.
    pub async fn remove(&self, path: &str) -> Result<(), PlatformError> {
        let url = format!("{}/storage/v1/object/{}", self.base_url, self.bucket);
        let body = serde_json::json!({ "prefixes": [path] });

        let response = self
            .client
            .delete(&url)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .json(&body)
            .send()
            .await?;
        Self::check_status(response, &url).await?;

        tracing::info!(path, bucket = %self.bucket, "removed object");
        Ok(())
    }

    async fn check_status(response: reqwest::Response, url: &str) -> Result<(), PlatformError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(PlatformError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_string(),
            body: body.chars().take(200).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_path_sanitizes_filename() {
        assert_eq!(
            object_path_for("my saree (1).JPG", 1_700_000_000_000),
            "product-1700000000000-my-saree--1-.JPG"
        );
        assert_eq!(object_path_for("  ", 5), "product-5-image");
        assert_eq!(object_path_for("../etc/passwd", 5), "product-5-..-etc-passwd");
    }

    #[test]
    fn public_url_uses_public_prefix() {
        let client =
            StorageClient::with_base_url("https://abc.supabase.co/", "key", "product-images", 5)
                .expect("client");
        assert_eq!(
            client.public_url("product-1-a.jpg"),
            "https://abc.supabase.co/storage/v1/object/public/product-images/product-1-a.jpg"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = StorageClient::with_base_url("not a url", "key", "bucket", 5);
        assert!(matches!(result, Err(PlatformError::InvalidBaseUrl { .. })));
    }
}
