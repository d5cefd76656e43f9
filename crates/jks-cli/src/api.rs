//! HTTP client for the storefront API served by `jks-server`.
//!
//! Responses arrive in the `{ data, meta }` envelope; errors in
//! `{ error: { code, message }, meta }`. Product records are decoded loosely
//! and normalized, so one malformed row never hides the rest of the catalog.

use std::time::Duration;

use jks_core::{normalize_product, Order, OrderDraft, Product, ProductRecord};
use reqwest::{Client, Url};
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid API base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("API returned HTTP {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiClientError {
    /// `true` when the server answered `not_found`.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { code, .. } if code == "not_found")
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

#[derive(Deserialize)]
struct Settings {
    whatsapp_number: String,
}

/// A stored order together with the invoice link the server built for it.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedOrder {
    #[serde(flatten)]
    pub order: Order,
    pub invoice_url: String,
}

pub struct StoreApi {
    client: Client,
    base_url: String,
}

impl StoreApi {
    /// # Errors
    ///
    /// Returns [`ApiClientError::InvalidBaseUrl`] if `base_url` does not parse,
    /// or [`ApiClientError::Http`] if the `reqwest::Client` cannot be built.
    pub fn with_base_url(base_url: &str, timeout_secs: u64) -> Result<Self, ApiClientError> {
        Url::parse(base_url).map_err(|e| ApiClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("jks-cli/0.1")
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Fetches the catalog, cheapest first. Records that fail to normalize
    /// are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError`] on network failure, a non-2xx response, or
    /// an undecodable envelope.
    pub async fn list_products(&self) -> Result<Vec<Product>, ApiClientError> {
        let url = self.url("/api/v1/products");
        let response = self.client.get(&url).send().await?;
        let records: Vec<ProductRecord> = read_data(response, &url).await?;

        let total = records.len();
        let products: Vec<Product> = records
            .into_iter()
            .filter_map(|record| match normalize_product(record) {
                Ok(product) => Some(product),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed product record");
                    None
                }
            })
            .collect();

        tracing::debug!(total, kept = products.len(), "catalog fetched");
        Ok(products)
    }

    /// The contact number orders are handed off to.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError`] if the request fails.
    pub async fn whatsapp_number(&self) -> Result<String, ApiClientError> {
        let url = self.url("/api/v1/settings");
        let response = self.client.get(&url).send().await?;
        let settings: Settings = read_data(response, &url).await?;
        Ok(settings.whatsapp_number)
    }

    /// # Errors
    ///
    /// Returns [`ApiClientError::Api`] when the server rejects the order
    /// (minimum not met, totals inconsistent) or any other request failure.
    pub async fn create_order(&self, draft: &OrderDraft) -> Result<CreatedOrder, ApiClientError> {
        let url = self.url("/api/v1/orders");
        let response = self.client.post(&url).json(draft).send().await?;
        read_data(response, &url).await
    }

    /// # Errors
    ///
    /// Returns [`ApiClientError`] if the request fails; unknown ids surface
    /// as an `Api` error for which [`ApiClientError::is_not_found`] holds.
    pub async fn get_order(&self, id: Uuid) -> Result<Order, ApiClientError> {
        let url = self.url(&format!("/api/v1/orders/{id}"));
        let response = self.client.get(&url).send().await?;
        read_data(response, &url).await
    }

    /// Clears the discount and countdown of `product_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError`] if the request fails.
    pub async fn expire_offer(&self, product_id: i64) -> Result<(), ApiClientError> {
        let url = self.url("/api/v1/offers/expire");
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "id": product_id }))
            .send()
            .await?;
        let _: serde_json::Value = read_data(response, &url).await?;
        Ok(())
    }
}

async fn read_data<T: DeserializeOwned>(
    response: reqwest::Response,
    url: &str,
) -> Result<T, ApiClientError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let (code, message) = match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => (envelope.error.code, envelope.error.message),
            Err(_) => ("unknown".to_string(), body.chars().take(200).collect()),
        };
        return Err(ApiClientError::Api {
            status: status.as_u16(),
            code,
            message,
        });
    }

    serde_json::from_str::<Envelope<T>>(&body)
        .map(|envelope| envelope.data)
        .map_err(|source| ApiClientError::Decode {
            url: url.to_string(),
            source,
        })
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
