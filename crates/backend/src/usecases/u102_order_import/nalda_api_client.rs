use std::time::Duration;

use contracts::usecases::u102_order_import::OrderFetchRequest;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::config::NaldaConfig;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Nalda API key is not configured.")]
    NotConfigured,
    #[error("invalid request parameters: {0}")]
    InvalidParams(String),
    #[error("Nalda API error ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unexpected response body: {0}")]
    Decode(String),
}

/// Every Nalda endpoint wraps its payload in the same envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    result: Option<T>,
    message: Option<String>,
}

/// Order header as returned by POST /orders.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NaldaOrder {
    pub order_id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub street1: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub payout_status: String,
    #[serde(default)]
    pub commission: f64,
    #[serde(default)]
    pub fee: f64,
    pub collection_id: Option<String>,
    pub collection_name: Option<String>,
    #[serde(default)]
    pub refund: f64,
}

/// Order line as returned by POST /orders/items. `price` is the line
/// amount, tax inclusive.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NaldaOrderItem {
    pub order_id: i64,
    #[serde(default)]
    pub gtin: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub price: f64,
    pub condition: Option<String>,
    pub delivery_status: Option<String>,
    pub delivery_date_planned: Option<String>,
}

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Serialize)]
struct RangeBody<'a> {
    range: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    to: Option<String>,
}

/// Thin client for the Nalda seller API. All endpoints authenticate
/// with an X-API-KEY header.
pub struct NaldaApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NaldaApiClient {
    pub fn new(config: &NaldaConfig) -> Result<Self, ApiError> {
        if config.api_key.trim().is_empty() {
            return Err(ApiError::NotConfigured);
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn is_configured(config: &NaldaConfig) -> bool {
        !config.api_key.trim().is_empty() && !config.api_url.trim().is_empty()
    }

    async fn unwrap_envelope<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<Option<T>, ApiError> {
        let status = response.status();
        let body = response.text().await?;
        let envelope: Envelope<T> = serde_json::from_str(&body)
            .map_err(|e| ApiError::Decode(format!("{e} in: {}", truncate(&body, 200))))?;

        if status.as_u16() >= 400 || !envelope.success {
            let message = envelope
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            });
        }
        Ok(envelope.result)
    }

    async fn post_range<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        request: &OrderFetchRequest,
    ) -> Result<Vec<T>, ApiError> {
        request.validate().map_err(ApiError::InvalidParams)?;

        let body = RangeBody {
            range: request.range.code(),
            from: request.from.map(|d| d.format("%Y-%m-%d").to_string()),
            to: request.to.map(|d| d.format("%Y-%m-%d").to_string()),
        };
        let response = self
            .client
            .post(format!("{}{}", self.base_url, endpoint))
            .header("X-API-KEY", &self.api_key)
            .json(&body)
            .send()
            .await?;

        Ok(Self::unwrap_envelope::<Vec<T>>(response)
            .await?
            .unwrap_or_default())
    }

    /// Cheap reachability and key check.
    pub async fn health_check(&self) -> Result<(), ApiError> {
        let response = self
            .client
            .get(format!("{}/health-check", self.base_url))
            .header("X-API-KEY", &self.api_key)
            .send()
            .await?;
        Self::unwrap_envelope::<serde_json::Value>(response).await?;
        Ok(())
    }

    /// Health check wrapped into a displayable message.
    pub async fn test_connection(&self) -> Result<String, ApiError> {
        self.health_check().await?;
        Ok(format!("Nalda API reachable at {}", self.base_url))
    }

    pub async fn fetch_orders(
        &self,
        request: &OrderFetchRequest,
    ) -> Result<Vec<NaldaOrder>, ApiError> {
        self.post_range("/orders", request).await
    }

    pub async fn fetch_order_items(
        &self,
        request: &OrderFetchRequest,
    ) -> Result<Vec<NaldaOrderItem>, ApiError> {
        self.post_range("/orders/items", request).await
    }

    /// Fetch orders and their items for the same window. The calls are
    /// sequential and the first failure fails the whole fetch.
    pub async fn fetch_orders_with_items(
        &self,
        request: &OrderFetchRequest,
    ) -> Result<(Vec<NaldaOrder>, Vec<NaldaOrderItem>), ApiError> {
        let orders = self.fetch_orders(request).await?;
        let items = self.fetch_order_items(request).await?;
        Ok((orders, items))
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::enums::DateRange;

    fn config(key: &str) -> NaldaConfig {
        NaldaConfig {
            api_url: "https://api.nalda.test/v1/".into(),
            api_key: key.into(),
            timeout_secs: 30,
        }
    }

    #[test]
    fn missing_api_key_fails_fast() {
        assert!(matches!(
            NaldaApiClient::new(&config("")),
            Err(ApiError::NotConfigured)
        ));
        assert!(NaldaApiClient::new(&config("k-123")).is_ok());
        assert!(!NaldaApiClient::is_configured(&config("  ")));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = NaldaApiClient::new(&config("k-123")).unwrap();
        assert_eq!(client.base_url, "https://api.nalda.test/v1");
    }

    #[test]
    fn range_body_omits_absent_bounds() {
        let body = RangeBody {
            range: DateRange::Last3Months.code(),
            from: None,
            to: None,
        };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"range":"3m"}"#);

        let body = RangeBody {
            range: DateRange::Custom.code(),
            from: Some("2025-01-01".into()),
            to: Some("2025-01-31".into()),
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"range":"custom","from":"2025-01-01","to":"2025-01-31"}"#
        );
    }

    #[test]
    fn envelope_and_items_decode() {
        let body = r#"{
            "success": true,
            "result": [
                {"orderId": 9001, "gtin": "4006381333931", "title": "Pen", "price": 12.5, "deliveryStatus": "IN_DELIVERY"}
            ]
        }"#;
        let envelope: Envelope<Vec<NaldaOrderItem>> = serde_json::from_str(body).unwrap();
        assert!(envelope.success);
        let items = envelope.result.unwrap();
        assert_eq!(items[0].order_id, 9001);
        assert_eq!(items[0].quantity, 1);
        assert_eq!(items[0].delivery_status.as_deref(), Some("IN_DELIVERY"));
    }
}
