use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use storebot_core::Product;
use thiserror::Error;

/// Client-side failure split: the server answered with an error body, or the
/// call never completed (network, timeout, undecodable body). Transport
/// failures degrade to an apology message instead of surfacing raw causes.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("transport failure: {0}")]
    Transport(String),
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CartAddReply {
    pub total_items: u64,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusReply {
    pub order_id: String,
    pub status: String,
    pub eta: String,
}

/// The three storefront operations the classifier can reach. Trait seam so
/// session tests run against a scripted implementation.
#[async_trait]
pub trait StorefrontApi: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<Product>, ClientError>;
    async fn add_to_cart(&self, product_id: &str, qty: u32) -> Result<CartAddReply, ClientError>;
    async fn order_status(
        &self,
        order_id: &str,
        email: &str,
    ) -> Result<OrderStatusReply, ClientError>;
}

/// reqwest-backed implementation with a hard request timeout, so a stalled
/// server cannot leave the session in a permanent typing state.
#[derive(Clone, Debug)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| ClientError::Transport(error.to_string()))?;
        Ok(Self { client, base_url: base_url.into().trim_end_matches('/').to_owned() })
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|error| ClientError::Transport(error.to_string()));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|error| ClientError::Transport(error.to_string()))?;
        Err(ClientError::Api { status: status.as_u16(), message: error_text(&body) })
    }
}

#[async_trait]
impl StorefrontApi for HttpApi {
    async fn search(&self, query: &str) -> Result<Vec<Product>, ClientError> {
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|error| ClientError::Transport(error.to_string()))?;
        Self::decode(response).await
    }

    async fn add_to_cart(&self, product_id: &str, qty: u32) -> Result<CartAddReply, ClientError> {
        let response = self
            .client
            .post(format!("{}/cart/add", self.base_url))
            .json(&serde_json::json!({"productId": product_id, "qty": qty}))
            .send()
            .await
            .map_err(|error| ClientError::Transport(error.to_string()))?;
        Self::decode(response).await
    }

    async fn order_status(
        &self,
        order_id: &str,
        email: &str,
    ) -> Result<OrderStatusReply, ClientError> {
        let response = self
            .client
            .post(format!("{}/order/status", self.base_url))
            .json(&serde_json::json!({"orderId": order_id, "email": email}))
            .send()
            .await
            .map_err(|error| ClientError::Transport(error.to_string()))?;
        Self::decode(response).await
    }
}

/// Flattens a server error body into one displayable line. Field-level
/// validation maps become `field: message` pairs.
fn error_text(body: &Value) -> String {
    match body.get("error") {
        Some(Value::String(message)) => message.clone(),
        Some(Value::Object(fields)) => {
            let mut parts = Vec::new();
            for (field, messages) in fields {
                match messages {
                    Value::Array(list) => {
                        for message in list {
                            if let Value::String(message) = message {
                                parts.push(format!("{field}: {message}"));
                            }
                        }
                    }
                    Value::String(message) => parts.push(format!("{field}: {message}")),
                    _ => {}
                }
            }
            if parts.is_empty() {
                "Could not complete the request.".to_owned()
            } else {
                parts.join(" ")
            }
        }
        _ => "Could not complete the request.".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::error_text;

    #[test]
    fn string_errors_pass_through() {
        assert_eq!(error_text(&json!({"error": "Order not found."})), "Order not found.");
    }

    #[test]
    fn field_error_maps_flatten_to_one_line() {
        let body = json!({"error": {"qty": ["Quantity must be at least 1."]}});
        assert_eq!(error_text(&body), "qty: Quantity must be at least 1.");
    }

    #[test]
    fn bodies_without_an_error_field_get_a_generic_line() {
        assert_eq!(error_text(&json!({})), "Could not complete the request.");
    }
}
