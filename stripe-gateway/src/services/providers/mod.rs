pub mod mock;
pub mod stripe;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use mock::MockPaymentProvider;
pub use stripe::StripeProvider;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    Permission(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Card(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    RateLimited(String),

    #[error("{0}")]
    Api(String),

    #[error("{0}")]
    Connection(String),

    #[error("{0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Short label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::InvalidRequest(_) => "invalid_request",
            ProviderError::Authentication(_) => "authentication",
            ProviderError::Permission(_) => "permission",
            ProviderError::NotFound(_) => "not_found",
            ProviderError::Card(_) => "card",
            ProviderError::Conflict(_) => "conflict",
            ProviderError::RateLimited(_) => "rate_limited",
            ProviderError::Api(_) => "api",
            ProviderError::Connection(_) => "connection",
            ProviderError::InvalidResponse(_) => "invalid_response",
        }
    }
}

/// Parameters for creating a payment intent.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatePaymentIntent {
    /// Amount in the smallest currency unit (cents for USD).
    pub amount: i64,
    pub currency: String,
    /// Forwarded as-is, e.g. `{"enabled": true}`.
    pub automatic_payment_methods: Option<Value>,
}

/// A payment intent as returned by the provider.
///
/// Fields the gateway reads are typed; everything else is kept in `extra` so
/// the object relays unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentIntent {
    pub id: String,
    #[serde(default = "payment_intent_object")]
    pub object: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn payment_intent_object() -> String {
    "payment_intent".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Refund {
    pub id: String,
    #[serde(default = "refund_object")]
    pub object: String,
    pub amount: i64,
    #[serde(default)]
    pub charge: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn refund_object() -> String {
    "refund".to_string()
}

/// One page of a provider list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct List<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_payment_intent(
        &self,
        params: &CreatePaymentIntent,
    ) -> Result<PaymentIntent, ProviderError>;

    async fn capture_payment_intent(&self, intent_id: &str)
        -> Result<PaymentIntent, ProviderError>;

    async fn create_refund(&self, charge_id: &str) -> Result<Refund, ProviderError>;

    async fn list_payment_intents(&self) -> Result<Vec<PaymentIntent>, ProviderError>;

    fn is_configured(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payment_intent_relays_unknown_fields() {
        let raw = json!({
            "id": "pi_123",
            "object": "payment_intent",
            "amount": 1000,
            "currency": "usd",
            "status": "requires_payment_method",
            "client_secret": "pi_123_secret_abc",
            "livemode": false,
            "metadata": {"order": "42"}
        });

        let intent: PaymentIntent = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(intent.client_secret.as_deref(), Some("pi_123_secret_abc"));
        assert_eq!(intent.extra["livemode"], json!(false));

        assert_eq!(serde_json::to_value(&intent).unwrap(), raw);
    }

    #[test]
    fn refund_keeps_charge_id() {
        let refund: Refund = serde_json::from_value(json!({
            "id": "re_1",
            "object": "refund",
            "amount": 500,
            "charge": "ch_1",
            "status": "succeeded"
        }))
        .unwrap();

        assert_eq!(refund.charge.as_deref(), Some("ch_1"));
        assert!(refund.extra.is_empty());
    }

    #[test]
    fn error_display_is_the_provider_message() {
        let err = ProviderError::NotFound("No such payment_intent: 'pi_invalid'".to_string());
        assert_eq!(err.to_string(), "No such payment_intent: 'pi_invalid'");
        assert_eq!(err.kind(), "not_found");
    }
}
