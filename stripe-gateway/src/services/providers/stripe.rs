//! Stripe payment provider client.
//!
//! Talks to Stripe's REST API with form-encoded requests and bearer-key
//! authentication. Only the four calls the gateway forwards are implemented.

use super::{CreatePaymentIntent, List, PaymentIntent, PaymentProvider, ProviderError, Refund};
use crate::config::StripeConfig;
use crate::services::metrics::record_provider_call;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Stripe's own client libraries give up on a request after 80 seconds.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(80);

#[derive(Clone)]
pub struct StripeProvider {
    client: Client,
    config: StripeConfig,
}

/// Stripe API error envelope.
#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    #[serde(rename = "type", default)]
    error_type: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    param: Option<String>,
}

impl StripeProvider {
    pub fn new(config: StripeConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Connection(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::Authentication(
                "No API key provided. Set STRIPE_API_KEY to your Stripe secret key.".to_string(),
            ));
        }

        let request = request.bearer_auth(self.config.api_key.expose_secret());
        Ok(match &self.config.api_version {
            Some(version) => request.header("Stripe-Version", version),
            None => request,
        })
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, ProviderError> {
        let result = self.send(operation, request).await;
        record_provider_call(
            operation,
            match &result {
                Ok(_) => "success",
                Err(e) => e.kind(),
            },
        );
        result
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, ProviderError> {
        let response = self.authorized(request)?.send().await.map_err(|e| {
            tracing::error!(operation, error = %e, "Stripe request failed");
            ProviderError::Connection(format!("Error communicating with Stripe: {}", e))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ProviderError::Connection(format!("Failed to read Stripe response: {}", e))
        })?;

        tracing::debug!(operation, status = %status, "Stripe response received");

        if status.is_success() {
            serde_json::from_str(&body).map_err(|e| {
                tracing::error!(operation, error = %e, "Unexpected Stripe response body");
                ProviderError::InvalidResponse(format!("Invalid response from Stripe: {}", e))
            })
        } else {
            let error = parse_error(status, &body);
            tracing::warn!(
                operation,
                status = %status,
                kind = error.kind(),
                reason = %error,
                "Stripe rejected request"
            );
            Err(error)
        }
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    async fn create_payment_intent(
        &self,
        params: &CreatePaymentIntent,
    ) -> Result<PaymentIntent, ProviderError> {
        let mut form = vec![
            ("amount".to_string(), params.amount.to_string()),
            ("currency".to_string(), params.currency.clone()),
        ];
        if let Some(methods) = &params.automatic_payment_methods {
            encode_form_value("automatic_payment_methods", methods, &mut form);
        }

        let request = self.client.post(self.url("payment_intents")).form(&form);
        let intent: PaymentIntent = self.execute("create_payment_intent", request).await?;

        tracing::info!(
            intent_id = %intent.id,
            amount = intent.amount,
            currency = %intent.currency,
            "Stripe payment intent created"
        );
        Ok(intent)
    }

    async fn capture_payment_intent(
        &self,
        intent_id: &str,
    ) -> Result<PaymentIntent, ProviderError> {
        let path = format!("payment_intents/{}/capture", urlencoding::encode(intent_id));
        let request = self.client.post(self.url(&path));
        let intent: PaymentIntent = self.execute("capture_payment_intent", request).await?;

        tracing::info!(intent_id = %intent.id, status = ?intent.status, "Stripe payment intent captured");
        Ok(intent)
    }

    async fn create_refund(&self, charge_id: &str) -> Result<Refund, ProviderError> {
        let request = self
            .client
            .post(self.url("refunds"))
            .form(&[("charge", charge_id)]);
        let refund: Refund = self.execute("create_refund", request).await?;

        tracing::info!(
            refund_id = %refund.id,
            charge_id = %charge_id,
            amount = refund.amount,
            "Stripe refund created"
        );
        Ok(refund)
    }

    async fn list_payment_intents(&self) -> Result<Vec<PaymentIntent>, ProviderError> {
        let request = self.client.get(self.url("payment_intents"));
        let page: List<PaymentIntent> = self.execute("list_payment_intents", request).await?;

        tracing::debug!(count = page.data.len(), has_more = page.has_more, "Stripe payment intents listed");
        Ok(page.data)
    }

    fn is_configured(&self) -> bool {
        self.config.has_api_key()
    }
}

/// Flatten a JSON value into Stripe's bracketed form keys,
/// e.g. `automatic_payment_methods[enabled]=true`. Nulls are dropped.
fn encode_form_value(key: &str, value: &Value, form: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => form.push((key.to_string(), b.to_string())),
        Value::Number(n) => form.push((key.to_string(), n.to_string())),
        Value::String(s) => form.push((key.to_string(), s.clone())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                encode_form_value(&format!("{}[{}]", key, index), item, form);
            }
        }
        Value::Object(fields) => {
            for (name, item) in fields {
                encode_form_value(&format!("{}[{}]", key, name), item, form);
            }
        }
    }
}

/// Classify a non-2xx Stripe response.
///
/// The HTTP status decides the category; the body's `error.type` breaks ties
/// for statuses Stripe does not document.
fn parse_error(status: StatusCode, body: &str) -> ProviderError {
    let detail = serde_json::from_str::<StripeErrorBody>(body)
        .ok()
        .map(|parsed| parsed.error);

    let message = detail
        .as_ref()
        .and_then(|d| d.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("Stripe returned HTTP {}", status.as_u16())
            } else {
                format!("Stripe returned HTTP {}: {}", status.as_u16(), body.trim())
            }
        });

    if let Some(d) = &detail {
        tracing::debug!(
            error_type = ?d.error_type,
            code = ?d.code,
            param = ?d.param,
            "Stripe error detail"
        );
    }

    match status {
        StatusCode::BAD_REQUEST => ProviderError::InvalidRequest(message),
        StatusCode::UNAUTHORIZED => ProviderError::Authentication(message),
        StatusCode::PAYMENT_REQUIRED => ProviderError::Card(message),
        StatusCode::FORBIDDEN => ProviderError::Permission(message),
        StatusCode::NOT_FOUND => ProviderError::NotFound(message),
        StatusCode::CONFLICT => ProviderError::Conflict(message),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited(message),
        _ => match detail.as_ref().and_then(|d| d.error_type.as_deref()) {
            Some("card_error") => ProviderError::Card(message),
            Some("idempotency_error") => ProviderError::Conflict(message),
            Some("invalid_request_error") if status.is_client_error() => {
                ProviderError::InvalidRequest(message)
            }
            _ => ProviderError::Api(message),
        },
    }
}
