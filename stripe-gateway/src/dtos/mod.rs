use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::{CreatePaymentIntent, PaymentIntent, Refund};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateIntentRequest {
    /// Amount in the smallest currency unit.
    #[validate(required(message = "amount is required"))]
    pub amount: Option<i64>,
    #[validate(required(message = "currency is required"))]
    pub currency: Option<String>,
    pub automatic_payment_methods: Option<serde_json::Value>,
}

impl CreateIntentRequest {
    /// Provider parameters; `None` unless the request passed validation.
    pub fn to_params(&self) -> Option<CreatePaymentIntent> {
        Some(CreatePaymentIntent {
            amount: self.amount?,
            currency: self.currency.clone()?,
            automatic_payment_methods: self.automatic_payment_methods.clone(),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentResponse {
    pub client_secret: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureIntentResponse {
    pub payment_intent: PaymentIntent,
}

#[derive(Debug, Serialize)]
pub struct CreateRefundResponse {
    pub refund: Refund,
}

#[derive(Debug, Serialize)]
pub struct ListIntentsResponse {
    pub intents: Vec<PaymentIntent>,
}
