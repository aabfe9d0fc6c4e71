//! Payment intent handlers: create, capture and list.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use service_core::error::AppError;
use validator::Validate;

use super::provider_error;
use crate::dtos::{
    CaptureIntentResponse, CreateIntentRequest, CreateIntentResponse, ListIntentsResponse,
};
use crate::startup::AppState;

/// Create a payment intent and hand back its client secret.
#[tracing::instrument(skip(state, payload))]
pub async fn create_intent(
    State(state): State<AppState>,
    payload: Result<Json<CreateIntentRequest>, JsonRejection>,
) -> Result<Json<CreateIntentResponse>, AppError> {
    let Json(request) = payload?;
    request.validate()?;

    let params = request.to_params().ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!("amount and currency are required"))
    })?;

    tracing::info!(
        amount = params.amount,
        currency = %params.currency,
        "Creating payment intent"
    );

    let intent = state
        .provider
        .create_payment_intent(&params)
        .await
        .map_err(|e| provider_error(state.config.error_mode, e))?;

    let client_secret = intent.client_secret.ok_or_else(|| {
        tracing::error!(intent_id = %intent.id, "Payment intent has no client secret");
        AppError::BadGateway("Payment intent response did not include a client secret".to_string())
    })?;

    Ok(Json(CreateIntentResponse { client_secret }))
}

/// Capture a previously authorized payment intent.
#[tracing::instrument(skip(state))]
pub async fn capture_intent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CaptureIntentResponse>, AppError> {
    tracing::info!(intent_id = %id, "Capturing payment intent");

    let payment_intent = state
        .provider
        .capture_payment_intent(&id)
        .await
        .map_err(|e| provider_error(state.config.error_mode, e))?;

    Ok(Json(CaptureIntentResponse { payment_intent }))
}

/// List payment intents (the provider's first page).
#[tracing::instrument(skip(state))]
pub async fn get_intents(
    State(state): State<AppState>,
) -> Result<Json<ListIntentsResponse>, AppError> {
    let intents = state
        .provider
        .list_payment_intents()
        .await
        .map_err(|e| provider_error(state.config.error_mode, e))?;

    tracing::debug!(count = intents.len(), "Listed payment intents");

    Ok(Json(ListIntentsResponse { intents }))
}
