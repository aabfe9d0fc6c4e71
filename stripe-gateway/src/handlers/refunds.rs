use axum::{
    extract::{Path, State},
    Json,
};
use service_core::error::AppError;

use super::provider_error;
use crate::dtos::CreateRefundResponse;
use crate::startup::AppState;

/// Refund a charge in full. Every call creates a new refund.
#[tracing::instrument(skip(state))]
pub async fn create_refund(
    State(state): State<AppState>,
    Path(charge_id): Path<String>,
) -> Result<Json<CreateRefundResponse>, AppError> {
    tracing::info!(charge_id = %charge_id, "Creating refund");

    let refund = state
        .provider
        .create_refund(&charge_id)
        .await
        .map_err(|e| provider_error(state.config.error_mode, e))?;

    Ok(Json(CreateRefundResponse { refund }))
}
