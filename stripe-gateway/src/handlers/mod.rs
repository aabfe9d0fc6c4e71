//! HTTP handlers for stripe-gateway.

pub mod intents;
pub mod refunds;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use service_core::error::AppError;

use crate::config::ErrorMode;
use crate::services::{get_metrics, ProviderError};
use crate::startup::AppState;

/// Health check endpoint for liveness probes.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": state.config.service_name,
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Readiness check. Not ready while no provider credentials are configured.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    if state.provider.is_configured() {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unconfigured" })),
        )
    }
}

/// Prometheus metrics endpoint.
pub async fn metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}

/// Turn a provider failure into the HTTP error the caller sees.
pub fn provider_error(mode: ErrorMode, err: ProviderError) -> AppError {
    let message = err.to_string();
    match mode {
        ErrorMode::Uniform => AppError::Forbidden(anyhow::anyhow!(message)),
        ErrorMode::Mapped => match err {
            ProviderError::InvalidRequest(_) => AppError::BadRequest(anyhow::anyhow!(message)),
            ProviderError::Authentication(_) => AppError::Unauthorized(anyhow::anyhow!(message)),
            ProviderError::Permission(_) => AppError::Forbidden(anyhow::anyhow!(message)),
            ProviderError::NotFound(_) => AppError::NotFound(anyhow::anyhow!(message)),
            ProviderError::Card(_) => AppError::PaymentRequired(anyhow::anyhow!(message)),
            ProviderError::Conflict(_) => AppError::Conflict(anyhow::anyhow!(message)),
            ProviderError::RateLimited(_) => AppError::TooManyRequests(message, None),
            ProviderError::Api(_)
            | ProviderError::Connection(_)
            | ProviderError::InvalidResponse(_) => AppError::BadGateway(message),
        },
    }
}
