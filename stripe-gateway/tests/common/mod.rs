#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use secrecy::Secret;
use service_core::config::Config as ServerConfig;
use std::sync::Arc;
use stripe_gateway::config::{ErrorMode, GatewayConfig, ObservabilityConfig, StripeConfig};
use stripe_gateway::services::{MockPaymentProvider, PaymentProvider, StripeProvider};
use stripe_gateway::{build_router, AppState, Application};
use tower::util::ServiceExt;

pub const TEST_API_KEY: &str = "sk_test_gateway";

pub fn test_config(stripe: StripeConfig, error_mode: ErrorMode) -> GatewayConfig {
    GatewayConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Random port
        },
        stripe,
        error_mode,
        observability: ObservabilityConfig::default(),
        service_name: "stripe-gateway-test".to_string(),
    }
}

pub fn stripe_config(base_url: &str) -> StripeConfig {
    StripeConfig {
        api_key: Secret::new(TEST_API_KEY.to_string()),
        api_base_url: base_url.to_string(),
        api_version: None,
    }
}

/// Router backed by an in-memory provider.
pub fn mock_router(provider: Arc<MockPaymentProvider>, error_mode: ErrorMode) -> Router {
    let config = test_config(StripeConfig::new(TEST_API_KEY), error_mode);
    build_router(AppState::new(config, provider))
}

/// Router backed by the real Stripe client pointed at `base_url`.
pub fn stripe_router(base_url: &str, error_mode: ErrorMode) -> Router {
    let stripe = stripe_config(base_url);
    let provider: Arc<dyn PaymentProvider> =
        Arc::new(StripeProvider::new(stripe.clone()).expect("Failed to build Stripe client"));
    build_router(AppState::new(test_config(stripe, error_mode), provider))
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to execute request");

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
    };

    (status, json)
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
}

impl TestApp {
    /// Serve the gateway on a random local port.
    pub async fn spawn(provider: Arc<dyn PaymentProvider>) -> Self {
        let config = test_config(StripeConfig::new(TEST_API_KEY), ErrorMode::Uniform);
        let app = Application::build_with_provider(config, provider)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to accept connections
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp { address, port }
    }
}
