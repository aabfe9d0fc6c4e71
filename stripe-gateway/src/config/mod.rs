use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

pub const DEFAULT_STRIPE_API_BASE_URL: &str = "https://api.stripe.com/v1";

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(flatten)]
    pub server: core_config::Config,
    pub stripe: StripeConfig,
    pub error_mode: ErrorMode,
    pub observability: ObservabilityConfig,
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeConfig {
    /// Secret key used for every outbound call. Empty means unconfigured.
    pub api_key: Secret<String>,
    pub api_base_url: String,
    /// Pinned `Stripe-Version`; the account default applies when unset.
    pub api_version: Option<String>,
}

impl StripeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            api_base_url: DEFAULT_STRIPE_API_BASE_URL.to_string(),
            api_version: None,
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.expose_secret().is_empty()
    }
}

/// How provider failures are turned into HTTP statuses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    /// Every provider failure becomes a 403.
    #[default]
    Uniform,
    /// Each provider error category gets its own status.
    Mapped,
}

impl FromStr for ErrorMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uniform" => Ok(ErrorMode::Uniform),
            "mapped" => Ok(ErrorMode::Mapped),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "PROVIDER_ERROR_MODE must be 'uniform' or 'mapped', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            otlp_endpoint: None,
        }
    }
}

impl GatewayConfig {
    pub fn load() -> Result<Self, AppError> {
        let server = core_config::Config::load()?;

        let error_mode = match env::var("PROVIDER_ERROR_MODE") {
            Ok(value) => value.parse()?,
            Err(_) => ErrorMode::default(),
        };

        Ok(GatewayConfig {
            server,
            stripe: StripeConfig {
                api_key: Secret::new(env::var("STRIPE_API_KEY").unwrap_or_default()),
                api_base_url: env::var("STRIPE_API_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_STRIPE_API_BASE_URL.to_string()),
                api_version: env::var("STRIPE_API_VERSION")
                    .ok()
                    .filter(|v| !v.is_empty()),
            },
            error_mode,
            observability: ObservabilityConfig {
                log_level: env::var("LOG_LEVEL")
                    .unwrap_or_else(|_| "info,stripe_gateway=debug".to_string()),
                otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty()),
            },
            service_name: "stripe-gateway".to_string(),
        })
    }
}
