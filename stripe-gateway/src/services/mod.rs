pub mod metrics;
pub mod providers;

pub use metrics::{get_metrics, init_metrics, record_provider_call};
pub use providers::{
    CreatePaymentIntent, MockPaymentProvider, PaymentIntent, PaymentProvider, ProviderError,
    Refund, StripeProvider,
};
