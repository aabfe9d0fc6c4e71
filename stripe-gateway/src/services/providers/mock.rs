use super::{CreatePaymentIntent, PaymentIntent, PaymentProvider, ProviderError, Refund};
use async_trait::async_trait;
use serde_json::Map;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// In-memory provider for tests and local runs without Stripe credentials.
///
/// Issues sequential ids, remembers created intents for capture/list, and can
/// be told to fail every call with a fixed error.
pub struct MockPaymentProvider {
    configured: bool,
    sequence: AtomicU64,
    intents: Mutex<Vec<PaymentIntent>>,
    fail_with: Mutex<Option<ProviderError>>,
}

impl MockPaymentProvider {
    pub fn new(configured: bool) -> Self {
        Self {
            configured,
            sequence: AtomicU64::new(0),
            intents: Mutex::new(Vec::new()),
            fail_with: Mutex::new(None),
        }
    }

    /// Make every subsequent call return `error`.
    pub fn fail_with(&self, error: ProviderError) {
        *self.fail_with.lock().unwrap_or_else(|e| e.into_inner()) = Some(error);
    }

    fn next_id(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn check(&self) -> Result<(), ProviderError> {
        let failure = self.fail_with.lock().unwrap_or_else(|e| e.into_inner());
        match failure.as_ref() {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_payment_intent(
        &self,
        params: &CreatePaymentIntent,
    ) -> Result<PaymentIntent, ProviderError> {
        self.check()?;
        let id = format!("pi_mock{}", self.next_id());

        let intent = PaymentIntent {
            client_secret: Some(format!("{}_secret_mock", id)),
            id,
            object: "payment_intent".to_string(),
            amount: params.amount,
            currency: params.currency.to_lowercase(),
            status: Some("requires_payment_method".to_string()),
            extra: Map::new(),
        };

        tracing::info!(intent_id = %intent.id, "[MOCK] Payment intent created");
        self.intents
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(intent.clone());
        Ok(intent)
    }

    async fn capture_payment_intent(
        &self,
        intent_id: &str,
    ) -> Result<PaymentIntent, ProviderError> {
        self.check()?;

        let mut intents = self.intents.lock().unwrap_or_else(|e| e.into_inner());
        let intent = intents
            .iter_mut()
            .find(|intent| intent.id == intent_id)
            .ok_or_else(|| {
                ProviderError::NotFound(format!("No such payment_intent: '{}'", intent_id))
            })?;

        intent.status = Some("succeeded".to_string());
        Ok(intent.clone())
    }

    async fn create_refund(&self, charge_id: &str) -> Result<Refund, ProviderError> {
        self.check()?;
        if !charge_id.starts_with("ch_") {
            return Err(ProviderError::NotFound(format!(
                "No such charge: '{}'",
                charge_id
            )));
        }

        Ok(Refund {
            id: format!("re_mock{}", self.next_id()),
            object: "refund".to_string(),
            amount: 0,
            charge: Some(charge_id.to_string()),
            currency: None,
            status: Some("succeeded".to_string()),
            extra: Map::new(),
        })
    }

    async fn list_payment_intents(&self) -> Result<Vec<PaymentIntent>, ProviderError> {
        self.check()?;
        Ok(self
            .intents
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .rev()
            .cloned()
            .collect())
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}
