//! Payment Provider Strategy
//!
//! Checkout code talks to Stripe through [`PaymentProvider`] so that
//! handlers receive an explicitly constructed client and tests can swap
//! in [`MockPaymentProvider`].

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{PaymentError, Result};
use crate::plan::CheckoutMode;

/// Everything the provider needs to open a hosted checkout session
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionParams {
    pub mode: CheckoutMode,

    /// Catalog price identifier
    pub price_id: String,

    pub quantity: u64,

    /// URL to redirect after successful payment
    pub success_url: String,

    /// URL to redirect if checkout is cancelled
    pub cancel_url: String,

    pub metadata: HashMap<String, String>,
}

/// Session as returned by the provider
#[derive(Clone, Debug)]
pub struct ProviderSession {
    /// Opaque session ID (`cs_...`)
    pub id: String,
}

/// Payment provider interface
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a hosted checkout session
    async fn create_checkout_session(&self, params: &SessionParams) -> Result<ProviderSession>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// In-process provider that records every request.
///
/// For tests and local development without Stripe credentials.
#[derive(Default)]
pub struct MockPaymentProvider {
    calls: Mutex<Vec<SessionParams>>,
    failure: Option<String>,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider whose every call fails with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failure: Some(message.into()),
        }
    }

    /// Requests received so far, in order
    pub async fn calls(&self) -> Vec<SessionParams> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_checkout_session(&self, params: &SessionParams) -> Result<ProviderSession> {
        self.calls.lock().await.push(params.clone());

        if let Some(message) = &self.failure {
            return Err(PaymentError::Provider(message.clone()));
        }

        Ok(ProviderSession {
            id: format!("cs_test_{}", uuid::Uuid::new_v4().simple()),
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}
