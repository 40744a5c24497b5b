//! Application State

use std::sync::Arc;

use starter_payments::{
    CheckoutService, EventLog, LoggingSubscriptionEvents, MemoryEventLog, PaymentProvider,
    StripeClient, StripeConfig, SubscriptionEvents, WebhookHandler, WebhookVerifier,
};

use crate::config::ServerConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Checkout session creation
    pub checkout: Arc<CheckoutService>,

    /// Webhook signature verification
    pub verifier: Arc<WebhookVerifier>,

    /// Webhook dispatch
    pub webhooks: Arc<WebhookHandler>,

    /// Publishable key served to the browser
    pub publishable_key: Arc<str>,
}

impl AppState {
    /// Assemble state from explicit collaborators
    pub fn new(
        stripe: &StripeConfig,
        base_url: &str,
        provider: Arc<dyn PaymentProvider>,
        events: Arc<dyn SubscriptionEvents>,
        event_log: Arc<dyn EventLog>,
    ) -> Self {
        Self {
            checkout: Arc::new(CheckoutService::new(provider, base_url)),
            verifier: Arc::new(
                WebhookVerifier::new(&stripe.webhook_secret).with_tolerance(stripe.webhook_tolerance),
            ),
            webhooks: Arc::new(WebhookHandler::new(events, event_log)),
            publishable_key: stripe.publishable_key.as_str().into(),
        }
    }

    /// Production wiring: live Stripe client, logging handlers, in-memory event log
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            &config.stripe,
            &config.base_url,
            Arc::new(StripeClient::new(&config.stripe.secret_key)),
            Arc::new(LoggingSubscriptionEvents),
            Arc::new(MemoryEventLog::new()),
        )
    }
}
