//! Stripe Checkout Integration
//!
//! Implements the "Stripe Checkout (Hosted)" approach: the server creates a
//! session for a catalog price and hands the session ID back to the browser,
//! which redirects to Stripe's hosted page.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stripe::{
    CheckoutSession as StripeCheckoutSession, CheckoutSessionMode, Client,
    CreateCheckoutSession, CreateCheckoutSessionLineItems,
};

use crate::error::{PaymentError, Result};
use crate::plan::{CheckoutMode, Plan};
use crate::provider::{PaymentProvider, ProviderSession, SessionParams};

/// Stripe client wrapper
pub struct StripeClient {
    client: Client,
}

impl StripeClient {
    /// Create a new Stripe client
    pub fn new(secret_key: &str) -> Self {
        Self {
            client: Client::new(secret_key),
        }
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_checkout_session(&self, request: &SessionParams) -> Result<ProviderSession> {
        let mut params = CreateCheckoutSession::new();
        params.success_url = Some(request.success_url.as_str());
        params.cancel_url = Some(request.cancel_url.as_str());
        params.mode = Some(match request.mode {
            CheckoutMode::Subscription => CheckoutSessionMode::Subscription,
            CheckoutMode::Payment => CheckoutSessionMode::Payment,
        });
        params.metadata = Some(request.metadata.clone());
        params.line_items = Some(vec![CreateCheckoutSessionLineItems {
            price: Some(request.price_id.clone()),
            quantity: Some(request.quantity),
            ..Default::default()
        }]);

        let session = StripeCheckoutSession::create(&self.client, params)
            .await
            .map_err(|e| PaymentError::Provider(e.to_string()))?;

        Ok(ProviderSession {
            id: session.id.to_string(),
        })
    }

    fn name(&self) -> &str {
        "stripe"
    }
}

/// Request to create a checkout session, as posted by the browser
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Catalog price to purchase
    #[serde(default)]
    pub price_id: Option<String>,

    /// `"subscription"` (default) or `"payment"`
    #[serde(default)]
    pub mode: Option<String>,
}

impl CheckoutRequest {
    pub fn new(price_id: impl Into<String>, mode: Option<CheckoutMode>) -> Self {
        Self {
            price_id: Some(price_id.into()),
            mode: mode.map(|m| m.as_str().to_string()),
        }
    }
}

/// Result of creating a checkout session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Stripe session ID
    pub id: String,

    pub mode: CheckoutMode,

    /// Plan recorded in the session metadata
    pub plan: Plan,
}

/// Creates checkout sessions against an injected provider
pub struct CheckoutService {
    provider: Arc<dyn PaymentProvider>,
    base_url: String,
}

impl CheckoutService {
    /// `base_url` is the public origin used for redirect URLs
    pub fn new(provider: Arc<dyn PaymentProvider>, base_url: impl Into<String>) -> Self {
        Self {
            provider,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn success_url(&self) -> String {
        format!("{}/dashboard?success=true", self.base_url)
    }

    pub fn cancel_url(&self) -> String {
        format!("{}/pricing?canceled=true", self.base_url)
    }

    /// Build provider parameters for a request.
    ///
    /// Fails with [`PaymentError::Validation`] when `priceId` is absent or empty.
    pub fn session_params(&self, request: &CheckoutRequest) -> Result<SessionParams> {
        let price_id = request
            .price_id
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| PaymentError::Validation("Price ID is required".into()))?;

        let mode = CheckoutMode::from_request(request.mode.as_deref());

        let mut metadata = HashMap::new();
        metadata.insert(Plan::METADATA_KEY.to_string(), mode.plan().as_str().to_string());

        Ok(SessionParams {
            mode,
            price_id: price_id.to_string(),
            quantity: 1,
            success_url: self.success_url(),
            cancel_url: self.cancel_url(),
            metadata,
        })
    }

    /// Validate the request and create a session with the provider
    pub async fn create_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession> {
        let params = self.session_params(request)?;
        let plan = params.mode.plan();

        let session = self
            .provider
            .create_checkout_session(&params)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    provider = self.provider.name(),
                    price_id = %params.price_id,
                    error = %e,
                    "Error creating checkout session"
                );
            })?;

        tracing::info!(
            session_id = %session.id,
            plan = %plan,
            mode = params.mode.as_str(),
            "Created checkout session"
        );

        Ok(CheckoutSession {
            id: session.id,
            mode: params.mode,
            plan,
        })
    }
}
