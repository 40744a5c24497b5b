//! Checkout Trigger
//!
//! `Idle → Loading → Redirecting`, or back to `Idle` after an alert.
//! The browser-specific steps sit behind [`CheckoutDriver`] so the flow
//! runs the same against Stripe.js and against a fake in tests.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Alert shown when Stripe reports a redirect error
pub const REDIRECT_ALERT: &str = "Something went wrong with the checkout. Please try again.";

/// Alert shown for every other failure
pub const GENERIC_ALERT: &str = "Something went wrong. Please try again.";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutMode {
    #[default]
    Subscription,
    Payment,
}

/// Body posted to `/api/create-checkout-session`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub price_id: String,
    pub mode: CheckoutMode,
}

/// Server reply; either field may be missing
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    #[serde(default)]
    pub session_id: Option<String>,

    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("Stripe failed to load: {0}")]
    ProviderUnavailable(String),

    #[error("Checkout request failed: {0}")]
    Request(String),

    #[error("Failed to create checkout session")]
    MissingSessionId,

    #[error("Stripe checkout error: {0}")]
    Redirect(String),
}

impl CheckoutError {
    /// Text for the blocking alert dialog
    pub const fn alert_message(&self) -> &'static str {
        match self {
            Self::Redirect(_) => REDIRECT_ALERT,
            _ => GENERIC_ALERT,
        }
    }
}

/// How Stripe.js answered `redirectToCheckout`
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RedirectReply {
    /// The promise resolved, possibly carrying `{ error }`
    Resolved { error: Option<String> },

    /// The call threw or the promise rejected
    Rejected(String),
}

impl RedirectReply {
    /// Only an error Stripe reports gets the redirect-specific alert
    pub fn into_result(self) -> Result<(), CheckoutError> {
        match self {
            Self::Resolved { error: None } => Ok(()),
            Self::Resolved { error: Some(message) } => Err(CheckoutError::Redirect(message)),
            Self::Rejected(message) => Err(CheckoutError::Request(message)),
        }
    }
}

/// Browser capabilities the flow needs
#[allow(async_fn_in_trait)]
pub trait CheckoutDriver {
    /// Initialised provider client (Stripe.js instance)
    type Provider;

    async fn load_provider(&self) -> Result<Self::Provider, CheckoutError>;

    async fn create_session(&self, request: &CheckoutRequest) -> Result<SessionResponse, CheckoutError>;

    /// Hand off to the hosted checkout page
    async fn redirect(&self, provider: &Self::Provider, session_id: &str) -> Result<(), CheckoutError>;

    fn alert(&self, message: &str);
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CheckoutPhase {
    #[default]
    Idle,
    Loading,
    /// Browser is navigating away; nothing further is observable
    Redirecting,
}

impl CheckoutPhase {
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Loading | Self::Redirecting)
    }

    /// Enter `Loading`. Returns `false` if a checkout is already under way.
    pub fn begin(&mut self) -> bool {
        if self.is_busy() {
            return false;
        }
        *self = Self::Loading;
        true
    }

    pub fn settle(&mut self, outcome: &CheckoutOutcome) {
        *self = match outcome {
            CheckoutOutcome::Redirecting => Self::Redirecting,
            CheckoutOutcome::Failed(_) => Self::Idle,
        };
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Redirecting,
    /// The user has been alerted
    Failed(CheckoutError),
}

/// Run one checkout attempt; alerts the user on failure
pub async fn run_checkout<D: CheckoutDriver>(driver: &D, request: &CheckoutRequest) -> CheckoutOutcome {
    match attempt(driver, request).await {
        Ok(()) => CheckoutOutcome::Redirecting,
        Err(e) => {
            leptos::logging::error!("Checkout error: {e}");
            driver.alert(e.alert_message());
            CheckoutOutcome::Failed(e)
        }
    }
}

async fn attempt<D: CheckoutDriver>(driver: &D, request: &CheckoutRequest) -> Result<(), CheckoutError> {
    let provider = driver.load_provider().await?;

    let session_id = driver
        .create_session(request)
        .await?
        .session_id
        .filter(|id| !id.is_empty())
        .ok_or(CheckoutError::MissingSessionId)?;

    driver.redirect(&provider, &session_id).await
}
