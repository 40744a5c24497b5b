//! # starter-payments
//!
//! Stripe Checkout sessions and webhook processing for saas-starter.
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐  priceId   ┌─────────────┐  session  ┌─────────────────┐
//! │   Browser   │───────────▶│   Server    │──────────▶│     Stripe      │
//! │  (pricing)  │◀───────────│  checkout   │◀──────────│  Checkout API   │
//! └─────────────┘  sessionId └─────────────┘           └─────────────────┘
//!        │ redirectToCheckout                                   │
//!        └─────────────────────▶ hosted page ──── webhook ──────┘
//!                                                   │
//!                                       ┌───────────▼───────────┐
//!                                       │  verify → event log → │
//!                                       │  dispatch (isolated)  │
//!                                       └───────────────────────┘
//! ```
//!
//! Both Stripe-facing seams are traits: [`PaymentProvider`] for session
//! creation and [`SubscriptionEvents`] for webhook side effects. The
//! [`EventLog`] keeps redelivered events from running a handler twice.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use starter_payments::{CheckoutRequest, CheckoutService, StripeClient};
//!
//! let provider = Arc::new(StripeClient::new("sk_test_xxx"));
//! let checkout = CheckoutService::new(provider, "https://yoursite.com");
//!
//! let session = checkout
//!     .create_session(&CheckoutRequest::new("price_123", None))
//!     .await?;
//!
//! // Hand session.id to the browser for redirectToCheckout
//! ```

mod checkout;
mod config;
mod error;
mod event;
mod event_log;
mod plan;
mod provider;
mod signature;
mod webhook;

pub use checkout::{CheckoutRequest, CheckoutService, CheckoutSession, StripeClient};
pub use config::StripeConfig;
pub use error::{PaymentError, Result};
pub use event::{
    CheckoutSessionObject, CustomerDetails, EventData, EventKind, InvoiceObject,
    SubscriptionObject, WebhookEvent,
};
pub use event_log::{
    DEFAULT_LEASE, DEFAULT_RETENTION, EventLog, EventRecord, EventStatus, MemoryEventLog,
};
pub use plan::{CheckoutMode, Plan};
pub use provider::{MockPaymentProvider, PaymentProvider, ProviderSession, SessionParams};
pub use signature::{DEFAULT_TOLERANCE, SignatureHeader, WebhookVerifier, signature_header};
pub use webhook::{DispatchOutcome, LoggingSubscriptionEvents, SubscriptionEvents, WebhookHandler};
