//! Webhook Event Model
//!
//! Only the fields the handlers read are modelled. `data.object` stays raw
//! JSON until the dispatcher knows which shape to decode.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{PaymentError, Result};
use crate::plan::Plan;

/// A verified Stripe event
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Event ID (`evt_...`), used as the idempotency key
    pub id: String,

    #[serde(rename = "type")]
    pub event_type: String,

    /// Unix timestamp the event was created at
    #[serde(default)]
    pub created: Option<i64>,

    pub data: EventData,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

impl WebhookEvent {
    pub fn kind(&self) -> EventKind {
        EventKind::from_type(&self.event_type)
    }

    /// Decode `data.object` into a typed view
    pub fn object<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.data.object.clone()).map_err(|e| {
            PaymentError::WebhookParse(format!("{} object: {e}", self.event_type))
        })
    }
}

/// Event types this service reacts to
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    CheckoutSessionCompleted,
    SubscriptionCreated,
    SubscriptionUpdated,
    SubscriptionDeleted,
    InvoicePaymentSucceeded,
    InvoicePaymentFailed,
    /// Anything else; acknowledged and logged only
    Unhandled(String),
}

impl EventKind {
    pub fn from_type(event_type: &str) -> Self {
        match event_type {
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            "customer.subscription.created" => Self::SubscriptionCreated,
            "customer.subscription.updated" => Self::SubscriptionUpdated,
            "customer.subscription.deleted" => Self::SubscriptionDeleted,
            "invoice.payment_succeeded" => Self::InvoicePaymentSucceeded,
            "invoice.payment_failed" => Self::InvoicePaymentFailed,
            other => Self::Unhandled(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::CheckoutSessionCompleted => "checkout.session.completed",
            Self::SubscriptionCreated => "customer.subscription.created",
            Self::SubscriptionUpdated => "customer.subscription.updated",
            Self::SubscriptionDeleted => "customer.subscription.deleted",
            Self::InvoicePaymentSucceeded => "invoice.payment_succeeded",
            Self::InvoicePaymentFailed => "invoice.payment_failed",
            Self::Unhandled(other) => other,
        }
    }

    pub const fn is_handled(&self) -> bool {
        !matches!(self, Self::Unhandled(_))
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `checkout.session` object
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CheckoutSessionObject {
    pub id: String,

    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,

    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,

    #[serde(default)]
    pub customer_email: Option<String>,

    #[serde(default)]
    pub mode: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CustomerDetails {
    #[serde(default)]
    pub email: Option<String>,
}

impl CheckoutSessionObject {
    /// Raw `plan` metadata value
    pub fn plan_label(&self) -> Option<&str> {
        self.metadata.as_ref()?.get(Plan::METADATA_KEY).map(String::as_str)
    }

    pub fn plan(&self) -> Option<Plan> {
        self.plan_label().and_then(Plan::parse)
    }

    /// Email entered on the checkout page, falling back to the prefilled one
    pub fn email(&self) -> Option<&str> {
        self.customer_details
            .as_ref()
            .and_then(|d| d.email.as_deref())
            .or(self.customer_email.as_deref())
    }
}

/// `subscription` object
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SubscriptionObject {
    pub id: String,

    #[serde(default)]
    pub status: Option<String>,

    /// Customer ID; expanded customers are kept as raw JSON
    #[serde(default)]
    pub customer: Option<serde_json::Value>,
}

/// `invoice` object
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InvoiceObject {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub customer_email: Option<String>,

    #[serde(default)]
    pub subscription: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            EventKind::from_type("checkout.session.completed"),
            EventKind::CheckoutSessionCompleted
        );
        assert_eq!(
            EventKind::from_type("invoice.payment_failed"),
            EventKind::InvoicePaymentFailed
        );

        let other = EventKind::from_type("charge.refunded");
        assert!(!other.is_handled());
        assert_eq!(other.as_str(), "charge.refunded");
    }

    #[test]
    fn test_checkout_session_fields() {
        let event: WebhookEvent = serde_json::from_value(serde_json::json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": { "object": {
                "id": "cs_test_1",
                "metadata": { "plan": "lifetime" },
                "customer_details": { "email": "ana@example.com" },
                "customer_email": "prefill@example.com"
            }}
        }))
        .unwrap();

        let session: CheckoutSessionObject = event.object().unwrap();
        assert_eq!(session.plan(), Some(Plan::Lifetime));
        assert_eq!(session.email(), Some("ana@example.com"));
    }

    #[test]
    fn test_object_shape_mismatch() {
        let event: WebhookEvent = serde_json::from_value(serde_json::json!({
            "id": "evt_2",
            "type": "customer.subscription.updated",
            "data": { "object": { "status": "active" } }
        }))
        .unwrap();

        let err = event.object::<SubscriptionObject>().unwrap_err();
        assert!(matches!(err, PaymentError::WebhookParse(_)));
    }
}
