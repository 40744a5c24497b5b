//! Stripe Webhook Handling
//!
//! Dispatches verified events for the subscription lifecycle. Exactly one
//! [`SubscriptionEvents`] method runs per known event type. Each call runs
//! inside an error boundary: an `Err`, a panic, or an undecodable
//! `data.object` is logged and recorded, and the event is still acknowledged.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;

use crate::error::{PaymentError, Result};
use crate::event::{
    CheckoutSessionObject, EventKind, InvoiceObject, SubscriptionObject, WebhookEvent,
};
use crate::event_log::{EventLog, EventStatus};

/// Per-event callbacks.
///
/// The default implementations only log the event's key fields.
#[async_trait]
pub trait SubscriptionEvents: Send + Sync {
    /// `checkout.session.completed`
    async fn checkout_completed(&self, session: &CheckoutSessionObject) -> Result<()> {
        tracing::info!(
            session_id = %session.id,
            plan = session.plan_label().unwrap_or("unknown"),
            email = session.email().unwrap_or("unknown"),
            "Payment successful"
        );
        Ok(())
    }

    /// `customer.subscription.created`
    async fn subscription_created(&self, subscription: &SubscriptionObject) -> Result<()> {
        tracing::info!(subscription_id = %subscription.id, "Subscription created");
        Ok(())
    }

    /// `customer.subscription.updated`
    async fn subscription_updated(&self, subscription: &SubscriptionObject) -> Result<()> {
        tracing::info!(
            subscription_id = %subscription.id,
            status = subscription.status.as_deref().unwrap_or("unknown"),
            "Subscription updated"
        );
        Ok(())
    }

    /// `customer.subscription.deleted`
    async fn subscription_deleted(&self, subscription: &SubscriptionObject) -> Result<()> {
        tracing::info!(subscription_id = %subscription.id, "Subscription canceled");
        Ok(())
    }

    /// `invoice.payment_succeeded`
    async fn invoice_paid(&self, invoice: &InvoiceObject) -> Result<()> {
        tracing::info!(
            invoice_id = invoice.id.as_deref().unwrap_or("unknown"),
            "Recurring payment succeeded"
        );
        Ok(())
    }

    /// `invoice.payment_failed`
    async fn invoice_payment_failed(&self, invoice: &InvoiceObject) -> Result<()> {
        tracing::warn!(
            invoice_id = invoice.id.as_deref().unwrap_or("unknown"),
            email = invoice.customer_email.as_deref().unwrap_or("unknown"),
            "Invoice payment failed"
        );
        Ok(())
    }
}

/// Handlers that log and change nothing
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingSubscriptionEvents;

impl SubscriptionEvents for LoggingSubscriptionEvents {}

/// What happened to a delivered event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The matching handler ran and returned `Ok`
    Handled(EventKind),

    /// The matching handler failed; the event is still acknowledged
    HandlerFailed { kind: EventKind, error: String },

    /// No handler for this event type
    Unhandled(String),

    /// Already processed (or in flight); no handler ran
    Duplicate,
}

impl DispatchOutcome {
    /// Whether a handler was invoked for this delivery
    pub const fn ran_handler(&self) -> bool {
        matches!(self, Self::Handled(_) | Self::HandlerFailed { .. })
    }

    /// What to record in the event log; `None` when this delivery holds no claim
    fn status(&self) -> Option<(EventStatus, Option<String>)> {
        match self {
            Self::Handled(_) => Some((EventStatus::Succeeded, None)),
            Self::Unhandled(_) => Some((EventStatus::Ignored, None)),
            Self::HandlerFailed { error, .. } => Some((EventStatus::Failed, Some(error.clone()))),
            Self::Duplicate => None,
        }
    }
}

/// Webhook dispatcher
pub struct WebhookHandler {
    events: Arc<dyn SubscriptionEvents>,
    event_log: Arc<dyn EventLog>,
}

impl WebhookHandler {
    pub fn new(events: Arc<dyn SubscriptionEvents>, event_log: Arc<dyn EventLog>) -> Self {
        Self { events, event_log }
    }

    /// Process a verified webhook event
    pub async fn process(&self, event: &WebhookEvent) -> DispatchOutcome {
        tracing::info!(event_id = %event.id, event_type = %event.event_type, "Received webhook event");

        match self.event_log.claim(&event.id, &event.event_type).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::info!(event_id = %event.id, "Duplicate webhook delivery, skipping");
                return DispatchOutcome::Duplicate;
            }
            Err(e) => {
                tracing::warn!(event_id = %event.id, error = %e, "Event log unavailable, processing anyway");
            }
        }

        let outcome = match event.kind() {
            EventKind::Unhandled(event_type) => {
                tracing::info!(event_type = %event_type, "Unhandled event type");
                DispatchOutcome::Unhandled(event_type)
            }
            kind => {
                let result = AssertUnwindSafe(self.dispatch(&kind, event)).catch_unwind().await;
                match result {
                    Ok(Ok(())) => DispatchOutcome::Handled(kind),
                    Ok(Err(e)) => DispatchOutcome::HandlerFailed { kind, error: e.to_string() },
                    Err(panic) => DispatchOutcome::HandlerFailed {
                        kind,
                        error: PaymentError::Handler(panic_message(panic.as_ref())).to_string(),
                    },
                }
            }
        };

        if let DispatchOutcome::HandlerFailed { kind, error } = &outcome {
            tracing::error!(event_id = %event.id, event_type = %kind, error = %error, "Webhook handler failed");
        }

        if let Some((status, error)) = outcome.status() {
            if let Err(e) = self.event_log.complete(&event.id, status, error).await {
                tracing::warn!(event_id = %event.id, error = %e, "Failed to record webhook outcome");
            }
        }

        outcome
    }

    async fn dispatch(&self, kind: &EventKind, event: &WebhookEvent) -> Result<()> {
        match kind {
            EventKind::CheckoutSessionCompleted => {
                self.events.checkout_completed(&event.object()?).await
            }
            EventKind::SubscriptionCreated => {
                self.events.subscription_created(&event.object()?).await
            }
            EventKind::SubscriptionUpdated => {
                self.events.subscription_updated(&event.object()?).await
            }
            EventKind::SubscriptionDeleted => {
                self.events.subscription_deleted(&event.object()?).await
            }
            EventKind::InvoicePaymentSucceeded => self.events.invoice_paid(&event.object()?).await,
            EventKind::InvoicePaymentFailed => {
                self.events.invoice_payment_failed(&event.object()?).await
            }
            EventKind::Unhandled(_) => Ok(()),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "handler panicked".into())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::event_log::{EventRecord, MemoryEventLog};

    /// Records which callbacks ran; fails or panics on request
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<&'static str>>,
        fail_on: Option<&'static str>,
        panic_on: Option<&'static str>,
    }

    impl Recorder {
        fn hit(&self, name: &'static str) -> Result<()> {
            self.calls.lock().unwrap().push(name);
            assert!(self.panic_on != Some(name), "handler exploded");
            if self.fail_on == Some(name) {
                return Err(PaymentError::Handler(format!("{name} failed")));
            }
            Ok(())
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SubscriptionEvents for Recorder {
        async fn checkout_completed(&self, _: &CheckoutSessionObject) -> Result<()> {
            self.hit("checkout_completed")
        }
        async fn subscription_created(&self, _: &SubscriptionObject) -> Result<()> {
            self.hit("subscription_created")
        }
        async fn subscription_updated(&self, _: &SubscriptionObject) -> Result<()> {
            self.hit("subscription_updated")
        }
        async fn subscription_deleted(&self, _: &SubscriptionObject) -> Result<()> {
            self.hit("subscription_deleted")
        }
        async fn invoice_paid(&self, _: &InvoiceObject) -> Result<()> {
            self.hit("invoice_paid")
        }
        async fn invoice_payment_failed(&self, _: &InvoiceObject) -> Result<()> {
            self.hit("invoice_payment_failed")
        }
    }

    /// Never finishes `customer.subscription.updated`
    struct Stalled;

    #[async_trait]
    impl SubscriptionEvents for Stalled {
        async fn subscription_updated(&self, _: &SubscriptionObject) -> Result<()> {
            std::future::pending().await
        }
    }

    /// Storage that is always down
    struct BrokenLog;

    #[async_trait]
    impl EventLog for BrokenLog {
        async fn claim(&self, _: &str, _: &str) -> Result<bool> {
            Err(PaymentError::Storage("connection refused".into()))
        }

        async fn complete(&self, _: &str, _: EventStatus, _: Option<String>) -> Result<()> {
            Err(PaymentError::Storage("connection refused".into()))
        }

        async fn get(&self, _: &str) -> Result<Option<EventRecord>> {
            Err(PaymentError::Storage("connection refused".into()))
        }
    }

    fn event(id: &str, event_type: &str) -> WebhookEvent {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "type": event_type,
            "data": { "object": {
                "id": "obj_1",
                "status": "active",
                "metadata": { "plan": "monthly" }
            }}
        }))
        .unwrap()
    }

    fn handler(recorder: Arc<Recorder>) -> (WebhookHandler, Arc<MemoryEventLog>) {
        let log = Arc::new(MemoryEventLog::new());
        (WebhookHandler::new(recorder, log.clone()), log)
    }

    #[tokio::test]
    async fn test_each_known_type_runs_one_handler() {
        let cases = [
            ("checkout.session.completed", "checkout_completed"),
            ("customer.subscription.created", "subscription_created"),
            ("customer.subscription.updated", "subscription_updated"),
            ("customer.subscription.deleted", "subscription_deleted"),
            ("invoice.payment_succeeded", "invoice_paid"),
            ("invoice.payment_failed", "invoice_payment_failed"),
        ];

        for (i, (event_type, expected)) in cases.into_iter().enumerate() {
            let recorder = Arc::new(Recorder::default());
            let (handler, _) = handler(recorder.clone());

            let outcome = handler.process(&event(&format!("evt_{i}"), event_type)).await;
            assert_eq!(outcome, DispatchOutcome::Handled(EventKind::from_type(event_type)));
            assert_eq!(recorder.calls(), vec![expected]);
        }
    }

    #[tokio::test]
    async fn test_unknown_type_runs_nothing() {
        let recorder = Arc::new(Recorder::default());
        let (handler, log) = handler(recorder.clone());

        let outcome = handler.process(&event("evt_x", "charge.refunded")).await;
        assert_eq!(outcome, DispatchOutcome::Unhandled("charge.refunded".into()));
        assert!(recorder.calls().is_empty());

        let record = log.get("evt_x").await.unwrap().unwrap();
        assert_eq!(record.status, EventStatus::Ignored);
    }

    #[tokio::test]
    async fn test_duplicate_delivery_skips_handler() {
        let recorder = Arc::new(Recorder::default());
        let (handler, _) = handler(recorder.clone());
        let evt = event("evt_dup", "customer.subscription.deleted");

        assert!(handler.process(&evt).await.ran_handler());
        assert_eq!(handler.process(&evt).await, DispatchOutcome::Duplicate);
        assert_eq!(recorder.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_handler_error_is_contained() {
        let recorder = Arc::new(Recorder {
            fail_on: Some("invoice_paid"),
            ..Default::default()
        });
        let (handler, log) = handler(recorder.clone());

        let outcome = handler.process(&event("evt_f", "invoice.payment_succeeded")).await;
        assert!(matches!(outcome, DispatchOutcome::HandlerFailed { .. }));

        let record = log.get("evt_f").await.unwrap().unwrap();
        assert_eq!(record.status, EventStatus::Failed);

        // A failed event is retried on redelivery.
        assert!(handler.process(&event("evt_f", "invoice.payment_succeeded")).await.ran_handler());
        assert_eq!(recorder.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_handler_panic_is_contained() {
        let recorder = Arc::new(Recorder {
            panic_on: Some("checkout_completed"),
            ..Default::default()
        });
        let (handler, _) = handler(recorder);

        let outcome = handler.process(&event("evt_p", "checkout.session.completed")).await;
        match outcome {
            DispatchOutcome::HandlerFailed { kind, error } => {
                assert_eq!(kind, EventKind::CheckoutSessionCompleted);
                assert!(error.contains("handler exploded"));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_undecodable_object_is_handler_failure() {
        let recorder = Arc::new(Recorder::default());
        let (handler, _) = handler(recorder.clone());
        let evt: WebhookEvent = serde_json::from_value(serde_json::json!({
            "id": "evt_bad",
            "type": "customer.subscription.updated",
            "data": { "object": { "status": 42 } }
        }))
        .unwrap();

        assert!(matches!(handler.process(&evt).await, DispatchOutcome::HandlerFailed { .. }));
        assert!(recorder.calls().is_empty());
    }

    #[tokio::test]
    async fn test_logging_handlers_succeed() {
        let log = Arc::new(MemoryEventLog::new());
        let handler = WebhookHandler::new(Arc::new(LoggingSubscriptionEvents), log);

        let outcome = handler.process(&event("evt_l", "checkout.session.completed")).await;
        assert_eq!(outcome, DispatchOutcome::Handled(EventKind::CheckoutSessionCompleted));
    }

    #[tokio::test]
    async fn test_duplicate_leaves_record_untouched() {
        let recorder = Arc::new(Recorder::default());
        let (handler, log) = handler(recorder.clone());
        let evt = event("evt_d", "invoice.payment_failed");

        log.claim("evt_d", "invoice.payment_failed").await.unwrap();
        assert_eq!(handler.process(&evt).await, DispatchOutcome::Duplicate);
        assert!(recorder.calls().is_empty());

        let record = log.get("evt_d").await.unwrap().unwrap();
        assert_eq!(record.status, EventStatus::Processing);
    }

    #[tokio::test]
    async fn test_dropped_delivery_is_retried_after_lease() {
        let log = Arc::new(MemoryEventLog::new().with_lease(Duration::ZERO));
        let evt = event("evt_stuck", "customer.subscription.updated");

        let stalled = WebhookHandler::new(Arc::new(Stalled), log.clone());
        let cancelled = tokio::time::timeout(Duration::from_millis(50), stalled.process(&evt)).await;
        assert!(cancelled.is_err());
        assert_eq!(log.get("evt_stuck").await.unwrap().unwrap().status, EventStatus::Processing);

        let recorder = Arc::new(Recorder::default());
        let healthy = WebhookHandler::new(recorder.clone(), log.clone());
        let outcome = healthy.process(&evt).await;

        assert_eq!(outcome, DispatchOutcome::Handled(EventKind::SubscriptionUpdated));
        assert_eq!(recorder.calls(), vec!["subscription_updated"]);

        let record = log.get("evt_stuck").await.unwrap().unwrap();
        assert_eq!(record.status, EventStatus::Succeeded);
        assert_eq!(record.attempts, 2);
    }

    #[tokio::test]
    async fn test_event_log_outage_still_processes() {
        let recorder = Arc::new(Recorder::default());
        let handler = WebhookHandler::new(recorder.clone(), Arc::new(BrokenLog));

        let outcome = handler.process(&event("evt_o", "invoice.payment_succeeded")).await;

        assert_eq!(outcome, DispatchOutcome::Handled(EventKind::InvoicePaymentSucceeded));
        assert_eq!(recorder.calls(), vec!["invoice_paid"]);
    }
}
