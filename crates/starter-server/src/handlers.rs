//! HTTP Handlers

use axum::{Json, body::Bytes, extract::State, http::HeaderMap};
use serde::{Deserialize, Serialize};
use starter_payments::CheckoutRequest;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the webhook signature
pub const SIGNATURE_HEADER: &str = "stripe-signature";

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfigResponse {
    pub publishable_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Publishable key for initialising Stripe.js
pub async fn client_config(State(state): State<AppState>) -> Json<ClientConfigResponse> {
    Json(ClientConfigResponse {
        publishable_key: state.publishable_key.to_string(),
    })
}

/// Create a Stripe checkout session
///
/// The body is read as JSON whatever its `Content-Type`.
pub async fn create_checkout_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let request: CheckoutRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(error = %e, "Rejected checkout request body");
        ApiError::Validation("Invalid request body".into())
    })?;

    let session = state.checkout.create_session(&request).await?;

    Ok(Json(CheckoutResponse {
        session_id: session.id,
    }))
}

/// Stripe webhook receiver
///
/// Once the signature verifies, the event is acknowledged with
/// `{received: true}` whatever its handler does.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::MissingSignature)?;

    let event = state.verifier.verify(&body, signature)?;

    let outcome = state.webhooks.process(&event).await;
    tracing::debug!(event_id = %event.id, outcome = ?outcome, "Webhook processed");

    Ok(Json(WebhookAck { received: true }))
}
