//! HTTP Error Mapping

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use starter_payments::PaymentError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Errors returned at the endpoint boundary
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Missing Stripe signature")]
    MissingSignature,

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Provider failure; the detail is logged, never returned
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::Validation(msg) => Self::Validation(msg),
            PaymentError::MissingSignature => Self::MissingSignature,
            PaymentError::InvalidSignature(msg) | PaymentError::WebhookParse(msg) => {
                Self::InvalidSignature(msg)
            }
            PaymentError::Provider(msg) => Self::Provider(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            Self::MissingSignature => {
                tracing::error!("No stripe signature found");
                (StatusCode::BAD_REQUEST, "MISSING_SIGNATURE", "No signature".into())
            }
            Self::InvalidSignature(reason) => {
                tracing::error!(reason = %reason, "Webhook signature verification failed");
                (StatusCode::BAD_REQUEST, "INVALID_SIGNATURE", "Invalid signature".into())
            }
            Self::Provider(msg) => {
                tracing::error!(error = %msg, "Payment provider error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CHECKOUT_ERROR",
                    "Failed to create checkout session".into(),
                )
            }
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".into(),
                )
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: message,
                code: code.into(),
            }),
        )
            .into_response()
    }
}
