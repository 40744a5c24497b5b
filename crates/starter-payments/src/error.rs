//! Payment Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Required checkout input missing or malformed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Payment provider API call failed
    #[error("Provider error: {0}")]
    Provider(String),

    /// Webhook request carried no signature header
    #[error("Webhook signature missing")]
    MissingSignature,

    /// Webhook signature verification failed
    #[error("Webhook signature invalid: {0}")]
    InvalidSignature(String),

    /// Webhook `data.object` did not match the event type
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// An event handler returned an error or panicked
    #[error("Webhook handler failed: {0}")]
    Handler(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Event log error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl PaymentError {
    /// Get user-friendly message
    ///
    /// Provider and storage details never reach the caller.
    pub fn user_message(&self) -> &str {
        match self {
            Self::Validation(msg) => msg,
            Self::Provider(_) => "Failed to create checkout session",
            Self::MissingSignature => "No signature",
            Self::InvalidSignature(_) | Self::WebhookParse(_) => "Invalid signature",
            _ => "An error occurred processing your request.",
        }
    }
}
