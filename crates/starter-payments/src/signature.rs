//! Stripe Webhook Signature Verification
//!
//! The `Stripe-Signature` header has the form `t=<unix>,v1=<hex>[,v1=<hex>]`.
//! Each `v1` is HMAC-SHA256 over `"<t>.<raw body>"` keyed with the endpoint
//! secret. Several `v1` entries appear while a secret is being rolled.

use std::time::Duration;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{PaymentError, Result};
use crate::event::WebhookEvent;

type HmacSha256 = Hmac<Sha256>;

/// Stripe's default tolerance for signature timestamps
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(300);

/// Parsed `Stripe-Signature` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    pub fn parse(header: &str) -> Result<Self> {
        let mut timestamp = None;
        let mut signatures = Vec::new();

        for part in header.split(',') {
            let Some((key, value)) = part.trim().split_once('=') else {
                return Err(PaymentError::InvalidSignature("malformed header".into()));
            };

            match key {
                "t" => {
                    timestamp = Some(value.parse::<i64>().map_err(|_| {
                        PaymentError::InvalidSignature("invalid timestamp".into())
                    })?);
                }
                // Skip entries that are not hex; another v1 may still match.
                "v1" => {
                    if let Ok(sig) = hex::decode(value) {
                        signatures.push(sig);
                    }
                }
                _ => {}
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| PaymentError::InvalidSignature("missing timestamp".into()))?;
        if signatures.is_empty() {
            return Err(PaymentError::InvalidSignature("no v1 signature".into()));
        }

        Ok(Self { timestamp, signatures })
    }
}

fn mac(secret: &str, timestamp: i64, payload: &[u8]) -> Result<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| PaymentError::Config(format!("webhook secret: {e}")))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Build a valid `Stripe-Signature` header for `payload`.
///
/// Used to sign fixtures and to replay captured events locally.
pub fn signature_header(secret: &str, timestamp: i64, payload: &[u8]) -> Result<String> {
    let digest = mac(secret, timestamp, payload)?.finalize().into_bytes();
    Ok(format!("t={timestamp},v1={}", hex::encode(digest)))
}

/// Verifies webhook requests against the endpoint secret
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: String,
    tolerance: Duration,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Verify the signature and parse the event
    pub fn verify(&self, payload: &[u8], header: &str) -> Result<WebhookEvent> {
        self.verify_at(payload, header, chrono::Utc::now().timestamp())
    }

    /// Verify as if the current time were `now`
    pub fn verify_at(&self, payload: &[u8], header: &str, now: i64) -> Result<WebhookEvent> {
        let header = SignatureHeader::parse(header)?;

        let tolerance = i64::try_from(self.tolerance.as_secs()).unwrap_or(i64::MAX);
        if now.saturating_sub(header.timestamp) > tolerance {
            return Err(PaymentError::InvalidSignature(
                "timestamp outside the tolerance zone".into(),
            ));
        }

        let expected = mac(&self.secret, header.timestamp, payload)?;
        let matched = header
            .signatures
            .iter()
            .any(|sig| expected.clone().verify_slice(sig).is_ok());
        if !matched {
            return Err(PaymentError::InvalidSignature(
                "no signatures found matching the expected signature for payload".into(),
            ));
        }

        serde_json::from_slice(payload)
            .map_err(|e| PaymentError::InvalidSignature(format!("invalid payload: {e}")))
    }
}
