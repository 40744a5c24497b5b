//! Stripe Configuration

use std::time::Duration;

use crate::error::{PaymentError, Result};
use crate::signature::DEFAULT_TOLERANCE;

/// Stripe keys and webhook settings
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key (`sk_...`)
    pub secret_key: String,

    /// Publishable key (`pk_...`) handed to the browser
    pub publishable_key: String,

    /// Webhook signing secret (`whsec_...`)
    pub webhook_secret: String,

    /// Maximum age of a webhook signature
    pub webhook_tolerance: Duration,
}

impl StripeConfig {
    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| PaymentError::Config(format!("{key} not set")))
        };

        let webhook_tolerance = match lookup("STRIPE_WEBHOOK_TOLERANCE_SECS") {
            Some(secs) => Duration::from_secs(secs.trim().parse().map_err(|_| {
                PaymentError::Config(format!("STRIPE_WEBHOOK_TOLERANCE_SECS is not a number: {secs}"))
            })?),
            None => DEFAULT_TOLERANCE,
        };

        Ok(Self {
            secret_key: required("STRIPE_SECRET_KEY")?,
            publishable_key: required("STRIPE_PUBLISHABLE_KEY")?,
            webhook_secret: required("STRIPE_WEBHOOK_SECRET")?,
            webhook_tolerance,
        })
    }
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"<redacted>")
            .field("publishable_key", &self.publishable_key)
            .field("webhook_secret", &"<redacted>")
            .field("webhook_tolerance", &self.webhook_tolerance)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const FULL: &[(&str, &str)] = &[
        ("STRIPE_SECRET_KEY", "sk_test_1"),
        ("STRIPE_PUBLISHABLE_KEY", "pk_test_1"),
        ("STRIPE_WEBHOOK_SECRET", "whsec_1"),
    ];

    #[test]
    fn test_all_keys_present() {
        let config = StripeConfig::from_lookup(env(FULL)).unwrap();
        assert_eq!(config.publishable_key, "pk_test_1");
        assert_eq!(config.webhook_tolerance, DEFAULT_TOLERANCE);
        assert!(!format!("{config:?}").contains("sk_test_1"));
    }

    #[test]
    fn test_missing_key_is_named() {
        let err = StripeConfig::from_lookup(env(&FULL[..2])).unwrap_err();
        assert!(err.to_string().contains("STRIPE_WEBHOOK_SECRET"));
    }

    #[test]
    fn test_tolerance_override() {
        let mut pairs = FULL.to_vec();
        pairs.push(("STRIPE_WEBHOOK_TOLERANCE_SECS", "60"));
        let config = StripeConfig::from_lookup(env(&pairs)).unwrap();
        assert_eq!(config.webhook_tolerance, Duration::from_secs(60));
    }

    #[test]
    fn test_bad_tolerance() {
        let mut pairs = FULL.to_vec();
        pairs.push(("STRIPE_WEBHOOK_TOLERANCE_SECS", "soon"));
        assert!(StripeConfig::from_lookup(env(&pairs)).is_err());
    }
}
