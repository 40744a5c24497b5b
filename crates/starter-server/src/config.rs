//! Server Configuration
//!
//! Every Stripe key and the public base URL are required; startup fails
//! when one is missing.

use starter_payments::{PaymentError, StripeConfig};
use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_STATIC_DIR: &str = "static";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),

    #[error(transparent)]
    Stripe(#[from] PaymentError),
}

/// Full server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub stripe: StripeConfig,

    /// Public origin used to build checkout redirect URLs
    pub base_url: String,

    pub bind_addr: String,

    /// Directory holding the compiled web frontend
    pub static_dir: String,
}

impl ServerConfig {
    /// Load from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let stripe = StripeConfig::from_lookup(&lookup)?;

        let base_url = lookup("PUBLIC_BASE_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::Missing("PUBLIC_BASE_URL"))?;

        Ok(Self {
            stripe,
            base_url,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            static_dir: lookup("STATIC_DIR").unwrap_or_else(|| DEFAULT_STATIC_DIR.into()),
        })
    }
}
