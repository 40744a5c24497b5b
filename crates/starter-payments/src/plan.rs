//! Purchase Modes and Plans
//!
//! The mode picks how Stripe bills the customer. The plan is the internal
//! label stored in the checkout session's metadata.

use serde::{Deserialize, Serialize};

/// Purchase type sent to Stripe Checkout
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutMode {
    /// Recurring billing
    #[default]
    Subscription,
    /// One-time payment
    Payment,
}

impl CheckoutMode {
    /// Parse the optional `mode` field of a checkout request.
    ///
    /// Only `"payment"` selects a one-time payment; anything else,
    /// including an absent value, is a subscription.
    pub fn from_request(mode: Option<&str>) -> Self {
        match mode {
            Some("payment") => Self::Payment,
            _ => Self::Subscription,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Subscription => "subscription",
            Self::Payment => "payment",
        }
    }

    /// Plan label recorded for this mode
    pub const fn plan(self) -> Plan {
        match self {
            Self::Payment => Plan::Lifetime,
            Self::Subscription => Plan::Monthly,
        }
    }
}

/// Plan label stored under the `plan` metadata key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Monthly,
    Lifetime,
}

impl Plan {
    /// Metadata key the plan is stored under
    pub const METADATA_KEY: &'static str = "plan";

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Lifetime => "lifetime",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "monthly" => Some(Self::Monthly),
            "lifetime" => Some(Self::Lifetime),
            _ => None,
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
