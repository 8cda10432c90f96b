//! Subscription status.
//!
//! The billing lifecycle has exactly two persisted statuses. The apparent
//! third state - the post-cancellation grace period - is not stored: it is
//! `canceled` with a period end still in the future, and readers derive it
//! by comparing the period end against the current time.

use serde::{Deserialize, Serialize};

/// Persisted subscription status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Billing is live; renewals are expected.
    Active,

    /// Cancellation was requested or billing ended. Paid access may still
    /// be in effect until the recorded period end passes.
    Canceled,
}

impl SubscriptionStatus {
    /// Returns true for `Active`.
    pub fn is_active(&self) -> bool {
        matches!(self, SubscriptionStatus::Active)
    }

    /// Returns the storage representation of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Canceled => "canceled",
        }
    }

    /// Parses a status from its storage representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(SubscriptionStatus::Active),
            "canceled" => Some(SubscriptionStatus::Canceled),
            _ => None,
        }
    }

    /// Maps the payment processor's richer status vocabulary onto our two
    /// states. Anything that still bills (including grace states the
    /// processor retries itself) counts as active; everything terminal
    /// counts as canceled.
    pub fn from_provider(s: &str) -> Self {
        match s {
            "active" | "trialing" | "past_due" => SubscriptionStatus::Active,
            _ => SubscriptionStatus::Canceled,
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
