//! Subscription tier definitions.
//!
//! Represents the subscription levels available in ReefLog.

use serde::{Deserialize, Serialize};

/// Subscription tier.
///
/// Determines which tank-tracking features a user can reach: parameter
/// history depth, photo gallery size, number of tanks, and so on. Those
/// limits live with the product surfaces; billing only records the tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    /// Free tier - single tank, limited history.
    Free,

    /// Premium subscription.
    Premium,

    /// Super-premium subscription - everything unlocked.
    SuperPremium,
}

impl SubscriptionTier {
    /// Returns true if this tier is a paid tier.
    pub fn is_paid(&self) -> bool {
        !matches!(self, SubscriptionTier::Free)
    }

    /// Returns the display name for this tier.
    pub fn display_name(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "Free",
            SubscriptionTier::Premium => "Premium",
            SubscriptionTier::SuperPremium => "Super Premium",
        }
    }

    /// Returns the storage representation of this tier.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Premium => "premium",
            SubscriptionTier::SuperPremium => "super_premium",
        }
    }

    /// Parses a tier from a string.
    ///
    /// Accepts both the storage form (`super_premium`) and the hyphenated
    /// form the checkout page sends in metadata (`super-premium`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "free" => Some(SubscriptionTier::Free),
            "premium" => Some(SubscriptionTier::Premium),
            "super_premium" | "super-premium" => Some(SubscriptionTier::SuperPremium),
            _ => None,
        }
    }
}

impl std::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
