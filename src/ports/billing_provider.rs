//! Billing provider port.
//!
//! The checkout-completed handler makes one outbound call: fetching the
//! authoritative subscription detail (status, customer, period bounds) for
//! the subscription id named on the checkout session. This port is that
//! call's seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::billing::SubscriptionStatus;
use crate::domain::foundation::Timestamp;

/// Subscription detail as reported by the payment processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionDetail {
    /// Processor's subscription id.
    pub id: String,

    /// Processor's customer id.
    pub customer_id: String,

    /// Status mapped into our two-state domain.
    pub status: SubscriptionStatus,

    /// Current billing period start.
    pub current_period_start: Timestamp,

    /// Current billing period end.
    pub current_period_end: Timestamp,
}

/// Errors from the billing provider.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BillingProviderError {
    /// Network-level failure reaching the provider. Retryable.
    #[error("Network error: {0}")]
    Network(String),

    /// The provider returned a non-success response.
    #[error("Provider API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The provider's response could not be parsed.
    #[error("Provider response parse error: {0}")]
    Parse(String),
}

impl BillingProviderError {
    /// Whether retrying the call could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            BillingProviderError::Network(_) => true,
            BillingProviderError::Api { status, .. } => *status >= 500 || *status == 429,
            BillingProviderError::Parse(_) => false,
        }
    }
}

/// Port for payment-processor queries.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Fetches subscription detail by processor subscription id.
    ///
    /// Returns `Ok(None)` if the processor does not know the id.
    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionDetail>, BillingProviderError>;
}
