//! Handler for `customer.subscription.updated`.
//!
//! Overwrites status and period bounds on the matching row. Tier never
//! changes here - it is set at checkout and only reset by the downgrade
//! path in the deletion handler.

use std::sync::Arc;

use crate::domain::billing::{SubscriptionStatus, WebhookError};
use crate::domain::foundation::Timestamp;
use crate::ports::SubscriptionStore;

use super::WebhookOutcome;

/// Syncs status and period bounds from subscription update events.
pub struct SubscriptionUpdatedHandler {
    subscriptions: Arc<dyn SubscriptionStore>,
}

impl SubscriptionUpdatedHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionStore>) -> Self {
        Self { subscriptions }
    }

    pub async fn handle(
        &self,
        subscription_id: &str,
        provider_status: &str,
        current_period_start: i64,
        current_period_end: i64,
    ) -> Result<WebhookOutcome, WebhookError> {
        let mut subscription = match self
            .subscriptions
            .find_by_stripe_subscription(subscription_id)
            .await?
        {
            Some(subscription) => subscription,
            None => {
                // Event for a subscription this system never created, or one
                // already migrated away. Acknowledge without effect.
                tracing::warn!(subscription_id, "Update event for unknown subscription");
                return Ok(WebhookOutcome::Acknowledged {
                    reason: "unknown subscription",
                });
            }
        };

        subscription.apply_billing_update(
            SubscriptionStatus::from_provider(provider_status),
            Timestamp::from_unix_secs(current_period_start),
            Timestamp::from_unix_secs(current_period_end),
        );

        self.subscriptions.update(&subscription).await?;

        tracing::info!(
            subscription_id,
            status = %subscription.status,
            "Subscription synced from update event"
        );

        Ok(WebhookOutcome::SubscriptionSynced {
            subscription_id: subscription_id.to_string(),
        })
    }
}
