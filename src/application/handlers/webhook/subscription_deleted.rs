//! Handler for `customer.subscription.deleted`.
//!
//! Implements the terminal transitions of the lifecycle:
//! `active -> canceled(grace) -> free`. Whether the row enters the grace
//! period or drops straight to free depends on the period end relative to
//! processing time - see [`Subscription::record_deletion`].

use std::sync::Arc;

use crate::domain::billing::{CancellationEffect, WebhookError};
use crate::domain::foundation::Timestamp;
use crate::ports::SubscriptionStore;

use super::WebhookOutcome;

/// Applies subscription deletion events.
pub struct SubscriptionDeletedHandler {
    subscriptions: Arc<dyn SubscriptionStore>,
}

impl SubscriptionDeletedHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionStore>) -> Self {
        Self { subscriptions }
    }

    pub async fn handle(
        &self,
        subscription_id: &str,
        event_period_end: Option<i64>,
    ) -> Result<WebhookOutcome, WebhookError> {
        let mut subscription = match self
            .subscriptions
            .find_by_stripe_subscription(subscription_id)
            .await?
        {
            Some(subscription) => subscription,
            None => {
                tracing::warn!(subscription_id, "Deletion event for unknown subscription");
                return Ok(WebhookOutcome::Acknowledged {
                    reason: "unknown subscription",
                });
            }
        };

        // The deletion event may carry a fresher period end than the row
        // (events can arrive out of order). Take it before deciding between
        // grace period and downgrade.
        if let Some(end) = event_period_end {
            subscription.current_period_end = Some(Timestamp::from_unix_secs(end));
        }

        let effect = subscription.record_deletion(Timestamp::now());
        self.subscriptions.update(&subscription).await?;

        match effect {
            CancellationEffect::GracePeriod => tracing::info!(
                subscription_id,
                user_id = %subscription.user_id,
                period_end = ?subscription.current_period_end,
                "Subscription canceled, paid access retained until period end"
            ),
            CancellationEffect::DowngradedToFree => tracing::info!(
                subscription_id,
                user_id = %subscription.user_id,
                "Subscription already expired, downgraded to free"
            ),
        }

        Ok(WebhookOutcome::SubscriptionCanceled {
            user_id: subscription.user_id.clone(),
            effect,
        })
    }
}
