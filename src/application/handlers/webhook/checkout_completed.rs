//! Handler for `checkout.session.completed`.
//!
//! Creates (or converges) the subscription row for the user named in the
//! checkout metadata. The upsert keyed by user id makes this handler
//! idempotent under redelivery.

use std::sync::Arc;

use crate::domain::billing::{CheckoutMetadata, PromoCode, Subscription, SubscriptionTier, WebhookError};
use crate::domain::foundation::{PromoCodeId, UserId};
use crate::ports::{BillingProvider, PromoCodeStore, SubscriptionStore};

use super::WebhookOutcome;

/// Handles checkout completion: resolve the referral, fetch authoritative
/// subscription detail, upsert the row.
pub struct CheckoutCompletedHandler {
    subscriptions: Arc<dyn SubscriptionStore>,
    promo_codes: Arc<dyn PromoCodeStore>,
    billing: Arc<dyn BillingProvider>,
}

impl CheckoutCompletedHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionStore>,
        promo_codes: Arc<dyn PromoCodeStore>,
        billing: Arc<dyn BillingProvider>,
    ) -> Self {
        Self {
            subscriptions,
            promo_codes,
            billing,
        }
    }

    pub async fn handle(
        &self,
        session_id: &str,
        subscription_id: Option<&str>,
        metadata: &CheckoutMetadata,
    ) -> Result<WebhookOutcome, WebhookError> {
        // 1. Required metadata. A session without user id or tier is not
        //    ours to process - acknowledge so the sender does not hammer us
        //    with redeliveries that can never succeed.
        let user_id = match metadata.user_id.as_deref().and_then(|s| UserId::new(s).ok()) {
            Some(id) => id,
            None => {
                tracing::warn!(session_id, "Checkout session missing or invalid user_id metadata");
                return Ok(WebhookOutcome::Acknowledged {
                    reason: "checkout metadata missing user_id",
                });
            }
        };

        let tier = match metadata.tier.as_deref().and_then(SubscriptionTier::parse) {
            Some(tier) => tier,
            None => {
                tracing::warn!(
                    session_id,
                    user_id = %user_id,
                    "Checkout session missing or invalid tier metadata"
                );
                return Ok(WebhookOutcome::Acknowledged {
                    reason: "checkout metadata missing tier",
                });
            }
        };

        let subscription_id = match subscription_id {
            Some(id) if !id.is_empty() => id,
            _ => {
                tracing::warn!(session_id, user_id = %user_id, "Checkout session has no subscription id");
                return Ok(WebhookOutcome::Acknowledged {
                    reason: "checkout session has no subscription id",
                });
            }
        };

        // 2. Authoritative detail from the billing system.
        let detail = self
            .billing
            .get_subscription(subscription_id)
            .await
            .map_err(|e| WebhookError::Provider(e.to_string()))?;

        let detail = match detail {
            Some(detail) => detail,
            None => {
                tracing::warn!(
                    subscription_id,
                    "Billing provider does not know the checkout's subscription"
                );
                return Ok(WebhookOutcome::Acknowledged {
                    reason: "subscription unknown to billing provider",
                });
            }
        };

        // 3. Referral resolution. Unknown or malformed codes are tolerated:
        //    the subscription is still created, just without attribution.
        let referral_code_id = match metadata.promo_code.as_deref() {
            Some(raw) => self.resolve_referral(raw).await?,
            None => None,
        };

        // 4. Upsert by user id - replaying this event converges on the same
        //    row.
        let subscription = Subscription::from_checkout(
            user_id.clone(),
            tier,
            detail.status,
            detail.id,
            Some(detail.customer_id),
            detail.current_period_start,
            detail.current_period_end,
            referral_code_id,
        )
        .map_err(|e| WebhookError::Storage(e.to_string()))?;

        self.subscriptions.upsert(&subscription).await?;

        tracing::info!(
            user_id = %user_id,
            tier = %tier,
            referred = referral_code_id.is_some(),
            "Subscription upserted from checkout"
        );

        Ok(WebhookOutcome::SubscriptionUpserted { user_id })
    }

    async fn resolve_referral(&self, raw: &str) -> Result<Option<PromoCodeId>, WebhookError> {
        let code = match PromoCode::normalize_code(raw) {
            Ok(code) => code,
            Err(_) => {
                tracing::warn!(code = raw, "Ignoring malformed promo code on checkout");
                return Ok(None);
            }
        };

        match self.promo_codes.find_by_code(&code).await? {
            Some(promo) => Ok(Some(promo.id)),
            None => {
                tracing::warn!(code = %code, "Unknown promo code on checkout, referral omitted");
                Ok(None)
            }
        }
    }
}
