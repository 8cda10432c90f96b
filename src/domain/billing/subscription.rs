//! Subscription aggregate.
//!
//! One row per user, created by the first successful checkout and mutated by
//! every subsequent billing event. Rows are never physically deleted; ending
//! a subscription downgrades it to the free tier instead.
//!
//! # Invariants
//!
//! - `user_id` is unique (one subscription per user, enforced by the store)
//! - an `Active` status always carries a Stripe subscription id
//! - tier is always one of the three enumerated values

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, PromoCodeId, Timestamp, UserId};

use super::{SubscriptionStatus, SubscriptionTier};

/// What a `customer.subscription.deleted` event did to the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancellationEffect {
    /// Period end is still in the future: tier and period end are retained
    /// so paid features last until the period runs out naturally.
    GracePeriod,

    /// Period end had already passed at processing time: the row was
    /// downgraded straight to the free tier.
    DowngradedToFree,
}

/// A user's subscription record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Owner of this subscription. Natural key for the store.
    pub user_id: UserId,

    /// Current tier. Set at checkout, changed only by downgrade-to-free.
    pub tier: SubscriptionTier,

    /// Lifecycle status.
    pub status: SubscriptionStatus,

    /// Stripe subscription id. Present whenever status is `Active`,
    /// cleared on deletion.
    pub stripe_subscription_id: Option<String>,

    /// Stripe customer id.
    pub stripe_customer_id: Option<String>,

    /// Start of the current billing period.
    pub current_period_start: Option<Timestamp>,

    /// End of the current billing period. After cancellation this marks
    /// when paid access lapses.
    pub current_period_end: Option<Timestamp>,

    /// Promo code the user checked out with, if any. Drives commission
    /// attribution on every subsequent paid invoice.
    pub referral_code_id: Option<PromoCodeId>,

    /// When the subscription row was created.
    pub created_at: Timestamp,

    /// When the subscription row was last updated.
    pub updated_at: Timestamp,
}

impl Subscription {
    /// Builds the row written by a successful checkout.
    ///
    /// # Errors
    ///
    /// Returns an error if the status is `Active` but no Stripe
    /// subscription id was supplied - an active row without a billing
    /// reference would be unreconcilable.
    #[allow(clippy::too_many_arguments)]
    pub fn from_checkout(
        user_id: UserId,
        tier: SubscriptionTier,
        status: SubscriptionStatus,
        stripe_subscription_id: String,
        stripe_customer_id: Option<String>,
        period_start: Timestamp,
        period_end: Timestamp,
        referral_code_id: Option<PromoCodeId>,
    ) -> Result<Self, DomainError> {
        if stripe_subscription_id.is_empty() {
            return Err(DomainError::validation(
                "stripe_subscription_id",
                "Active subscription requires a billing subscription id",
            ));
        }

        let now = Timestamp::now();
        Ok(Self {
            user_id,
            tier,
            status,
            stripe_subscription_id: Some(stripe_subscription_id),
            stripe_customer_id,
            current_period_start: Some(period_start),
            current_period_end: Some(period_end),
            referral_code_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies a `customer.subscription.updated` event: overwrite status and
    /// period bounds. Tier never changes here - it is set at checkout and
    /// only reset by the downgrade path.
    pub fn apply_billing_update(
        &mut self,
        status: SubscriptionStatus,
        period_start: Timestamp,
        period_end: Timestamp,
    ) {
        self.status = status;
        self.current_period_start = Some(period_start);
        self.current_period_end = Some(period_end);
        self.updated_at = Timestamp::now();
    }

    /// Applies a `customer.subscription.deleted` event.
    ///
    /// If the period end is already past at `now`, the row drops straight to
    /// the free tier and all billing references are cleared. Otherwise only
    /// the status flips and the billing id is cleared; tier and period end
    /// are retained so paid features persist through the grace period.
    ///
    /// No scheduled job promotes a grace-period row later - readers derive
    /// effective access via [`Subscription::has_paid_access`].
    pub fn record_deletion(&mut self, now: Timestamp) -> CancellationEffect {
        let already_expired = match self.current_period_end {
            Some(end) => !end.is_after(&now),
            None => true,
        };

        self.status = SubscriptionStatus::Canceled;
        self.stripe_subscription_id = None;
        self.updated_at = now;

        if already_expired {
            self.tier = SubscriptionTier::Free;
            self.current_period_start = None;
            self.current_period_end = None;
            CancellationEffect::DowngradedToFree
        } else {
            CancellationEffect::GracePeriod
        }
    }

    /// Whether the user currently has paid-tier access.
    ///
    /// Active paid rows always do; canceled rows do until their recorded
    /// period end passes. This comparison against the caller's clock IS the
    /// grace-period mechanism - there is no stored "grace" state.
    pub fn has_paid_access(&self, now: Timestamp) -> bool {
        if !self.tier.is_paid() {
            return false;
        }
        match self.status {
            SubscriptionStatus::Active => true,
            SubscriptionStatus::Canceled => self
                .current_period_end
                .map(|end| end.is_after(&now))
                .unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user_id() -> UserId {
        UserId::new("user-123").unwrap()
    }

    fn active_subscription() -> Subscription {
        Subscription::from_checkout(
            test_user_id(),
            SubscriptionTier::Premium,
            SubscriptionStatus::Active,
            "sub_123".to_string(),
            Some("cus_123".to_string()),
            Timestamp::from_unix_secs(1_700_000_000),
            Timestamp::from_unix_secs(1_702_592_000),
            None,
        )
        .unwrap()
    }

    // Construction tests

    #[test]
    fn from_checkout_builds_active_row() {
        let sub = active_subscription();

        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.tier, SubscriptionTier::Premium);
        assert_eq!(sub.stripe_subscription_id, Some("sub_123".to_string()));
        assert_eq!(sub.stripe_customer_id, Some("cus_123".to_string()));
        assert!(sub.referral_code_id.is_none());
    }

    #[test]
    fn from_checkout_rejects_empty_subscription_id() {
        let result = Subscription::from_checkout(
            test_user_id(),
            SubscriptionTier::Premium,
            SubscriptionStatus::Active,
            String::new(),
            None,
            Timestamp::now(),
            Timestamp::now().add_days(30),
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn from_checkout_records_referral() {
        let code_id = PromoCodeId::new();
        let sub = Subscription::from_checkout(
            test_user_id(),
            SubscriptionTier::SuperPremium,
            SubscriptionStatus::Active,
            "sub_456".to_string(),
            None,
            Timestamp::now(),
            Timestamp::now().add_days(30),
            Some(code_id),
        )
        .unwrap();

        assert_eq!(sub.referral_code_id, Some(code_id));
    }

    // Billing update tests

    #[test]
    fn apply_billing_update_overwrites_status_and_bounds() {
        let mut sub = active_subscription();
        let new_start = Timestamp::from_unix_secs(1_702_592_000);
        let new_end = Timestamp::from_unix_secs(1_705_184_000);

        sub.apply_billing_update(SubscriptionStatus::Canceled, new_start, new_end);

        assert_eq!(sub.status, SubscriptionStatus::Canceled);
        assert_eq!(sub.current_period_start, Some(new_start));
        assert_eq!(sub.current_period_end, Some(new_end));
    }

    #[test]
    fn apply_billing_update_never_changes_tier() {
        let mut sub = active_subscription();
        sub.apply_billing_update(
            SubscriptionStatus::Active,
            Timestamp::now(),
            Timestamp::now().add_days(30),
        );
        assert_eq!(sub.tier, SubscriptionTier::Premium);
    }

    // Deletion / grace period tests

    #[test]
    fn deletion_before_period_end_enters_grace() {
        let mut sub = active_subscription();
        let now = Timestamp::from_unix_secs(1_701_000_000); // before period end

        let effect = sub.record_deletion(now);

        assert_eq!(effect, CancellationEffect::GracePeriod);
        assert_eq!(sub.status, SubscriptionStatus::Canceled);
        assert_eq!(sub.tier, SubscriptionTier::Premium); // retained
        assert!(sub.stripe_subscription_id.is_none()); // cleared
        assert!(sub.current_period_end.is_some()); // retained
    }

    #[test]
    fn deletion_after_period_end_downgrades_to_free() {
        let mut sub = active_subscription();
        let now = Timestamp::from_unix_secs(1_703_000_000); // past period end

        let effect = sub.record_deletion(now);

        assert_eq!(effect, CancellationEffect::DowngradedToFree);
        assert_eq!(sub.status, SubscriptionStatus::Canceled);
        assert_eq!(sub.tier, SubscriptionTier::Free);
        assert!(sub.stripe_subscription_id.is_none());
        assert!(sub.current_period_start.is_none());
        assert!(sub.current_period_end.is_none());
    }

    #[test]
    fn deletion_exactly_at_period_end_downgrades() {
        let mut sub = active_subscription();
        let now = sub.current_period_end.unwrap();

        let effect = sub.record_deletion(now);

        assert_eq!(effect, CancellationEffect::DowngradedToFree);
    }

    #[test]
    fn deletion_without_period_end_downgrades() {
        let mut sub = active_subscription();
        sub.current_period_end = None;

        let effect = sub.record_deletion(Timestamp::now());

        assert_eq!(effect, CancellationEffect::DowngradedToFree);
    }

    // Access tests

    #[test]
    fn active_paid_subscription_has_access() {
        let sub = active_subscription();
        assert!(sub.has_paid_access(Timestamp::from_unix_secs(1_701_000_000)));
    }

    #[test]
    fn grace_period_keeps_access_until_period_end() {
        let mut sub = active_subscription();
        sub.record_deletion(Timestamp::from_unix_secs(1_701_000_000));

        // Still within the paid period
        assert!(sub.has_paid_access(Timestamp::from_unix_secs(1_702_000_000)));
        // Period end has now lapsed
        assert!(!sub.has_paid_access(Timestamp::from_unix_secs(1_702_592_001)));
    }

    #[test]
    fn free_tier_never_has_paid_access() {
        let mut sub = active_subscription();
        sub.record_deletion(Timestamp::from_unix_secs(1_703_000_000));

        assert_eq!(sub.tier, SubscriptionTier::Free);
        assert!(!sub.has_paid_access(Timestamp::from_unix_secs(0)));
    }
}
