//! Handler for `invoice.paid` - commission accrual.
//!
//! The only money-writing path in the system. The ledger insert is guarded
//! by the invoice id, so replaying the same event can never create a second
//! commission: `AlreadyExists` is success, not an error.
//!
//! This handler is state-neutral with respect to the subscription row: it
//! reads the referral attribution and writes the ledger, nothing else. An
//! invoice arriving for a subscription in its canceled grace period still
//! accrues commission (the money moved); any re-activation arrives
//! separately as a subscription update event.

use std::sync::Arc;

use crate::domain::billing::{AffiliateEarning, CommissionRate, WebhookError};
use crate::ports::{EarningsLedger, InsertOutcome, SubscriptionStore};

use super::WebhookOutcome;

/// Accrues affiliate commission for paid invoices.
pub struct InvoicePaidHandler {
    subscriptions: Arc<dyn SubscriptionStore>,
    ledger: Arc<dyn EarningsLedger>,
    rate: CommissionRate,
}

impl InvoicePaidHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionStore>,
        ledger: Arc<dyn EarningsLedger>,
        rate: CommissionRate,
    ) -> Self {
        Self {
            subscriptions,
            ledger,
            rate,
        }
    }

    pub async fn handle(
        &self,
        invoice_id: &str,
        subscription_id: Option<&str>,
        amount_paid: i64,
        payment_reference: Option<&str>,
    ) -> Result<WebhookOutcome, WebhookError> {
        if amount_paid <= 0 {
            return Ok(WebhookOutcome::Acknowledged {
                reason: "zero-amount invoice",
            });
        }

        let subscription_id = match subscription_id {
            Some(id) => id,
            None => {
                return Ok(WebhookOutcome::Acknowledged {
                    reason: "invoice has no subscription",
                })
            }
        };

        let subscription = match self
            .subscriptions
            .find_by_stripe_subscription(subscription_id)
            .await?
        {
            Some(subscription) => subscription,
            None => {
                tracing::warn!(invoice_id, subscription_id, "Invoice for unknown subscription");
                return Ok(WebhookOutcome::Acknowledged {
                    reason: "unknown subscription",
                });
            }
        };

        // No referral, no commission.
        let promo_code_id = match subscription.referral_code_id {
            Some(id) => id,
            None => {
                return Ok(WebhookOutcome::Acknowledged {
                    reason: "subscription has no referral",
                })
            }
        };

        let earning = AffiliateEarning::accrue(
            promo_code_id,
            subscription.user_id.clone(),
            invoice_id,
            payment_reference.map(str::to_string),
            amount_paid,
            self.rate,
            subscription.tier,
        );

        match self.ledger.insert(&earning).await? {
            InsertOutcome::Inserted => {
                tracing::info!(
                    invoice_id,
                    promo_code_id = %promo_code_id,
                    amount_paid,
                    commission = earning.commission_amount,
                    "Commission accrued"
                );
                Ok(WebhookOutcome::CommissionRecorded {
                    invoice_id: invoice_id.to_string(),
                    commission_amount: earning.commission_amount,
                })
            }
            InsertOutcome::AlreadyExists => {
                // Duplicate delivery of the same invoice event.
                tracing::info!(invoice_id, "Duplicate invoice delivery absorbed");
                Ok(WebhookOutcome::DuplicateInvoice {
                    invoice_id: invoice_id.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryEarningsLedger, InMemorySubscriptionStore};
    use crate::domain::billing::{
        EarningStatus, Subscription, SubscriptionStatus, SubscriptionTier,
    };
    use crate::domain::foundation::{PromoCodeId, Timestamp, UserId};

    fn subscription(referral: Option<PromoCodeId>) -> Subscription {
        Subscription::from_checkout(
            UserId::new("user-1").unwrap(),
            SubscriptionTier::Premium,
            SubscriptionStatus::Active,
            "sub_1".to_string(),
            Some("cus_1".to_string()),
            Timestamp::from_unix_secs(100),
            Timestamp::from_unix_secs(200),
            referral,
        )
        .unwrap()
    }

    fn handler(
        store: Arc<InMemorySubscriptionStore>,
        ledger: Arc<InMemoryEarningsLedger>,
    ) -> InvoicePaidHandler {
        InvoicePaidHandler::new(store, ledger, CommissionRate::new(0.05).unwrap())
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Commission Accrual Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn paid_invoice_accrues_commission() {
        let code_id = PromoCodeId::new();
        let store = Arc::new(InMemorySubscriptionStore::with_subscription(subscription(
            Some(code_id),
        )));
        let ledger = Arc::new(InMemoryEarningsLedger::new());
        let h = handler(store, ledger.clone());

        let outcome = h
            .handle("in_1", Some("sub_1"), 499, Some("pi_1"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            WebhookOutcome::CommissionRecorded {
                invoice_id: "in_1".to_string(),
                commission_amount: 25,
            }
        );

        let entries = ledger.entries();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.promo_code_id, code_id);
        assert_eq!(entry.amount_paid, 499);
        assert_eq!(entry.commission_amount, 25);
        assert_eq!(entry.status, EarningStatus::Pending);
        assert_eq!(entry.tier, SubscriptionTier::Premium);
        assert_eq!(entry.payment_reference, Some("pi_1".to_string()));
    }

    #[tokio::test]
    async fn larger_invoice_uses_same_rate() {
        let store = Arc::new(InMemorySubscriptionStore::with_subscription(subscription(
            Some(PromoCodeId::new()),
        )));
        let ledger = Arc::new(InMemoryEarningsLedger::new());
        let h = handler(store, ledger.clone());

        h.handle("in_1", Some("sub_1"), 10_000, None).await.unwrap();

        assert_eq!(ledger.entries()[0].commission_amount, 500);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Idempotence Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn replaying_invoice_creates_exactly_one_entry() {
        let store = Arc::new(InMemorySubscriptionStore::with_subscription(subscription(
            Some(PromoCodeId::new()),
        )));
        let ledger = Arc::new(InMemoryEarningsLedger::new());
        let h = handler(store, ledger.clone());

        let first = h.handle("in_1", Some("sub_1"), 499, None).await.unwrap();
        for _ in 0..4 {
            let replay = h.handle("in_1", Some("sub_1"), 499, None).await.unwrap();
            assert_eq!(
                replay,
                WebhookOutcome::DuplicateInvoice {
                    invoice_id: "in_1".to_string()
                }
            );
        }

        assert!(matches!(first, WebhookOutcome::CommissionRecorded { .. }));
        assert_eq!(ledger.entries().len(), 1);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Skip Path Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn zero_amount_invoice_is_ignored() {
        let store = Arc::new(InMemorySubscriptionStore::with_subscription(subscription(
            Some(PromoCodeId::new()),
        )));
        let ledger = Arc::new(InMemoryEarningsLedger::new());
        let h = handler(store, ledger.clone());

        let outcome = h.handle("in_1", Some("sub_1"), 0, None).await.unwrap();

        assert!(matches!(outcome, WebhookOutcome::Acknowledged { .. }));
        assert!(ledger.entries().is_empty());
    }

    #[tokio::test]
    async fn negative_amount_invoice_is_ignored() {
        let store = Arc::new(InMemorySubscriptionStore::with_subscription(subscription(
            Some(PromoCodeId::new()),
        )));
        let ledger = Arc::new(InMemoryEarningsLedger::new());
        let h = handler(store, ledger.clone());

        let outcome = h.handle("in_1", Some("sub_1"), -499, None).await.unwrap();

        assert!(matches!(outcome, WebhookOutcome::Acknowledged { .. }));
        assert!(ledger.entries().is_empty());
    }

    #[tokio::test]
    async fn invoice_without_subscription_is_ignored() {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let ledger = Arc::new(InMemoryEarningsLedger::new());
        let h = handler(store, ledger.clone());

        let outcome = h.handle("in_1", None, 499, None).await.unwrap();

        assert!(matches!(outcome, WebhookOutcome::Acknowledged { .. }));
        assert!(ledger.entries().is_empty());
    }

    #[tokio::test]
    async fn invoice_for_unknown_subscription_is_ignored() {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let ledger = Arc::new(InMemoryEarningsLedger::new());
        let h = handler(store, ledger.clone());

        let outcome = h.handle("in_1", Some("sub_ghost"), 499, None).await.unwrap();

        assert!(matches!(outcome, WebhookOutcome::Acknowledged { .. }));
        assert!(ledger.entries().is_empty());
    }

    #[tokio::test]
    async fn no_referral_no_commission() {
        let store = Arc::new(InMemorySubscriptionStore::with_subscription(subscription(
            None,
        )));
        let ledger = Arc::new(InMemoryEarningsLedger::new());
        let h = handler(store, ledger.clone());

        let outcome = h.handle("in_1", Some("sub_1"), 499, None).await.unwrap();

        assert!(matches!(outcome, WebhookOutcome::Acknowledged { .. }));
        assert!(ledger.entries().is_empty());
    }

    #[tokio::test]
    async fn grace_period_subscription_still_accrues_commission() {
        let mut sub = subscription(Some(PromoCodeId::new()));
        sub.status = SubscriptionStatus::Canceled; // canceled, within grace
        let store = Arc::new(InMemorySubscriptionStore::with_subscription(sub));
        let ledger = Arc::new(InMemoryEarningsLedger::new());
        let h = handler(store.clone(), ledger.clone());

        let outcome = h.handle("in_1", Some("sub_1"), 499, None).await.unwrap();

        assert!(matches!(outcome, WebhookOutcome::CommissionRecorded { .. }));
        // State-neutral: the handler never touches the subscription row
        assert_eq!(store.rows()[0].status, SubscriptionStatus::Canceled);
    }
}
