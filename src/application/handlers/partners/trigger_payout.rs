//! Payout processing (admin surface).
//!
//! Claims every pending earning for a partner in one transaction and
//! reports the aggregate paid. The claim is a conditional update at the
//! store, so a second payout racing the first observes zero pending rows
//! and fails with `NothingToPayout` - pending sums are never double-paid.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::billing::BillingError;
use crate::domain::foundation::{PromoCodeId, Timestamp};
use crate::ports::{EarningsLedger, PayoutDetails, PromoCodeStore};

/// Command to pay out a partner's pending commission.
#[derive(Debug, Clone)]
pub struct TriggerPayoutCommand {
    pub promo_code_id: PromoCodeId,
    pub method: String,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

/// Receipt for a completed payout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutReceipt {
    pub promo_code_id: PromoCodeId,
    pub entries_paid: u32,
    pub amount_paid: i64,
    pub paid_at: Timestamp,
}

/// Handles partner payouts.
pub struct TriggerPayoutHandler {
    promo_codes: Arc<dyn PromoCodeStore>,
    ledger: Arc<dyn EarningsLedger>,
}

impl TriggerPayoutHandler {
    pub fn new(promo_codes: Arc<dyn PromoCodeStore>, ledger: Arc<dyn EarningsLedger>) -> Self {
        Self { promo_codes, ledger }
    }

    pub async fn handle(&self, cmd: TriggerPayoutCommand) -> Result<PayoutReceipt, BillingError> {
        if cmd.method.trim().is_empty() {
            return Err(BillingError::validation("method", "payout method is required"));
        }

        // Partner must exist before we touch the ledger.
        if self
            .promo_codes
            .find_by_id(&cmd.promo_code_id)
            .await?
            .is_none()
        {
            return Err(BillingError::PartnerNotFound {
                id: cmd.promo_code_id,
            });
        }

        let paid_at = Timestamp::now();
        let details = PayoutDetails {
            method: cmd.method.clone(),
            reference: cmd.reference.clone(),
            notes: cmd.notes.clone(),
        };

        // One conditional claim instead of sum-then-mark: whatever this call
        // flips to paid is exactly what it reports, and a concurrent payout
        // cannot observe the same rows as pending.
        let claim = self
            .ledger
            .mark_paid(&cmd.promo_code_id, paid_at, &details)
            .await?;

        if claim.entries == 0 {
            return Err(BillingError::NothingToPayout {
                id: cmd.promo_code_id,
            });
        }

        tracing::info!(
            promo_code_id = %cmd.promo_code_id,
            entries = claim.entries,
            amount = claim.total_commission,
            method = %cmd.method,
            "Partner payout completed"
        );

        Ok(PayoutReceipt {
            promo_code_id: cmd.promo_code_id,
            entries_paid: claim.entries,
            amount_paid: claim.total_commission,
            paid_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryEarningsLedger, InMemoryPromoCodeStore};
    use crate::domain::billing::{
        AffiliateEarning, CommissionRate, Discount, DiscountKind, DiscountScope, EarningStatus,
        PromoCode, SubscriptionTier,
    };
    use crate::domain::foundation::UserId;
    use crate::ports::EarningsLedger as _;

    fn code() -> PromoCode {
        PromoCode::new(
            "REEF2026",
            "Partner",
            "partner@example.com",
            Discount::new(DiscountKind::Percent, 10).unwrap(),
            DiscountScope::All,
            None,
            None,
        )
        .unwrap()
    }

    async fn accrue(ledger: &InMemoryEarningsLedger, partner: PromoCodeId, invoice: &str, amount: i64) {
        ledger
            .insert(&AffiliateEarning::accrue(
                partner,
                UserId::new("user-1").unwrap(),
                invoice,
                None,
                amount,
                CommissionRate::new(0.05).unwrap(),
                SubscriptionTier::Premium,
            ))
            .await
            .unwrap();
    }

    fn cmd(partner: PromoCodeId) -> TriggerPayoutCommand {
        TriggerPayoutCommand {
            promo_code_id: partner,
            method: "paypal".to_string(),
            reference: Some("PP-2026-001".to_string()),
            notes: Some("Q1 payout".to_string()),
        }
    }

    #[tokio::test]
    async fn payout_claims_all_pending_and_reports_total() {
        let c = code();
        let partner = c.id;
        let store = Arc::new(InMemoryPromoCodeStore::with_code(c));
        let ledger = Arc::new(InMemoryEarningsLedger::new());
        accrue(&ledger, partner, "in_1", 499).await; // commission 25
        accrue(&ledger, partner, "in_2", 10_000).await; // commission 500

        let handler = TriggerPayoutHandler::new(store, ledger.clone());
        let receipt = handler.handle(cmd(partner)).await.unwrap();

        assert_eq!(receipt.entries_paid, 2);
        assert_eq!(receipt.amount_paid, 525);

        let entries = ledger.entries();
        assert!(entries.iter().all(|e| e.status == EarningStatus::Paid));
        assert!(entries
            .iter()
            .all(|e| e.payout_method.as_deref() == Some("paypal")));
        assert!(entries
            .iter()
            .all(|e| e.payout_reference.as_deref() == Some("PP-2026-001")));
    }

    #[tokio::test]
    async fn second_payout_finds_nothing() {
        let c = code();
        let partner = c.id;
        let store = Arc::new(InMemoryPromoCodeStore::with_code(c));
        let ledger = Arc::new(InMemoryEarningsLedger::new());
        accrue(&ledger, partner, "in_1", 499).await;

        let handler = TriggerPayoutHandler::new(store, ledger);
        handler.handle(cmd(partner)).await.unwrap();
        let result = handler.handle(cmd(partner)).await;

        assert!(matches!(result, Err(BillingError::NothingToPayout { .. })));
    }

    #[tokio::test]
    async fn payout_with_no_pending_entries_fails() {
        let c = code();
        let partner = c.id;
        let store = Arc::new(InMemoryPromoCodeStore::with_code(c));
        let ledger = Arc::new(InMemoryEarningsLedger::new());

        let handler = TriggerPayoutHandler::new(store, ledger);
        let result = handler.handle(cmd(partner)).await;

        assert!(matches!(result, Err(BillingError::NothingToPayout { .. })));
    }

    #[tokio::test]
    async fn payout_for_unknown_partner_fails() {
        let store = Arc::new(InMemoryPromoCodeStore::new());
        let ledger = Arc::new(InMemoryEarningsLedger::new());

        let handler = TriggerPayoutHandler::new(store, ledger);
        let result = handler.handle(cmd(PromoCodeId::new())).await;

        assert!(matches!(result, Err(BillingError::PartnerNotFound { .. })));
    }

    #[tokio::test]
    async fn payout_requires_method() {
        let c = code();
        let partner = c.id;
        let store = Arc::new(InMemoryPromoCodeStore::with_code(c));
        let ledger = Arc::new(InMemoryEarningsLedger::new());

        let handler = TriggerPayoutHandler::new(store, ledger);
        let mut command = cmd(partner);
        command.method = "  ".to_string();
        let result = handler.handle(command).await;

        assert!(matches!(result, Err(BillingError::Validation { .. })));
    }

    #[tokio::test]
    async fn concurrent_payouts_never_double_pay() {
        let c = code();
        let partner = c.id;
        let store = Arc::new(InMemoryPromoCodeStore::with_code(c));
        let ledger = Arc::new(InMemoryEarningsLedger::new());
        accrue(&ledger, partner, "in_1", 499).await;
        accrue(&ledger, partner, "in_2", 10_000).await;

        let handler = Arc::new(TriggerPayoutHandler::new(store, ledger));
        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let handler = handler.clone();
                tokio::spawn(async move { handler.handle(cmd(partner)).await })
            })
            .collect();

        let mut paid_total = 0;
        let mut successes = 0;
        for result in futures::future::join_all(tasks).await {
            if let Ok(receipt) = result.unwrap() {
                successes += 1;
                paid_total += receipt.amount_paid;
            }
        }

        // Exactly one payout wins the whole pending set
        assert_eq!(successes, 1);
        assert_eq!(paid_total, 525);
    }
}
