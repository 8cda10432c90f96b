//! In-memory implementation of EarningsLedger.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::billing::{AffiliateEarning, EarningStatus};
use crate::domain::foundation::{DomainError, PromoCodeId, Timestamp};
use crate::ports::{EarningsLedger, InsertOutcome, PartnerTotals, PayoutClaim, PayoutDetails};

/// In-memory affiliate earnings ledger.
///
/// The payout claim runs under the store mutex so two racing payouts can
/// never both claim a row, matching the conditional UPDATE of the SQL
/// adapter.
#[derive(Default)]
pub struct InMemoryEarningsLedger {
    entries: Mutex<Vec<AffiliateEarning>>,
}

impl InMemoryEarningsLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries, for assertions.
    pub fn entries(&self) -> Vec<AffiliateEarning> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl EarningsLedger for InMemoryEarningsLedger {
    async fn insert(&self, earning: &AffiliateEarning) -> Result<InsertOutcome, DomainError> {
        let mut entries = self.entries.lock().unwrap();
        if entries.iter().any(|e| e.invoice_id == earning.invoice_id) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        entries.push(earning.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn list_for_partner(
        &self,
        promo_code_id: &PromoCodeId,
    ) -> Result<Vec<AffiliateEarning>, DomainError> {
        let mut entries: Vec<_> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| &e.promo_code_id == promo_code_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    async fn mark_paid(
        &self,
        promo_code_id: &PromoCodeId,
        paid_at: Timestamp,
        details: &PayoutDetails,
    ) -> Result<PayoutClaim, DomainError> {
        let mut entries = self.entries.lock().unwrap();
        let mut claim = PayoutClaim {
            entries: 0,
            total_commission: 0,
        };

        for entry in entries
            .iter_mut()
            .filter(|e| &e.promo_code_id == promo_code_id && e.status == EarningStatus::Pending)
        {
            entry.status = EarningStatus::Paid;
            entry.paid_at = Some(paid_at);
            entry.payout_method = Some(details.method.clone());
            entry.payout_reference = details.reference.clone();
            entry.payout_notes = details.notes.clone();
            claim.entries += 1;
            claim.total_commission += entry.commission_amount;
        }

        Ok(claim)
    }

    async fn has_entries_for(&self, promo_code_id: &PromoCodeId) -> Result<bool, DomainError> {
        let entries = self.entries.lock().unwrap();
        Ok(entries.iter().any(|e| &e.promo_code_id == promo_code_id))
    }

    async fn totals_by_partner(&self) -> Result<Vec<PartnerTotals>, DomainError> {
        let entries = self.entries.lock().unwrap();
        let mut by_partner: HashMap<PromoCodeId, PartnerTotals> = HashMap::new();

        for entry in entries.iter() {
            let totals = by_partner
                .entry(entry.promo_code_id)
                .or_insert_with(|| PartnerTotals {
                    promo_code_id: entry.promo_code_id,
                    conversions: 0,
                    revenue: 0,
                    commission_pending: 0,
                    commission_paid: 0,
                });
            totals.conversions += 1;
            totals.revenue += entry.amount_paid;
            match entry.status {
                EarningStatus::Pending => totals.commission_pending += entry.commission_amount,
                EarningStatus::Paid => totals.commission_paid += entry.commission_amount,
            }
        }

        Ok(by_partner.into_values().collect())
    }
}
