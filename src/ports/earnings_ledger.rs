//! Earnings ledger port.
//!
//! Append-only commission records, keyed by the external invoice id. The
//! insert's `AlreadyExists` outcome is the idempotency guarantee for
//! money-affecting operations: the duplicate-key conflict is a first-class
//! return value, not an exception used for flow control.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::billing::AffiliateEarning;
use crate::domain::foundation::{DomainError, PromoCodeId, Timestamp};

use super::InsertOutcome;

/// How a payout was executed, recorded onto every claimed row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutDetails {
    /// Payment channel, e.g. "paypal" or "bank_transfer".
    pub method: String,

    /// External reference for the transfer.
    pub reference: Option<String>,

    /// Free-text notes.
    pub notes: Option<String>,
}

/// What a payout claimed: number of rows flipped to `paid` and their
/// aggregate commission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutClaim {
    pub entries: u32,
    pub total_commission: i64,
}

/// Aggregated ledger totals for one partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerTotals {
    pub promo_code_id: PromoCodeId,

    /// Number of ledger entries (paid invoices attributed to the partner).
    pub conversions: u32,

    /// Sum of invoice amounts, minor units.
    pub revenue: i64,

    /// Commission not yet paid out, minor units.
    pub commission_pending: i64,

    /// Commission already paid out, minor units.
    pub commission_paid: i64,
}

/// Port for the affiliate earnings ledger.
#[async_trait]
pub trait EarningsLedger: Send + Sync {
    /// Inserts an earning guarded by the unique invoice id.
    ///
    /// `AlreadyExists` means this invoice already produced an entry - the
    /// caller treats that as success with no new row (duplicate delivery of
    /// the same event).
    async fn insert(&self, earning: &AffiliateEarning) -> Result<InsertOutcome, DomainError>;

    /// All entries for a partner, newest first.
    async fn list_for_partner(
        &self,
        promo_code_id: &PromoCodeId,
    ) -> Result<Vec<AffiliateEarning>, DomainError>;

    /// Claims every pending entry for the partner in ONE transaction:
    /// flips status to `paid`, stamps `paid_at` and the payout details, and
    /// returns what was claimed.
    ///
    /// The status flip MUST be conditional on `status = 'pending'` at the
    /// store so that two racing payouts can never both claim a row; the
    /// loser observes zero claimed entries.
    async fn mark_paid(
        &self,
        promo_code_id: &PromoCodeId,
        paid_at: Timestamp,
        details: &PayoutDetails,
    ) -> Result<PayoutClaim, DomainError>;

    /// Whether any entries reference the promo code (pending or paid).
    async fn has_entries_for(&self, promo_code_id: &PromoCodeId) -> Result<bool, DomainError>;

    /// Ledger totals grouped by partner, for the admin summary.
    async fn totals_by_partner(&self) -> Result<Vec<PartnerTotals>, DomainError>;
}
