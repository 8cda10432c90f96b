//! Partner summary listing (admin surface).
//!
//! Joins the promo code registry with ledger totals: uses, referred
//! revenue, pending and paid commission per partner.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::billing::BillingError;
use crate::domain::foundation::PromoCodeId;
use crate::ports::{EarningsLedger, PromoCodeStore};

/// One partner's aggregated performance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerSummary {
    pub promo_code_id: PromoCodeId,
    pub code: String,
    pub partner_name: String,
    pub partner_email: String,
    pub active: bool,
    pub uses_count: u32,
    pub max_uses: Option<u32>,

    /// Paid invoices attributed to the partner.
    pub conversions: u32,

    /// Sum of attributed invoice amounts, minor units.
    pub revenue: i64,

    /// Commission awaiting payout, minor units.
    pub commission_pending: i64,

    /// Commission already paid out, minor units.
    pub commission_paid: i64,
}

/// Produces the partner summary list.
pub struct ListPartnerSummariesHandler {
    promo_codes: Arc<dyn PromoCodeStore>,
    ledger: Arc<dyn EarningsLedger>,
}

impl ListPartnerSummariesHandler {
    pub fn new(promo_codes: Arc<dyn PromoCodeStore>, ledger: Arc<dyn EarningsLedger>) -> Self {
        Self { promo_codes, ledger }
    }

    pub async fn handle(&self) -> Result<Vec<PartnerSummary>, BillingError> {
        let codes = self.promo_codes.list().await?;
        let totals = self.ledger.totals_by_partner().await?;

        let summaries = codes
            .into_iter()
            .map(|code| {
                let t = totals.iter().find(|t| t.promo_code_id == code.id);
                PartnerSummary {
                    promo_code_id: code.id,
                    code: code.code,
                    partner_name: code.partner_name,
                    partner_email: code.partner_email,
                    active: code.active,
                    uses_count: code.uses_count,
                    max_uses: code.max_uses,
                    conversions: t.map(|t| t.conversions).unwrap_or(0),
                    revenue: t.map(|t| t.revenue).unwrap_or(0),
                    commission_pending: t.map(|t| t.commission_pending).unwrap_or(0),
                    commission_paid: t.map(|t| t.commission_paid).unwrap_or(0),
                }
            })
            .collect();

        Ok(summaries)
    }
}
