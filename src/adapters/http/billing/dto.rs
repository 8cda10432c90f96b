//! Request/response DTOs for the billing HTTP surface.

use serde::{Deserialize, Serialize};

use crate::application::handlers::partners::{PartnerSummary, PayoutReceipt};
use crate::domain::billing::{DiscountInfo, DiscountKind, DiscountScope, PromoCode};
use crate::domain::foundation::Timestamp;

/// Standard error payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// POST /api/promo/redeem
#[derive(Debug, Clone, Deserialize)]
pub struct RedeemPromoCodeRequest {
    pub code: String,
}

/// Discount granted to a successful redemption.
#[derive(Debug, Clone, Serialize)]
pub struct DiscountResponse {
    pub code: String,
    pub discount_kind: DiscountKind,
    pub discount_value: i64,
    pub applies_to: DiscountScope,
}

impl From<DiscountInfo> for DiscountResponse {
    fn from(info: DiscountInfo) -> Self {
        Self {
            code: info.code,
            discount_kind: info.discount.kind,
            discount_value: info.discount.value,
            applies_to: info.applies_to,
        }
    }
}

/// POST /api/partners/codes
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePromoCodeRequest {
    pub code: String,
    pub partner_name: String,
    pub partner_email: String,
    pub discount_kind: DiscountKind,
    pub discount_value: i64,
    #[serde(default = "default_scope")]
    pub applies_to: DiscountScope,
    pub max_uses: Option<u32>,
    pub expires_at: Option<Timestamp>,
}

fn default_scope() -> DiscountScope {
    DiscountScope::All
}

/// A promo code as returned by the admin endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct PromoCodeResponse {
    pub id: String,
    pub code: String,
    pub partner_name: String,
    pub partner_email: String,
    pub discount_kind: DiscountKind,
    pub discount_value: i64,
    pub applies_to: DiscountScope,
    pub max_uses: Option<u32>,
    pub uses_count: u32,
    pub expires_at: Option<Timestamp>,
    pub active: bool,
    pub created_at: Timestamp,
}

impl From<PromoCode> for PromoCodeResponse {
    fn from(code: PromoCode) -> Self {
        Self {
            id: code.id.to_string(),
            code: code.code,
            partner_name: code.partner_name,
            partner_email: code.partner_email,
            discount_kind: code.discount.kind,
            discount_value: code.discount.value,
            applies_to: code.applies_to,
            max_uses: code.max_uses,
            uses_count: code.uses_count,
            expires_at: code.expires_at,
            active: code.active,
            created_at: code.created_at,
        }
    }
}

/// POST /api/partners/codes/{id}/active
#[derive(Debug, Clone, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

/// POST /api/partners/{id}/payout
#[derive(Debug, Clone, Deserialize)]
pub struct PayoutRequest {
    pub method: String,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

/// Payout receipt returned to the admin.
#[derive(Debug, Clone, Serialize)]
pub struct PayoutResponse {
    pub promo_code_id: String,
    pub entries_paid: u32,
    pub amount_paid: i64,
    pub paid_at: Timestamp,
}

impl From<PayoutReceipt> for PayoutResponse {
    fn from(receipt: PayoutReceipt) -> Self {
        Self {
            promo_code_id: receipt.promo_code_id.to_string(),
            entries_paid: receipt.entries_paid,
            amount_paid: receipt.amount_paid,
            paid_at: receipt.paid_at,
        }
    }
}

/// One row of GET /api/partners/summary.
#[derive(Debug, Clone, Serialize)]
pub struct PartnerSummaryResponse {
    pub promo_code_id: String,
    pub code: String,
    pub partner_name: String,
    pub partner_email: String,
    pub active: bool,
    pub uses_count: u32,
    pub max_uses: Option<u32>,
    pub conversions: u32,
    pub revenue: i64,
    pub commission_pending: i64,
    pub commission_paid: i64,
}

impl From<PartnerSummary> for PartnerSummaryResponse {
    fn from(summary: PartnerSummary) -> Self {
        Self {
            promo_code_id: summary.promo_code_id.to_string(),
            code: summary.code,
            partner_name: summary.partner_name,
            partner_email: summary.partner_email,
            active: summary.active,
            uses_count: summary.uses_count,
            max_uses: summary.max_uses,
            conversions: summary.conversions,
            revenue: summary.revenue,
            commission_pending: summary.commission_pending,
            commission_paid: summary.commission_paid,
        }
    }
}
