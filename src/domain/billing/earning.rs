//! Affiliate earnings and commission arithmetic.
//!
//! All monetary values are integer minor-currency units (cents). The ledger
//! is append-only: an entry is written once by the invoice-paid handler and
//! mutated exactly once by the payout processor, flipping `pending` to
//! `paid`.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{EarningId, PromoCodeId, Timestamp, UserId, ValidationError};

use super::SubscriptionTier;

/// Commission rate as a fraction of the invoice amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommissionRate(f64);

impl CommissionRate {
    /// Creates a validated rate in `[0, 1]`.
    pub fn new(rate: f64) -> Result<Self, ValidationError> {
        if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
            return Err(ValidationError::invalid_format(
                "commission_rate",
                "must be a fraction between 0 and 1",
            ));
        }
        Ok(Self(rate))
    }

    /// Returns the rate as a raw fraction.
    pub fn as_fraction(&self) -> f64 {
        self.0
    }

    /// Commission owed on a payment, rounded to the nearest minor unit.
    ///
    /// 499 cents at 5% is 24.95, recorded as 25.
    pub fn commission_for(&self, amount_minor: i64) -> i64 {
        (amount_minor as f64 * self.0).round() as i64
    }
}

/// Payout state of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarningStatus {
    /// Earned but not yet paid out to the partner.
    Pending,

    /// Included in a completed payout.
    Paid,
}

impl EarningStatus {
    /// Returns the storage representation of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            EarningStatus::Pending => "pending",
            EarningStatus::Paid => "paid",
        }
    }

    /// Parses a status from its storage representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(EarningStatus::Pending),
            "paid" => Some(EarningStatus::Paid),
            _ => None,
        }
    }
}

/// One commission accrual, keyed by the invoice that produced it.
///
/// # Invariants
///
/// - `invoice_id` is unique across the ledger: a given invoice produces at
///   most one entry ever, no matter how many times its webhook is delivered
/// - `commission_amount` = round(`amount_paid` x `commission_rate`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffiliateEarning {
    /// Ledger entry id.
    pub id: EarningId,

    /// Partner (promo code) this commission belongs to.
    pub promo_code_id: PromoCodeId,

    /// User whose payment produced the commission.
    pub referred_user_id: UserId,

    /// Stripe invoice id - the natural idempotency key.
    pub invoice_id: String,

    /// Stripe payment reference (charge / payment intent), if present.
    pub payment_reference: Option<String>,

    /// Invoice amount paid, minor units.
    pub amount_paid: i64,

    /// Rate in effect when the commission was computed.
    pub commission_rate: f64,

    /// Commission owed, minor units.
    pub commission_amount: i64,

    /// Subscriber's tier at the time of payment.
    pub tier: SubscriptionTier,

    /// Pending until a payout claims it.
    pub status: EarningStatus,

    /// When the entry was created.
    pub created_at: Timestamp,

    /// When the entry was paid out.
    pub paid_at: Option<Timestamp>,

    /// How the payout was made (e.g. "paypal", "bank_transfer").
    pub payout_method: Option<String>,

    /// External payout reference.
    pub payout_reference: Option<String>,

    /// Free-text payout notes.
    pub payout_notes: Option<String>,
}

impl AffiliateEarning {
    /// Accrues a new pending earning for a paid invoice.
    pub fn accrue(
        promo_code_id: PromoCodeId,
        referred_user_id: UserId,
        invoice_id: impl Into<String>,
        payment_reference: Option<String>,
        amount_paid: i64,
        rate: CommissionRate,
        tier: SubscriptionTier,
    ) -> Self {
        Self {
            id: EarningId::new(),
            promo_code_id,
            referred_user_id,
            invoice_id: invoice_id.into(),
            payment_reference,
            amount_paid,
            commission_rate: rate.as_fraction(),
            commission_amount: rate.commission_for(amount_paid),
            tier,
            status: EarningStatus::Pending,
            created_at: Timestamp::now(),
            paid_at: None,
            payout_method: None,
            payout_reference: None,
            payout_notes: None,
        }
    }

    /// True if the entry has not been paid out yet.
    pub fn is_pending(&self) -> bool {
        self.status == EarningStatus::Pending
    }
}
