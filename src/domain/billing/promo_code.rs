//! Promo code entity.
//!
//! A promo code ties a partner to the users they refer. Codes are created by
//! administrators, matched case-insensitively at checkout, and every paid
//! invoice of a referred subscription accrues commission to the code's
//! partner.
//!
//! The code string is immutable after creation and stored normalized
//! (uppercase). Retiring a code means deactivating it; deletion is blocked
//! while ledger entries reference it.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PromoCodeId, Timestamp, ValidationError};

/// Kind of discount a promo code grants at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// Percentage off the subscription price (value = whole percent, 1-100).
    Percent,

    /// Fixed amount off, in minor currency units.
    FixedAmount,
}

/// Which tiers a promo code can be applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountScope {
    /// Any paid tier.
    All,

    /// Premium checkouts only.
    Premium,

    /// Super-premium checkouts only.
    SuperPremium,
}

/// A discount with its kind and magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    pub kind: DiscountKind,
    pub value: i64,
}

impl Discount {
    /// Creates a validated discount.
    ///
    /// # Errors
    ///
    /// - Percent discounts must be between 1 and 100.
    /// - Fixed-amount discounts must be positive.
    pub fn new(kind: DiscountKind, value: i64) -> Result<Self, ValidationError> {
        match kind {
            DiscountKind::Percent => {
                if !(1..=100).contains(&value) {
                    return Err(ValidationError::out_of_range(
                        "discount_percent",
                        1,
                        100,
                        value,
                    ));
                }
            }
            DiscountKind::FixedAmount => {
                if value <= 0 {
                    return Err(ValidationError::invalid_format(
                        "discount_amount",
                        "fixed discount must be positive",
                    ));
                }
            }
        }
        Ok(Self { kind, value })
    }
}

/// Reason a promo code cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromoCodeInvalidReason {
    /// Code does not exist in the registry.
    NotFound,

    /// Code has been deactivated by an administrator.
    Inactive,

    /// Code has expired (campaign ended).
    Expired {
        /// When the code expired.
        expired_at: Timestamp,
    },

    /// Code has reached its maximum redemption count.
    Exhausted {
        /// How many times the code has been used.
        used: u32,
        /// Maximum allowed uses.
        max: u32,
    },
}

impl PromoCodeInvalidReason {
    /// Get a user-facing message for the invalid reason.
    pub fn user_message(&self) -> String {
        match self {
            PromoCodeInvalidReason::NotFound => {
                "This promo code was not found. Please check and try again.".to_string()
            }
            PromoCodeInvalidReason::Inactive => {
                "This promo code is no longer valid.".to_string()
            }
            PromoCodeInvalidReason::Expired { expired_at } => {
                format!("This promo code expired on {}.", expired_at)
            }
            PromoCodeInvalidReason::Exhausted { used, max } => {
                format!(
                    "This promo code has been fully redeemed ({}/{} uses).",
                    used, max
                )
            }
        }
    }
}

impl std::fmt::Display for PromoCodeInvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

/// Discount details returned to a caller that validated a code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountInfo {
    pub code_id: PromoCodeId,
    pub code: String,
    pub discount: Discount,
    pub applies_to: DiscountScope,
}

/// A partner's promo code as stored in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoCode {
    /// Unique identifier; also identifies the partner in the ledger.
    pub id: PromoCodeId,

    /// Normalized (uppercase) code string. Unique case-insensitively,
    /// immutable after creation.
    pub code: String,

    /// Partner display name.
    pub partner_name: String,

    /// Partner contact email for payout correspondence.
    pub partner_email: String,

    /// Discount granted at checkout.
    pub discount: Discount,

    /// Tiers the code applies to.
    pub applies_to: DiscountScope,

    /// Maximum redemptions. None = unlimited.
    pub max_uses: Option<u32>,

    /// How many times the code has been redeemed.
    pub uses_count: u32,

    /// Optional campaign end.
    pub expires_at: Option<Timestamp>,

    /// Whether the code is currently active.
    pub active: bool,

    /// When the code was created.
    pub created_at: Timestamp,
}

impl PromoCode {
    /// Normalizes a raw code string: trimmed, uppercased.
    ///
    /// # Errors
    ///
    /// Rejects empty codes, codes over 32 characters, and characters other
    /// than ASCII alphanumerics and hyphens.
    pub fn normalize_code(raw: &str) -> Result<String, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("code"));
        }
        if trimmed.len() > 32 {
            return Err(ValidationError::out_of_range(
                "code_length",
                1,
                32,
                trimmed.len() as i64,
            ));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(ValidationError::invalid_format(
                "code",
                "alphanumeric characters and hyphens only",
            ));
        }
        Ok(trimmed.to_uppercase())
    }

    /// Creates a new promo code with a fresh id and zero uses.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        code: &str,
        partner_name: impl Into<String>,
        partner_email: impl Into<String>,
        discount: Discount,
        applies_to: DiscountScope,
        max_uses: Option<u32>,
        expires_at: Option<Timestamp>,
    ) -> Result<Self, ValidationError> {
        let partner_name = partner_name.into();
        if partner_name.trim().is_empty() {
            return Err(ValidationError::empty_field("partner_name"));
        }

        Ok(Self {
            id: PromoCodeId::new(),
            code: Self::normalize_code(code)?,
            partner_name,
            partner_email: partner_email.into(),
            discount,
            applies_to,
            max_uses,
            uses_count: 0,
            expires_at,
            active: true,
            created_at: Timestamp::now(),
        })
    }

    /// Validates the code against activity, expiry, and the usage cap.
    ///
    /// Read-only: redemption (the uses-count increment) happens atomically
    /// at the store, not here.
    pub fn validate_at(&self, now: Timestamp) -> Result<DiscountInfo, PromoCodeInvalidReason> {
        if !self.active {
            return Err(PromoCodeInvalidReason::Inactive);
        }

        if let Some(expires_at) = self.expires_at {
            if !expires_at.is_after(&now) {
                return Err(PromoCodeInvalidReason::Expired { expired_at: expires_at });
            }
        }

        if let Some(max) = self.max_uses {
            if self.uses_count >= max {
                return Err(PromoCodeInvalidReason::Exhausted {
                    used: self.uses_count,
                    max,
                });
            }
        }

        Ok(DiscountInfo {
            code_id: self.id,
            code: self.code.clone(),
            discount: self.discount,
            applies_to: self.applies_to,
        })
    }

    /// True if another uses-count increment would stay within the cap.
    pub fn has_uses_remaining(&self) -> bool {
        match self.max_uses {
            Some(max) => self.uses_count < max,
            None => true,
        }
    }
}
