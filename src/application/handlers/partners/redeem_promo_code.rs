//! Promo code redemption.
//!
//! Called by the checkout flow when a user applies a code. Re-validates,
//! then delegates the uses-count increment to the store's atomic
//! check-and-increment - two tabs racing for the last use cannot both win.

use std::sync::Arc;

use crate::domain::billing::{BillingError, DiscountInfo, PromoCode, PromoCodeInvalidReason};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::PromoCodeStore;

/// Command to redeem a promo code.
#[derive(Debug, Clone)]
pub struct RedeemPromoCodeCommand {
    pub code: String,
    pub user_id: UserId,
}

/// Read-only promo code validation.
///
/// Used by the checkout page to show the discount before the user commits.
/// No mutation: the uses count moves only on redemption.
pub struct ValidatePromoCodeHandler {
    promo_codes: Arc<dyn PromoCodeStore>,
}

impl ValidatePromoCodeHandler {
    pub fn new(promo_codes: Arc<dyn PromoCodeStore>) -> Self {
        Self { promo_codes }
    }

    pub async fn handle(&self, raw_code: &str) -> Result<DiscountInfo, BillingError> {
        let code = PromoCode::normalize_code(raw_code).map_err(|_| {
            BillingError::PromoCodeInvalid {
                reason: PromoCodeInvalidReason::NotFound,
            }
        })?;

        let promo = self
            .promo_codes
            .find_by_code(&code)
            .await?
            .ok_or(BillingError::PromoCodeInvalid {
                reason: PromoCodeInvalidReason::NotFound,
            })?;

        promo
            .validate_at(Timestamp::now())
            .map_err(|reason| BillingError::PromoCodeInvalid { reason })
    }
}

/// Handles promo code redemption.
pub struct RedeemPromoCodeHandler {
    promo_codes: Arc<dyn PromoCodeStore>,
}

impl RedeemPromoCodeHandler {
    pub fn new(promo_codes: Arc<dyn PromoCodeStore>) -> Self {
        Self { promo_codes }
    }

    pub async fn handle(
        &self,
        cmd: RedeemPromoCodeCommand,
    ) -> Result<DiscountInfo, BillingError> {
        let code = PromoCode::normalize_code(&cmd.code).map_err(|_| {
            BillingError::PromoCodeInvalid {
                reason: PromoCodeInvalidReason::NotFound,
            }
        })?;

        let promo = self
            .promo_codes
            .find_by_code(&code)
            .await?
            .ok_or(BillingError::PromoCodeInvalid {
                reason: PromoCodeInvalidReason::NotFound,
            })?;

        let info = promo
            .validate_at(Timestamp::now())
            .map_err(|reason| BillingError::PromoCodeInvalid { reason })?;

        // Atomic check-and-increment at the store. Validation above can race
        // with other redemptions; this cannot.
        if !self.promo_codes.increment_uses(&promo.id).await? {
            return Err(BillingError::UsageLimitExceeded { code: promo.code });
        }

        tracing::info!(
            code = %info.code,
            user_id = %cmd.user_id,
            "Promo code redeemed"
        );

        Ok(info)
    }
}
