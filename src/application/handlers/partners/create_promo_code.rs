//! Promo code creation (admin surface).

use std::sync::Arc;

use crate::domain::billing::{BillingError, Discount, DiscountScope, PromoCode};
use crate::domain::foundation::Timestamp;
use crate::ports::{InsertOutcome, PromoCodeStore};

/// Command to create a promo code for a partner.
#[derive(Debug, Clone)]
pub struct CreatePromoCodeCommand {
    pub code: String,
    pub partner_name: String,
    pub partner_email: String,
    pub discount: Discount,
    pub applies_to: DiscountScope,
    pub max_uses: Option<u32>,
    pub expires_at: Option<Timestamp>,
}

/// Handles promo code creation.
pub struct CreatePromoCodeHandler {
    promo_codes: Arc<dyn PromoCodeStore>,
}

impl CreatePromoCodeHandler {
    pub fn new(promo_codes: Arc<dyn PromoCodeStore>) -> Self {
        Self { promo_codes }
    }

    pub async fn handle(&self, cmd: CreatePromoCodeCommand) -> Result<PromoCode, BillingError> {
        let promo = PromoCode::new(
            &cmd.code,
            cmd.partner_name,
            cmd.partner_email,
            cmd.discount,
            cmd.applies_to,
            cmd.max_uses,
            cmd.expires_at,
        )?;

        match self.promo_codes.create(&promo).await? {
            InsertOutcome::Inserted => {
                tracing::info!(code = %promo.code, partner = %promo.partner_name, "Promo code created");
                Ok(promo)
            }
            InsertOutcome::AlreadyExists => Err(BillingError::DuplicateCode { code: promo.code }),
        }
    }
}
