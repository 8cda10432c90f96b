//! Promo code activation and deletion (admin surface).
//!
//! Deletion is blocked while ledger entries reference the code - removing a
//! partner would orphan their earnings history. Deactivation is the
//! supported way to retire a code.

use std::sync::Arc;

use crate::domain::billing::BillingError;
use crate::domain::foundation::PromoCodeId;
use crate::ports::{DeleteOutcome, EarningsLedger, PromoCodeStore};

/// Activates or deactivates a promo code.
pub struct SetPromoCodeActiveHandler {
    promo_codes: Arc<dyn PromoCodeStore>,
}

impl SetPromoCodeActiveHandler {
    pub fn new(promo_codes: Arc<dyn PromoCodeStore>) -> Self {
        Self { promo_codes }
    }

    pub async fn handle(&self, id: PromoCodeId, active: bool) -> Result<(), BillingError> {
        if !self.promo_codes.set_active(&id, active).await? {
            return Err(BillingError::PartnerNotFound { id });
        }
        tracing::info!(promo_code_id = %id, active, "Promo code activity changed");
        Ok(())
    }
}

/// Deletes a promo code, unless earnings reference it.
pub struct DeletePromoCodeHandler {
    promo_codes: Arc<dyn PromoCodeStore>,
    ledger: Arc<dyn EarningsLedger>,
}

impl DeletePromoCodeHandler {
    pub fn new(promo_codes: Arc<dyn PromoCodeStore>, ledger: Arc<dyn EarningsLedger>) -> Self {
        Self { promo_codes, ledger }
    }

    pub async fn handle(&self, id: PromoCodeId) -> Result<(), BillingError> {
        // Ledger integrity wins over tidiness. The SQL adapter backs this
        // check with a RESTRICT foreign key, closing the race with a
        // concurrent accrual.
        if self.ledger.has_entries_for(&id).await? {
            return Err(BillingError::PromoCodeInUse { id });
        }

        match self.promo_codes.delete(&id).await? {
            DeleteOutcome::Deleted => {
                tracing::info!(promo_code_id = %id, "Promo code deleted");
                Ok(())
            }
            DeleteOutcome::NotFound => Err(BillingError::PartnerNotFound { id }),
            DeleteOutcome::InUse => Err(BillingError::PromoCodeInUse { id }),
        }
    }
}
