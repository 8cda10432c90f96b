//! Promo code store port.
//!
//! The registry of partner codes. The store owns the two operations that
//! must be atomic: duplicate-code rejection on create and the
//! check-and-increment on redemption.

use async_trait::async_trait;

use crate::domain::billing::PromoCode;
use crate::domain::foundation::{DomainError, PromoCodeId};

use super::InsertOutcome;

/// Result of attempting to delete a promo code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The code was deleted.
    Deleted,

    /// No code with that id exists.
    NotFound,

    /// Affiliate earnings reference the code; deletion is blocked to keep
    /// the ledger reconstructible. Deactivate the code instead.
    InUse,
}

/// Port for promo code persistence.
#[async_trait]
pub trait PromoCodeStore: Send + Sync {
    /// Creates a promo code. `AlreadyExists` means another code with the
    /// same (case-insensitive) code string is present.
    async fn create(&self, code: &PromoCode) -> Result<InsertOutcome, DomainError>;

    /// Case-insensitive lookup by code string.
    async fn find_by_code(&self, code: &str) -> Result<Option<PromoCode>, DomainError>;

    /// Lookup by id.
    async fn find_by_id(&self, id: &PromoCodeId) -> Result<Option<PromoCode>, DomainError>;

    /// All codes, newest first.
    async fn list(&self) -> Result<Vec<PromoCode>, DomainError>;

    /// Activates or deactivates a code. Returns false if the id is unknown.
    async fn set_active(&self, id: &PromoCodeId, active: bool) -> Result<bool, DomainError>;

    /// Atomically increments the uses count, but only if the post-increment
    /// value stays within `max_uses`.
    ///
    /// Returns `Ok(true)` when the increment was applied and `Ok(false)`
    /// when the cap (or a concurrent redemption) prevented it. The
    /// check-and-increment MUST be one atomic statement at the store - two
    /// concurrent redemptions may each pass validation but only one may
    /// take the last remaining use.
    async fn increment_uses(&self, id: &PromoCodeId) -> Result<bool, DomainError>;

    /// Deletes a code unless ledger entries reference it.
    async fn delete(&self, id: &PromoCodeId) -> Result<DeleteOutcome, DomainError>;
}
