//! Ports - async trait contracts between the application core and the
//! outside world (stores and the payment processor).

mod billing_provider;
mod earnings_ledger;
mod promo_code_store;
mod subscription_store;

pub use billing_provider::{BillingProvider, BillingProviderError, SubscriptionDetail};
pub use earnings_ledger::{EarningsLedger, PartnerTotals, PayoutClaim, PayoutDetails};
pub use promo_code_store::{DeleteOutcome, PromoCodeStore};
pub use subscription_store::SubscriptionStore;

/// Result of a guarded insert.
///
/// `AlreadyExists` is not an error: for idempotency-keyed writes it is the
/// signal that a duplicate delivery was absorbed, and callers branch on it
/// explicitly instead of catching a duplicate-key exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written.
    Inserted,

    /// A row with the same natural key already existed; nothing was written.
    AlreadyExists,
}
