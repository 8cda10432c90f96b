//! PostgreSQL store implementations.

mod earnings_ledger;
mod promo_code_store;
mod subscription_store;

pub use earnings_ledger::PostgresEarningsLedger;
pub use promo_code_store::PostgresPromoCodeStore;
pub use subscription_store::PostgresSubscriptionStore;
