//! In-memory store implementations.
//!
//! Used by unit and integration tests, and handy for running the service
//! without a database. Each store serializes access through a `Mutex`, which
//! makes the conditional operations (uses-count increment, payout claim)
//! atomic the same way the SQL statements are in the PostgreSQL adapters.

mod earnings_ledger;
mod promo_code_store;
mod subscription_store;

pub use earnings_ledger::InMemoryEarningsLedger;
pub use promo_code_store::InMemoryPromoCodeStore;
pub use subscription_store::InMemorySubscriptionStore;
