//! Subscription store port.
//!
//! One row per user, keyed by user id. The upsert is the idempotency
//! mechanism for checkout events: replaying the same event converges to the
//! same row instead of failing on a duplicate key.

use async_trait::async_trait;

use crate::domain::billing::Subscription;
use crate::domain::foundation::{DomainError, UserId};

/// Port for subscription persistence.
///
/// Implementations must guarantee that `upsert` and `update` are each a
/// single atomic statement - concurrent webhook deliveries for the same user
/// must never interleave partial writes.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Inserts the row, or overwrites the existing row with the same user
    /// id ("insert or update on conflict by natural key").
    async fn upsert(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Persists mutations to an existing row, keyed by user id.
    ///
    /// # Errors
    ///
    /// Returns `SubscriptionNotFound` if no row exists for the user.
    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Finds the subscription for a user.
    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<Subscription>, DomainError>;

    /// Finds a subscription by its Stripe subscription id.
    ///
    /// Returns None for ids this system never recorded (e.g. a webhook for
    /// a subscription already migrated away).
    async fn find_by_stripe_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError>;
}
