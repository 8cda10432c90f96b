//! In-memory implementation of SubscriptionStore.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::billing::Subscription;
use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::ports::SubscriptionStore;

/// In-memory subscription store keyed by user id.
#[derive(Default)]
pub struct InMemorySubscriptionStore {
    rows: Mutex<Vec<Subscription>>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with one row.
    pub fn with_subscription(subscription: Subscription) -> Self {
        Self {
            rows: Mutex::new(vec![subscription]),
        }
    }

    /// Snapshot of all rows, for assertions.
    pub fn rows(&self) -> Vec<Subscription> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn upsert(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|r| r.user_id == subscription.user_id) {
            Some(existing) => {
                // Overwrite everything except the original creation time,
                // matching ON CONFLICT DO UPDATE in the SQL adapter.
                let created_at = existing.created_at;
                *existing = subscription.clone();
                existing.created_at = created_at;
            }
            None => rows.push(subscription.clone()),
        }
        Ok(())
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|r| r.user_id == subscription.user_id) {
            Some(existing) => {
                *existing = subscription.clone();
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::SubscriptionNotFound,
                "Subscription not found",
            )),
        }
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<Subscription>, DomainError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|r| &r.user_id == user_id).cloned())
    }

    async fn find_by_stripe_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .find(|r| r.stripe_subscription_id.as_deref() == Some(subscription_id))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::{SubscriptionStatus, SubscriptionTier};
    use crate::domain::foundation::Timestamp;

    fn subscription(user: &str, sub_id: &str) -> Subscription {
        Subscription::from_checkout(
            UserId::new(user).unwrap(),
            SubscriptionTier::Premium,
            SubscriptionStatus::Active,
            sub_id.to_string(),
            Some("cus_1".to_string()),
            Timestamp::from_unix_secs(100),
            Timestamp::from_unix_secs(200),
            None,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn upsert_inserts_then_overwrites() {
        let store = InMemorySubscriptionStore::new();
        let sub = subscription("user-1", "sub_1");

        store.upsert(&sub).await.unwrap();
        assert_eq!(store.rows().len(), 1);

        let mut changed = sub.clone();
        changed.tier = SubscriptionTier::SuperPremium;
        store.upsert(&changed).await.unwrap();

        let rows = store.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].tier, SubscriptionTier::SuperPremium);
    }

    #[tokio::test]
    async fn upsert_preserves_created_at() {
        let store = InMemorySubscriptionStore::new();
        let sub = subscription("user-1", "sub_1");
        store.upsert(&sub).await.unwrap();
        let original_created = store.rows()[0].created_at;

        let replay = subscription("user-1", "sub_1");
        store.upsert(&replay).await.unwrap();

        assert_eq!(store.rows()[0].created_at, original_created);
    }

    #[tokio::test]
    async fn update_fails_for_missing_row() {
        let store = InMemorySubscriptionStore::new();
        let result = store.update(&subscription("user-x", "sub_x")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn find_by_stripe_subscription_matches() {
        let store = InMemorySubscriptionStore::with_subscription(subscription("user-1", "sub_42"));

        let found = store.find_by_stripe_subscription("sub_42").await.unwrap();
        assert!(found.is_some());

        let missing = store.find_by_stripe_subscription("sub_other").await.unwrap();
        assert!(missing.is_none());
    }
}
