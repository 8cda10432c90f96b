//! Mock billing provider for tests and local development.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::ports::{BillingProvider, BillingProviderError, SubscriptionDetail};

/// Canned-response implementation of [`BillingProvider`].
#[derive(Default)]
pub struct MockBillingProvider {
    subscriptions: Mutex<HashMap<String, SubscriptionDetail>>,
    fail_with_network_error: bool,
}

impl MockBillingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that knows the given subscription.
    pub fn with_subscription(detail: SubscriptionDetail) -> Self {
        let mut subscriptions = HashMap::new();
        subscriptions.insert(detail.id.clone(), detail);
        Self {
            subscriptions: Mutex::new(subscriptions),
            fail_with_network_error: false,
        }
    }

    /// Provider whose every call fails with a network error.
    pub fn failing() -> Self {
        Self {
            subscriptions: Mutex::new(HashMap::new()),
            fail_with_network_error: true,
        }
    }

    /// Registers another known subscription.
    pub fn add_subscription(&self, detail: SubscriptionDetail) {
        self.subscriptions
            .lock()
            .unwrap()
            .insert(detail.id.clone(), detail);
    }
}

#[async_trait]
impl BillingProvider for MockBillingProvider {
    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionDetail>, BillingProviderError> {
        if self.fail_with_network_error {
            return Err(BillingProviderError::Network(
                "simulated network failure".to_string(),
            ));
        }
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .get(subscription_id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::SubscriptionStatus;
    use crate::domain::foundation::Timestamp;

    fn detail(id: &str) -> SubscriptionDetail {
        SubscriptionDetail {
            id: id.to_string(),
            customer_id: "cus_1".to_string(),
            status: SubscriptionStatus::Active,
            current_period_start: Timestamp::from_unix_secs(100),
            current_period_end: Timestamp::from_unix_secs(200),
        }
    }

    #[tokio::test]
    async fn returns_known_subscription() {
        let provider = MockBillingProvider::with_subscription(detail("sub_1"));
        let found = provider.get_subscription("sub_1").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn returns_none_for_unknown_subscription() {
        let provider = MockBillingProvider::new();
        let found = provider.get_subscription("sub_missing").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn failing_provider_errors() {
        let provider = MockBillingProvider::failing();
        let result = provider.get_subscription("sub_1").await;
        assert!(matches!(result, Err(BillingProviderError::Network(_))));
    }
}
