//! Stripe billing provider adapter.
//!
//! Implements the `BillingProvider` trait against the Stripe REST API. The
//! only call the webhook pipeline needs is fetching subscription detail for
//! a checkout session's subscription id.
//!
//! # Security
//!
//! Secrets are handled via `secrecy::SecretString` so they never land in
//! debug output.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::billing::SubscriptionStatus;
use crate::domain::foundation::Timestamp;
use crate::ports::{BillingProvider, BillingProviderError, SubscriptionDetail};

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for the Stripe API (default: https://api.stripe.com).
    api_base_url: String,
}

impl StripeConfig {
    /// Create a new Stripe configuration.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            api_base_url: "https://api.stripe.com".to_string(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Stripe implementation of [`BillingProvider`].
pub struct StripeBillingClient {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripeBillingClient {
    /// Create a new client with the given configuration.
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }
}

/// Subscription object as returned by the Stripe API. Only the fields we
/// read are declared.
#[derive(Debug, Deserialize)]
struct StripeSubscriptionObject {
    id: String,
    customer: String,
    status: String,
    current_period_start: i64,
    current_period_end: i64,
}

impl From<StripeSubscriptionObject> for SubscriptionDetail {
    fn from(sub: StripeSubscriptionObject) -> Self {
        SubscriptionDetail {
            id: sub.id,
            customer_id: sub.customer,
            status: SubscriptionStatus::from_provider(&sub.status),
            current_period_start: Timestamp::from_unix_secs(sub.current_period_start),
            current_period_end: Timestamp::from_unix_secs(sub.current_period_end),
        }
    }
}

#[async_trait]
impl BillingProvider for StripeBillingClient {
    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionDetail>, BillingProviderError> {
        let url = format!(
            "{}/v1/subscriptions/{}",
            self.config.api_base_url, subscription_id
        );

        let response = self
            .http_client
            .get(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| BillingProviderError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(
                status,
                error = %error_text,
                "Stripe get_subscription failed"
            );
            return Err(BillingProviderError::Api {
                status,
                message: error_text,
            });
        }

        let stripe_sub: StripeSubscriptionObject = response
            .json()
            .await
            .map_err(|e| BillingProviderError::Parse(e.to_string()))?;

        Ok(Some(stripe_sub.into()))
    }
}
