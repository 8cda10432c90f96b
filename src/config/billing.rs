//! Billing configuration (Stripe + commission policy)

use serde::Deserialize;

use super::error::ValidationError;

/// Billing configuration.
///
/// Covers the Stripe API credentials, the webhook signing secret, and the
/// affiliate commission rate applied to paid invoices.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Stripe API key
    pub stripe_api_key: String,

    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,

    /// Commission rate paid to referring partners, as a fraction of the
    /// invoice amount (0.05 = 5%).
    #[serde(default = "default_commission_rate")]
    pub commission_rate: f64,

    /// Shared secret expected in the X-Admin-Token header on admin routes.
    pub admin_token: String,
}

impl BillingConfig {
    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_test_")
    }

    /// Check if using Stripe live mode
    pub fn is_live_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_live_")
    }

    /// Validate billing configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stripe_api_key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_API_KEY"));
        }
        if self.stripe_webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_WEBHOOK_SECRET"));
        }
        if self.admin_token.is_empty() {
            return Err(ValidationError::MissingRequired("ADMIN_TOKEN"));
        }

        // Verify key prefixes for safety
        if !self.stripe_api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if !self.stripe_webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }

        if !(0.0..=1.0).contains(&self.commission_rate) {
            return Err(ValidationError::InvalidCommissionRate);
        }

        Ok(())
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            stripe_api_key: String::new(),
            stripe_webhook_secret: String::new(),
            commission_rate: default_commission_rate(),
            admin_token: String::new(),
        }
    }
}

fn default_commission_rate() -> f64 {
    0.05
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> BillingConfig {
        BillingConfig {
            stripe_api_key: "sk_test_abcd1234".to_string(),
            stripe_webhook_secret: "whsec_xyz789".to_string(),
            commission_rate: 0.05,
            admin_token: "admin-secret".to_string(),
        }
    }

    #[test]
    fn test_is_test_mode() {
        let config = valid_config();
        assert!(config.is_test_mode());
        assert!(!config.is_live_mode());
    }

    #[test]
    fn test_is_live_mode() {
        let config = BillingConfig {
            stripe_api_key: "sk_live_xxx".to_string(),
            ..valid_config()
        };
        assert!(config.is_live_mode());
        assert!(!config.is_test_mode());
    }

    #[test]
    fn test_validation_missing_api_key() {
        let config = BillingConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_missing_webhook_secret() {
        let config = BillingConfig {
            stripe_webhook_secret: String::new(),
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_api_key_prefix() {
        let config = BillingConfig {
            stripe_api_key: "pk_test_xxx".to_string(), // Wrong prefix
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_webhook_secret_prefix() {
        let config = BillingConfig {
            stripe_webhook_secret: "secret_xxx".to_string(), // Wrong prefix
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_rate_above_one() {
        let config = BillingConfig {
            commission_rate: 1.5,
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_negative_rate() {
        let config = BillingConfig {
            commission_rate: -0.05,
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_commission_rate_is_five_percent() {
        let config = BillingConfig::default();
        assert_eq!(config.commission_rate, 0.05);
    }

    #[test]
    fn test_validation_valid_config() {
        assert!(valid_config().validate().is_ok());
    }
}
