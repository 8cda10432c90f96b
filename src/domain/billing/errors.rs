//! Billing domain errors.
//!
//! [`BillingError`] is the error surface of the application handlers that
//! back the administrative and redemption endpoints. Webhook processing has
//! its own taxonomy in [`super::webhook_errors`] because its failure
//! semantics (retry vs acknowledge) are different.

use thiserror::Error;

use crate::domain::foundation::{DomainError, PromoCodeId, ValidationError};

use super::PromoCodeInvalidReason;

/// Errors surfaced by promo-code and payout operations.
#[derive(Debug, Error)]
pub enum BillingError {
    /// The promo code cannot be applied (not found, inactive, expired, or
    /// exhausted).
    #[error("Promo code invalid: {reason}")]
    PromoCodeInvalid { reason: PromoCodeInvalidReason },

    /// A concurrent redemption won the last remaining use.
    #[error("Promo code '{code}' has reached its usage limit")]
    UsageLimitExceeded { code: String },

    /// A promo code with this code string already exists.
    #[error("Promo code '{code}' already exists")]
    DuplicateCode { code: String },

    /// No promo code (partner) with this id.
    #[error("Partner {id} not found")]
    PartnerNotFound { id: PromoCodeId },

    /// The partner has no pending earnings to pay out.
    #[error("Nothing to pay out for partner {id}")]
    NothingToPayout { id: PromoCodeId },

    /// The promo code has ledger entries referencing it and cannot be
    /// deleted. Deactivate it instead.
    #[error("Promo code {id} has recorded earnings and cannot be deleted")]
    PromoCodeInUse { id: PromoCodeId },

    /// Request-level validation failed.
    #[error("Validation failed for '{field}': {reason}")]
    Validation { field: String, reason: String },

    /// Store or external-service failure.
    #[error("Infrastructure error: {0}")]
    Infrastructure(String),
}

impl BillingError {
    /// Creates a validation error.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        BillingError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an infrastructure error.
    pub fn infrastructure(message: impl Into<String>) -> Self {
        BillingError::Infrastructure(message.into())
    }

    /// A user- or admin-facing message for this error.
    pub fn message(&self) -> String {
        match self {
            BillingError::PromoCodeInvalid { reason } => reason.user_message(),
            other => other.to_string(),
        }
    }
}

impl From<DomainError> for BillingError {
    fn from(err: DomainError) -> Self {
        BillingError::Infrastructure(err.to_string())
    }
}

impl From<ValidationError> for BillingError {
    fn from(err: ValidationError) -> Self {
        match &err {
            ValidationError::EmptyField { field }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::InvalidFormat { field, .. } => BillingError::Validation {
                field: field.clone(),
                reason: err.to_string(),
            },
        }
    }
}
