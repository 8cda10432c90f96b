//! Webhook error taxonomy.
//!
//! Status codes decide the sender's retry behavior, so the split between
//! retryable and terminal errors is load-bearing: a transient store failure
//! must produce a 5xx (redeliver), while a bad signature or malformed payload
//! must not trigger a redelivery storm. Events the pipeline chooses to skip
//! (unknown entity, missing metadata, duplicate invoice) are acknowledged
//! outcomes, not errors, and never appear here.

use http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::DomainError;

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Webhook signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Webhook timestamp is outside the acceptable window (5 minutes).
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Event timestamp is in the future beyond clock skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Failed to parse webhook payload or signature header.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Store operation failed. Retryable: the sender should redeliver,
    /// which is safe because every handler is idempotent.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Outbound call to the billing provider failed. Retryable.
    #[error("Billing provider error: {0}")]
    Provider(String),
}

impl WebhookError {
    /// Returns true if the sender should retry delivering this webhook.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Storage(_) | WebhookError::Provider(_))
    }

    /// Maps the error to an appropriate HTTP status code.
    ///
    /// - 4xx: terminal, the sender will not retry
    /// - 5xx: transient, the sender will redeliver
    pub fn status_code(&self) -> StatusCode {
        match self {
            // Auth failures - don't retry, re-sending cannot help
            WebhookError::InvalidSignature | WebhookError::TimestampOutOfRange => {
                StatusCode::UNAUTHORIZED
            }

            // Bad request - don't retry
            WebhookError::InvalidTimestamp | WebhookError::ParseError(_) => {
                StatusCode::BAD_REQUEST
            }

            // Transient failures - redeliver
            WebhookError::Storage(_) | WebhookError::Provider(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Storage(err.to_string())
    }
}
