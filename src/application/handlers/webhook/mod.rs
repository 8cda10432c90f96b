//! Webhook event handlers.
//!
//! One handler per event type, composed by [`ProcessWebhookHandler`] which
//! owns verification, decoding, and dispatch. Every handler is idempotent:
//! replaying any event converges to the same stored state, which is what
//! makes the sender's at-least-once redelivery safe.

mod checkout_completed;
mod invoice_paid;
mod process_webhook;
mod subscription_deleted;
mod subscription_updated;

pub use checkout_completed::CheckoutCompletedHandler;
pub use invoice_paid::InvoicePaidHandler;
pub use process_webhook::{ProcessWebhookCommand, ProcessWebhookHandler};
pub use subscription_deleted::SubscriptionDeletedHandler;
pub use subscription_updated::SubscriptionUpdatedHandler;

use crate::domain::billing::CancellationEffect;
use crate::domain::foundation::UserId;

/// What processing a verified webhook did.
///
/// Everything here is acknowledged with a 2xx to the sender - including the
/// skip variants. Only [`crate::domain::billing::WebhookError`] produces
/// non-2xx responses.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    /// Checkout completed; the subscription row was written (or converged).
    SubscriptionUpserted { user_id: UserId },

    /// Status and period bounds were overwritten from a subscription update.
    SubscriptionSynced { subscription_id: String },

    /// A deletion event was applied.
    SubscriptionCanceled {
        user_id: UserId,
        effect: CancellationEffect,
    },

    /// A commission was accrued for a paid invoice.
    CommissionRecorded {
        invoice_id: String,
        commission_amount: i64,
    },

    /// Duplicate delivery of an invoice that already has a ledger entry.
    /// Absorbed silently - this IS the idempotency guarantee for money.
    DuplicateInvoice { invoice_id: String },

    /// Event was acknowledged without effect (missing metadata, unknown
    /// entity, nothing to do). Logged, never redelivered.
    Acknowledged { reason: &'static str },

    /// Event type we do not handle.
    Ignored { event_type: String },
}
