//! Webhook processor: verify, decode, dispatch.
//!
//! The single entry point for raw webhook deliveries. A payload that fails
//! signature verification mutates nothing; a verified payload is decoded
//! once into a typed event and routed to its handler. Unrecognized event
//! types are acknowledged without action so the processor can introduce new
//! types without breaking us.

use crate::domain::billing::{BillingEvent, WebhookError, WebhookVerifier};

use super::{
    CheckoutCompletedHandler, InvoicePaidHandler, SubscriptionDeletedHandler,
    SubscriptionUpdatedHandler, WebhookOutcome,
};

/// Command to process a raw webhook delivery.
#[derive(Debug, Clone)]
pub struct ProcessWebhookCommand {
    /// Raw request body, exactly as received (the signature covers these
    /// bytes).
    pub payload: Vec<u8>,

    /// Value of the signature header.
    pub signature: String,
}

/// Verifies, decodes, and dispatches webhook events.
pub struct ProcessWebhookHandler {
    verifier: WebhookVerifier,
    checkout_completed: CheckoutCompletedHandler,
    subscription_updated: SubscriptionUpdatedHandler,
    subscription_deleted: SubscriptionDeletedHandler,
    invoice_paid: InvoicePaidHandler,
}

impl ProcessWebhookHandler {
    pub fn new(
        verifier: WebhookVerifier,
        checkout_completed: CheckoutCompletedHandler,
        subscription_updated: SubscriptionUpdatedHandler,
        subscription_deleted: SubscriptionDeletedHandler,
        invoice_paid: InvoicePaidHandler,
    ) -> Self {
        Self {
            verifier,
            checkout_completed,
            subscription_updated,
            subscription_deleted,
            invoice_paid,
        }
    }

    pub async fn handle(
        &self,
        cmd: ProcessWebhookCommand,
    ) -> Result<WebhookOutcome, WebhookError> {
        // 1. Verify the signature. Failure here performs no state mutation.
        let envelope = self
            .verifier
            .verify_and_parse(&cmd.payload, &cmd.signature)?;

        // 2. Decode the loosely-typed envelope into the closed event union.
        let event = BillingEvent::decode(&envelope)?;

        tracing::debug!(event_id = %envelope.id, event_type = %envelope.event_type, "Webhook verified");

        // 3. Dispatch.
        match event {
            BillingEvent::CheckoutCompleted {
                session_id,
                subscription_id,
                metadata,
                ..
            } => {
                self.checkout_completed
                    .handle(&session_id, subscription_id.as_deref(), &metadata)
                    .await
            }

            BillingEvent::SubscriptionUpdated {
                subscription_id,
                status,
                current_period_start,
                current_period_end,
            } => {
                self.subscription_updated
                    .handle(
                        &subscription_id,
                        &status,
                        current_period_start,
                        current_period_end,
                    )
                    .await
            }

            BillingEvent::SubscriptionDeleted {
                subscription_id,
                current_period_end,
            } => {
                self.subscription_deleted
                    .handle(&subscription_id, current_period_end)
                    .await
            }

            BillingEvent::InvoicePaid {
                invoice_id,
                subscription_id,
                amount_paid,
                payment_reference,
            } => {
                self.invoice_paid
                    .handle(
                        &invoice_id,
                        subscription_id.as_deref(),
                        amount_paid,
                        payment_reference.as_deref(),
                    )
                    .await
            }

            BillingEvent::InvoicePaymentFailed { invoice_id, .. } => {
                // Dunning is the processor's job; the lifecycle consequences
                // arrive as subscription.updated / .deleted events.
                tracing::info!(invoice_id = %invoice_id, "Invoice payment failed, no action");
                Ok(WebhookOutcome::Acknowledged {
                    reason: "payment failures handled via subscription lifecycle",
                })
            }

            BillingEvent::Other(event_type) => {
                tracing::debug!(event_type = %event_type, "Ignoring unhandled event type");
                Ok(WebhookOutcome::Ignored { event_type })
            }
        }
    }
}
