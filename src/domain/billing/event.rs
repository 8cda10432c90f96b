//! Webhook event payloads.
//!
//! The payment processor sends loosely-typed JSON envelopes. They are decoded
//! exactly once, at the boundary, into the closed [`BillingEvent`] union -
//! each variant carries only the fields its handler actually reads.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::webhook_errors::WebhookError;

/// Raw webhook envelope as delivered by the processor (signature already
/// verified when one of these exists).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventEnvelope {
    /// Unique identifier for the event (evt_xxx format).
    pub id: String,

    /// Type of event (e.g., "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    pub created: i64,

    /// Object containing event-specific data.
    pub data: EventData,

    /// Whether this is a live mode event (vs test mode).
    #[serde(default)]
    pub livemode: bool,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventData {
    /// The object that triggered the event (shape depends on event type).
    pub object: serde_json::Value,
}

/// Checkout session metadata our checkout page attaches.
///
/// All fields are optional at this level: a session missing `user_id` or
/// `tier` is acknowledged and skipped by the handler, never bounced back to
/// the sender.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutMetadata {
    pub user_id: Option<String>,
    pub tier: Option<String>,
    pub promo_code: Option<String>,
}

impl CheckoutMetadata {
    fn from_map(map: HashMap<String, String>) -> Self {
        Self {
            user_id: map.get("user_id").cloned(),
            tier: map.get("tier").cloned(),
            promo_code: map.get("promo_code").cloned(),
        }
    }
}

/// Typed billing event, one variant per handled webhook type.
#[derive(Debug, Clone, PartialEq)]
pub enum BillingEvent {
    /// `checkout.session.completed`
    CheckoutCompleted {
        session_id: String,
        customer_id: Option<String>,
        subscription_id: Option<String>,
        metadata: CheckoutMetadata,
    },

    /// `customer.subscription.updated`
    SubscriptionUpdated {
        subscription_id: String,
        status: String,
        current_period_start: i64,
        current_period_end: i64,
    },

    /// `customer.subscription.deleted`
    SubscriptionDeleted {
        subscription_id: String,
        current_period_end: Option<i64>,
    },

    /// `invoice.paid`
    InvoicePaid {
        invoice_id: String,
        subscription_id: Option<String>,
        amount_paid: i64,
        payment_reference: Option<String>,
    },

    /// `invoice.payment_failed` (currently acknowledged without action)
    InvoicePaymentFailed {
        invoice_id: String,
        subscription_id: Option<String>,
    },

    /// Any event type we do not handle. Acknowledged without action so the
    /// processor can add types without breaking us.
    Other(String),
}

// Wire shapes for the `data.object` payloads we care about. Only the fields
// we read are declared; serde drops the rest.

#[derive(Debug, Deserialize)]
struct CheckoutSessionObject {
    id: String,
    customer: Option<String>,
    subscription: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionObject {
    id: String,
    status: String,
    current_period_start: i64,
    current_period_end: i64,
}

#[derive(Debug, Deserialize)]
struct DeletedSubscriptionObject {
    id: String,
    current_period_end: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct InvoiceObject {
    id: String,
    subscription: Option<String>,
    #[serde(default)]
    amount_paid: i64,
    payment_intent: Option<String>,
    charge: Option<String>,
}

impl BillingEvent {
    /// Decodes the typed event from a verified envelope.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::ParseError` when the `data.object` of a known
    /// event type does not have the expected shape. Unknown event types are
    /// not an error - they decode to [`BillingEvent::Other`].
    pub fn decode(envelope: &EventEnvelope) -> Result<Self, WebhookError> {
        let object = envelope.data.object.clone();

        match envelope.event_type.as_str() {
            "checkout.session.completed" => {
                let session: CheckoutSessionObject =
                    serde_json::from_value(object).map_err(|e| {
                        WebhookError::ParseError(format!("invalid checkout session: {}", e))
                    })?;
                Ok(BillingEvent::CheckoutCompleted {
                    session_id: session.id,
                    customer_id: session.customer,
                    subscription_id: session.subscription,
                    metadata: CheckoutMetadata::from_map(session.metadata),
                })
            }

            "customer.subscription.updated" => {
                let sub: SubscriptionObject = serde_json::from_value(object).map_err(|e| {
                    WebhookError::ParseError(format!("invalid subscription: {}", e))
                })?;
                Ok(BillingEvent::SubscriptionUpdated {
                    subscription_id: sub.id,
                    status: sub.status,
                    current_period_start: sub.current_period_start,
                    current_period_end: sub.current_period_end,
                })
            }

            "customer.subscription.deleted" => {
                let sub: DeletedSubscriptionObject =
                    serde_json::from_value(object).map_err(|e| {
                        WebhookError::ParseError(format!("invalid subscription: {}", e))
                    })?;
                Ok(BillingEvent::SubscriptionDeleted {
                    subscription_id: sub.id,
                    current_period_end: sub.current_period_end,
                })
            }

            "invoice.paid" => {
                let invoice: InvoiceObject = serde_json::from_value(object).map_err(|e| {
                    WebhookError::ParseError(format!("invalid invoice: {}", e))
                })?;
                Ok(BillingEvent::InvoicePaid {
                    invoice_id: invoice.id,
                    subscription_id: invoice.subscription,
                    amount_paid: invoice.amount_paid,
                    payment_reference: invoice.payment_intent.or(invoice.charge),
                })
            }

            "invoice.payment_failed" => {
                let invoice: InvoiceObject = serde_json::from_value(object).map_err(|e| {
                    WebhookError::ParseError(format!("invalid invoice: {}", e))
                })?;
                Ok(BillingEvent::InvoicePaymentFailed {
                    invoice_id: invoice.id,
                    subscription_id: invoice.subscription,
                })
            }

            other => Ok(BillingEvent::Other(other.to_string())),
        }
    }
}
