//! Axum router configuration for the billing endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};

use super::handlers::{
    create_promo_code, delete_promo_code, handle_stripe_webhook, list_partner_summaries,
    list_promo_codes, redeem_promo_code, set_promo_code_active, trigger_payout,
    validate_promo_code, BillingAppState,
};

/// Create the webhook router.
///
/// Separate from the rest because webhooks carry no user authentication -
/// authenticity comes from the signature.
///
/// # Routes
/// - `POST /stripe` - Handle payment processor webhooks
pub fn webhook_routes() -> Router<BillingAppState> {
    Router::new().route("/stripe", post(handle_stripe_webhook))
}

/// Create the promo code router (user-facing).
///
/// # Routes
/// - `POST /validate` - Check a promo code without redeeming it
/// - `POST /redeem` - Validate and redeem a promo code during checkout
pub fn promo_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/validate", post(validate_promo_code))
        .route("/redeem", post(redeem_promo_code))
}

/// Create the partner administration router.
///
/// All routes require the X-Admin-Token header.
///
/// # Routes
/// - `POST /codes` - Create promo code
/// - `GET /codes` - List promo codes
/// - `POST /codes/{id}/active` - Activate/deactivate a code
/// - `DELETE /codes/{id}` - Delete an unreferenced code
/// - `GET /summary` - Partner summaries (revenue, commission, conversions)
/// - `POST /{id}/payout` - Pay out a partner's pending commission
pub fn partner_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/codes", post(create_promo_code).get(list_promo_codes))
        .route("/codes/:id/active", post(set_promo_code_active))
        .route("/codes/:id", delete(delete_promo_code))
        .route("/summary", get(list_partner_summaries))
        .route("/:id/payout", post(trigger_payout))
}

/// Create the complete billing module router, mounted under `/api`.
pub fn billing_router() -> Router<BillingAppState> {
    Router::new()
        .nest("/webhooks", webhook_routes())
        .nest("/promo", promo_routes())
        .nest("/partners", partner_routes())
}
