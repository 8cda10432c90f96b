//! HTTP handlers for the billing endpoints.
//!
//! These connect Axum routes to the application layer command handlers. The
//! webhook endpoint answers `{"received": true}` for every outcome the
//! pipeline acknowledged; only verification and transient failures produce
//! non-2xx responses, because the status code is the sender's retry signal.

use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use crate::application::handlers::partners::{
    CreatePromoCodeCommand, CreatePromoCodeHandler, DeletePromoCodeHandler,
    ListPartnerSummariesHandler, RedeemPromoCodeCommand, RedeemPromoCodeHandler,
    SetPromoCodeActiveHandler, TriggerPayoutCommand, TriggerPayoutHandler,
    ValidatePromoCodeHandler,
};
use crate::application::handlers::webhook::{
    CheckoutCompletedHandler, InvoicePaidHandler, ProcessWebhookCommand, ProcessWebhookHandler,
    SubscriptionDeletedHandler, SubscriptionUpdatedHandler,
};
use crate::domain::billing::{BillingError, CommissionRate, Discount, WebhookError, WebhookVerifier};
use crate::domain::foundation::{PromoCodeId, UserId};
use crate::ports::{BillingProvider, EarningsLedger, PromoCodeStore, SubscriptionStore};

use super::dto::{
    CreatePromoCodeRequest, DiscountResponse, ErrorResponse, PartnerSummaryResponse,
    PayoutRequest, PayoutResponse, PromoCodeResponse, RedeemPromoCodeRequest, SetActiveRequest,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned per request; dependencies are Arc-wrapped for cheap sharing. No
/// process-wide singletons - everything a handler needs arrives through
/// here.
#[derive(Clone)]
pub struct BillingAppState {
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub promo_codes: Arc<dyn PromoCodeStore>,
    pub ledger: Arc<dyn EarningsLedger>,
    pub billing_provider: Arc<dyn BillingProvider>,

    /// Webhook signing secret.
    pub webhook_secret: String,

    /// Commission rate applied to paid invoices.
    pub commission_rate: CommissionRate,

    /// Shared secret for the admin surface.
    pub admin_token: String,
}

impl BillingAppState {
    /// Create handlers on demand from the shared state.
    pub fn webhook_handler(&self) -> ProcessWebhookHandler {
        ProcessWebhookHandler::new(
            WebhookVerifier::new(self.webhook_secret.clone()),
            CheckoutCompletedHandler::new(
                self.subscriptions.clone(),
                self.promo_codes.clone(),
                self.billing_provider.clone(),
            ),
            SubscriptionUpdatedHandler::new(self.subscriptions.clone()),
            SubscriptionDeletedHandler::new(self.subscriptions.clone()),
            InvoicePaidHandler::new(
                self.subscriptions.clone(),
                self.ledger.clone(),
                self.commission_rate,
            ),
        )
    }

    pub fn redeem_handler(&self) -> RedeemPromoCodeHandler {
        RedeemPromoCodeHandler::new(self.promo_codes.clone())
    }

    pub fn validate_handler(&self) -> ValidatePromoCodeHandler {
        ValidatePromoCodeHandler::new(self.promo_codes.clone())
    }

    pub fn create_code_handler(&self) -> CreatePromoCodeHandler {
        CreatePromoCodeHandler::new(self.promo_codes.clone())
    }

    pub fn set_active_handler(&self) -> SetPromoCodeActiveHandler {
        SetPromoCodeActiveHandler::new(self.promo_codes.clone())
    }

    pub fn delete_code_handler(&self) -> DeletePromoCodeHandler {
        DeletePromoCodeHandler::new(self.promo_codes.clone(), self.ledger.clone())
    }

    pub fn summaries_handler(&self) -> ListPartnerSummariesHandler {
        ListPartnerSummariesHandler::new(self.promo_codes.clone(), self.ledger.clone())
    }

    pub fn payout_handler(&self) -> TriggerPayoutHandler {
        TriggerPayoutHandler::new(self.promo_codes.clone(), self.ledger.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Request Extractors
// ════════════════════════════════════════════════════════════════════════════════

/// Authenticated end user, extracted from the X-User-Id header.
///
/// In production this is populated by the gateway's auth middleware; the
/// header-based extraction keeps the surface testable without it.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// Rejection type for AuthenticatedUser extraction.
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> axum::response::Response {
        let error = ErrorResponse::new("AUTHENTICATION_REQUIRED", "Authentication is required");
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

impl axum::extract::FromRequestParts<BillingAppState> for AuthenticatedUser {
    type Rejection = AuthenticationRequired;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 BillingAppState,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let user_id = parts
                .headers
                .get("X-User-Id")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| UserId::new(s).ok())
                .ok_or(AuthenticationRequired)?;

            Ok(AuthenticatedUser { user_id })
        })
    }
}

/// Administrator, authenticated by the X-Admin-Token shared secret.
#[derive(Debug, Clone)]
pub struct AdminAuth;

/// Rejection type for AdminAuth extraction.
pub struct AdminRequired;

impl IntoResponse for AdminRequired {
    fn into_response(self) -> axum::response::Response {
        let error = ErrorResponse::new("ADMIN_REQUIRED", "Admin authentication is required");
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

impl axum::extract::FromRequestParts<BillingAppState> for AdminAuth {
    type Rejection = AdminRequired;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        state: &'life1 BillingAppState,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let token = parts
                .headers
                .get("X-Admin-Token")
                .and_then(|v| v.to_str().ok())
                .ok_or(AdminRequired)?;

            if token != state.admin_token {
                return Err(AdminRequired);
            }

            Ok(AdminAuth)
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook Endpoint
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/webhooks/stripe - Handle payment processor webhooks.
pub async fn handle_stripe_webhook(
    State(state): State<BillingAppState>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            WebhookApiError(WebhookError::ParseError(
                "Missing Stripe-Signature header".to_string(),
            ))
        })?;

    let handler = state.webhook_handler();
    let cmd = ProcessWebhookCommand {
        payload: body.to_vec(),
        signature: signature.to_string(),
    };

    let outcome = handler.handle(cmd).await?;
    tracing::debug!(?outcome, "Webhook handled");

    Ok((StatusCode::OK, Json(json!({ "received": true }))))
}

/// API error wrapper for webhook processing.
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.0.status_code();
        if self.0.is_retryable() {
            tracing::error!(error = %self.0, "Webhook processing failed, sender will redeliver");
        } else {
            tracing::warn!(error = %self.0, "Webhook rejected");
        }
        let body = ErrorResponse::new("WEBHOOK_ERROR", self.0.to_string());
        (status, Json(body)).into_response()
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Redemption Endpoint
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/promo/validate - Check a promo code without redeeming it.
pub async fn validate_promo_code(
    State(state): State<BillingAppState>,
    _user: AuthenticatedUser,
    Json(request): Json<RedeemPromoCodeRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let info = state.validate_handler().handle(&request.code).await?;
    Ok(Json(DiscountResponse::from(info)))
}

/// POST /api/promo/redeem - Validate and redeem a promo code at checkout.
pub async fn redeem_promo_code(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
    Json(request): Json<RedeemPromoCodeRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let handler = state.redeem_handler();
    let cmd = RedeemPromoCodeCommand {
        code: request.code,
        user_id: user.user_id,
    };

    let info = handler.handle(cmd).await?;

    Ok(Json(DiscountResponse::from(info)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Admin Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/partners/codes - Create a promo code.
pub async fn create_promo_code(
    State(state): State<BillingAppState>,
    _admin: AdminAuth,
    Json(request): Json<CreatePromoCodeRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let discount = Discount::new(request.discount_kind, request.discount_value)
        .map_err(BillingError::from)?;

    let handler = state.create_code_handler();
    let cmd = CreatePromoCodeCommand {
        code: request.code,
        partner_name: request.partner_name,
        partner_email: request.partner_email,
        discount,
        applies_to: request.applies_to,
        max_uses: request.max_uses,
        expires_at: request.expires_at,
    };

    let promo = handler.handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(PromoCodeResponse::from(promo))))
}

/// GET /api/partners/codes - List promo codes.
pub async fn list_promo_codes(
    State(state): State<BillingAppState>,
    _admin: AdminAuth,
) -> Result<impl IntoResponse, BillingApiError> {
    let codes = state.promo_codes.list().await.map_err(BillingError::from)?;
    let response: Vec<PromoCodeResponse> =
        codes.into_iter().map(PromoCodeResponse::from).collect();
    Ok(Json(response))
}

/// POST /api/partners/codes/{id}/active - Activate or deactivate a code.
pub async fn set_promo_code_active(
    State(state): State<BillingAppState>,
    _admin: AdminAuth,
    Path(id): Path<String>,
    Json(request): Json<SetActiveRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let id = parse_promo_code_id(&id)?;
    state.set_active_handler().handle(id, request.active).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/partners/codes/{id} - Delete an unreferenced promo code.
pub async fn delete_promo_code(
    State(state): State<BillingAppState>,
    _admin: AdminAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, BillingApiError> {
    let id = parse_promo_code_id(&id)?;
    state.delete_code_handler().handle(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/partners/summary - Aggregated partner performance.
pub async fn list_partner_summaries(
    State(state): State<BillingAppState>,
    _admin: AdminAuth,
) -> Result<impl IntoResponse, BillingApiError> {
    let summaries = state.summaries_handler().handle().await?;
    let response: Vec<PartnerSummaryResponse> = summaries
        .into_iter()
        .map(PartnerSummaryResponse::from)
        .collect();
    Ok(Json(response))
}

/// POST /api/partners/{id}/payout - Pay out a partner's pending commission.
pub async fn trigger_payout(
    State(state): State<BillingAppState>,
    _admin: AdminAuth,
    Path(id): Path<String>,
    Json(request): Json<PayoutRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let handler = state.payout_handler();
    let cmd = TriggerPayoutCommand {
        promo_code_id: parse_promo_code_id(&id)?,
        method: request.method,
        reference: request.reference,
        notes: request.notes,
    };

    let receipt = handler.handle(cmd).await?;

    Ok(Json(PayoutResponse::from(receipt)))
}

fn parse_promo_code_id(raw: &str) -> Result<PromoCodeId, BillingApiError> {
    raw.parse::<PromoCodeId>().map_err(|_| {
        BillingApiError(BillingError::validation(
            "id",
            "must be a valid promo code id",
        ))
    })
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts billing errors to HTTP responses.
pub struct BillingApiError(BillingError);

impl From<BillingError> for BillingApiError {
    fn from(err: BillingError) -> Self {
        Self(err)
    }
}

impl IntoResponse for BillingApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_code) = match &self.0 {
            BillingError::PromoCodeInvalid { .. } => {
                (StatusCode::BAD_REQUEST, "PROMO_CODE_INVALID")
            }
            BillingError::UsageLimitExceeded { .. } => {
                (StatusCode::BAD_REQUEST, "USAGE_LIMIT_EXCEEDED")
            }
            BillingError::DuplicateCode { .. } => (StatusCode::CONFLICT, "DUPLICATE_CODE"),
            BillingError::PartnerNotFound { .. } => (StatusCode::NOT_FOUND, "PARTNER_NOT_FOUND"),
            BillingError::NothingToPayout { .. } => {
                (StatusCode::BAD_REQUEST, "NOTHING_TO_PAYOUT")
            }
            BillingError::PromoCodeInUse { .. } => (StatusCode::CONFLICT, "PROMO_CODE_IN_USE"),
            BillingError::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
            BillingError::Infrastructure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        let body = ErrorResponse::new(error_code, self.0.message());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn billing_errors_map_to_expected_status_codes() {
        let cases: Vec<(BillingError, StatusCode)> = vec![
            (
                BillingError::PromoCodeInvalid {
                    reason: crate::domain::billing::PromoCodeInvalidReason::NotFound,
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                BillingError::UsageLimitExceeded {
                    code: "X".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                BillingError::DuplicateCode {
                    code: "X".to_string(),
                },
                StatusCode::CONFLICT,
            ),
            (
                BillingError::PartnerNotFound {
                    id: PromoCodeId::new(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                BillingError::NothingToPayout {
                    id: PromoCodeId::new(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                BillingError::PromoCodeInUse {
                    id: PromoCodeId::new(),
                },
                StatusCode::CONFLICT,
            ),
            (
                BillingError::validation("field", "bad"),
                StatusCode::BAD_REQUEST,
            ),
            (
                BillingError::infrastructure("db down"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let response = BillingApiError(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn webhook_errors_map_to_their_status_codes() {
        let response = WebhookApiError(WebhookError::InvalidSignature).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response =
            WebhookApiError(WebhookError::Storage("down".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn parse_promo_code_id_rejects_garbage() {
        assert!(parse_promo_code_id("not-a-uuid").is_err());
        assert!(parse_promo_code_id(&PromoCodeId::new().to_string()).is_ok());
    }
}
