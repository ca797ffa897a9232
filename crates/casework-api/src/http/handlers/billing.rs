//! Subscription and Stripe handlers.

use std::time::Instant;

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use casework_types::error::BillingError;
use casework_types::subscription::{
    CancelSubscriptionRequest, CreateCheckoutRequest, Subscription,
};

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::extractors::json::ApiJson;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: Option<String>,
}

/// GET /api/v1/subscription - The caller's subscription (free if none yet).
pub async fn get_subscription(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
) -> Result<Json<ApiResponse<Subscription>>, AppError> {
    let start = Instant::now();
    let subscription = state.billing_service.subscription(&user.id).await?;
    Ok(Json(ApiResponse::success(subscription, start)))
}

/// POST /api/v1/stripe/create-checkout - Hosted checkout for the Pro plan.
pub async fn create_checkout(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    headers: HeaderMap,
    ApiJson(body): ApiJson<CreateCheckoutRequest>,
) -> Result<Json<ApiResponse<CheckoutResponse>>, AppError> {
    let start = Instant::now();
    let origin = headers
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty());

    let session = state
        .billing_service
        .create_checkout(&user, &body, origin)
        .await?;
    info!(user_id = %user.id, session_id = %session.id, "checkout session created");

    Ok(Json(ApiResponse::success(
        CheckoutResponse { url: session.url },
        start,
    )))
}

/// POST /api/v1/stripe/cancel-subscription - Cancel the caller's subscription.
pub async fn cancel_subscription(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    ApiJson(body): ApiJson<CancelSubscriptionRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    state.billing_service.cancel(&user.id, &body).await?;
    Ok(Json(ApiResponse::success(json!({ "success": true }), start)))
}

/// POST /api/v1/stripe/webhook - Provider events, verified against the raw body.
///
/// Unauthenticated; the `Stripe-Signature` header is the credential.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            warn!("webhook without Stripe-Signature header");
            AppError::Billing(BillingError::InvalidSignature("missing header".to_string()))
        })?;

    if let Err(e) = state.billing_service.handle_webhook(&body, signature).await {
        warn!(error = %e, "webhook rejected");
        return Err(e.into());
    }

    Ok(Json(ApiResponse::success(json!({ "received": true }), start)))
}
