//! Payment API endpoints
//!
//! Handles the hosted-checkout flow:
//! - POST /api/v1/payment/checkout - Create a Checkout session, return its URL
//! - GET /api/v1/payment/verify - Poll a session's status for display
//!
//! Both endpoints degrade to a descriptive service-unavailable error while
//! Stripe credentials are absent.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::models::InterviewPackage;
use crate::services::payments::{CheckoutRequest, PaymentError, SessionVerification};

/// Request body for creating a checkout session
#[derive(Debug, Deserialize)]
pub struct CreateCheckoutRequest {
    pub article_id: i64,
    pub package: String,
    /// Requested interview date (YYYY-MM-DD), carried into session metadata
    #[serde(default)]
    pub interview_date: Option<String>,
    /// Requested interview time (HH:MM), carried into session metadata
    #[serde(default)]
    pub interview_time: Option<String>,
}

/// Response carrying the hosted checkout URL
#[derive(Debug, Serialize)]
pub struct CreateCheckoutResponse {
    pub session_id: String,
    pub url: String,
}

/// Query parameters for session verification
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub session_id: Option<String>,
}

/// POST /api/v1/payment/checkout - Create a Checkout session
pub async fn create_checkout(
    State(state): State<AppState>,
    Json(request): Json<CreateCheckoutRequest>,
) -> Result<Json<CreateCheckoutResponse>, ApiError> {
    let gateway = state.payments.as_ref().ok_or_else(|| {
        ApiError::service_unavailable("Payments are not configured on this server")
    })?;

    let package = InterviewPackage::from_str(&request.package)
        .ok_or_else(|| ApiError::validation_error(format!("Unknown package: {}", request.package)))?;

    // The article must exist before we take money for it
    let article = state
        .article_service
        .get_by_id(request.article_id)
        .await?
        .ok_or_else(|| {
            ApiError::not_found(format!("Article not found: {}", request.article_id))
        })?;

    let redirect = gateway
        .create_package_checkout(CheckoutRequest {
            article_id: article.id,
            package,
            success_url: format!(
                "{}/thank-you?session_id={{CHECKOUT_SESSION_ID}}&article_id={}",
                state.base_url, article.id
            ),
            cancel_url: format!("{}/submit-article", state.base_url),
            interview_date: request.interview_date,
            interview_time: request.interview_time,
        })
        .await
        .map_err(payment_error_to_api)?;

    Ok(Json(CreateCheckoutResponse {
        session_id: redirect.session_id,
        url: redirect.checkout_url,
    }))
}

/// GET /api/v1/payment/verify - Verify a session for user-facing display
pub async fn verify_checkout(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> Result<Json<SessionVerification>, ApiError> {
    let gateway = state.payments.as_ref().ok_or_else(|| {
        ApiError::service_unavailable("Payments are not configured on this server")
    })?;

    let session_id = query
        .session_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation_error("Session ID is required"))?;

    let verification = gateway
        .verify_session(&session_id)
        .await
        .map_err(payment_error_to_api)?;

    Ok(Json(verification))
}

fn payment_error_to_api(err: PaymentError) -> ApiError {
    match err {
        PaymentError::Config(msg) => ApiError::service_unavailable(msg),
        other => {
            tracing::error!("Payment provider error: {}", other);
            ApiError::internal_error("Failed to reach the payment provider")
        }
    }
}
