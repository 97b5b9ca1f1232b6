//! Provider webhook endpoints
//!
//! POST /api/v1/webhooks/stripe receives checkout events. The contract:
//! - the raw body must verify against the `stripe-signature` header and the
//!   configured signing secret, or the request is dropped with 400 before
//!   any state is touched
//! - every well-signed event is acknowledged with 200, including types we
//!   take no action on, so the provider stops retrying
//! - redelivery of a completed checkout is harmless (blind overwrite plus
//!   upsert downstream)

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState};
use crate::services::payments::{parse_callback, CallbackEvent, PaymentError};

/// Acknowledgement body expected by the provider
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// POST /api/v1/webhooks/stripe - Receive a checkout event
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let gateway = state.payments.as_ref().ok_or_else(|| {
        ApiError::service_unavailable("Payments are not configured on this server")
    })?;

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::validation_error("Missing stripe-signature header"))?;

    let payload = std::str::from_utf8(&body)
        .map_err(|_| ApiError::validation_error("Webhook payload is not valid UTF-8"))?;

    let event = gateway.construct_event(payload, signature).map_err(|e| match e {
        PaymentError::WebhookSignature(msg) => {
            tracing::warn!("Webhook signature verification failed: {}", msg);
            ApiError::validation_error("Invalid signature")
        }
        PaymentError::Config(msg) => ApiError::service_unavailable(msg),
        other => {
            tracing::error!("Webhook construction failed: {}", other);
            ApiError::internal_error("Webhook handler failed")
        }
    })?;

    match parse_callback(&event) {
        Ok(CallbackEvent::CheckoutCompleted {
            article_id,
            package,
            schedule,
        }) => {
            state
                .article_service
                .apply_payment(article_id, package, schedule)
                .await
                .map_err(|e| {
                    tracing::error!(article_id, "Failed to apply payment: {}", e);
                    ApiError::internal_error("Webhook handler failed")
                })?;
        }
        Ok(CallbackEvent::CheckoutWithoutArticle) => {
            tracing::warn!("Completed checkout carried no article metadata");
        }
        Ok(CallbackEvent::Ignored { event_type }) => {
            tracing::debug!(event_type = %event_type, "Unhandled webhook event");
        }
        Err(e) => {
            tracing::error!("Webhook payload error: {}", e);
            return Err(ApiError::internal_error("Webhook handler failed"));
        }
    }

    Ok(Json(WebhookAck { received: true }))
}
