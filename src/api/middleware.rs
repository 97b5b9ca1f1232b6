//! API middleware
//!
//! Contains:
//! - `AppState`, the shared service container for all handlers
//! - `ApiError`, the JSON error envelope with status-code mapping
//! - `require_admin`, the bearer-token guard for review endpoints

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::services::{
    ArticleService, ArticleServiceError, ImageStore, ImageStoreError, InterviewService,
    InterviewServiceError, StripeGateway,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: crate::db::DynDatabasePool,
    pub article_service: Arc<ArticleService>,
    pub interview_service: Arc<InterviewService>,
    /// None while Stripe is unconfigured; checkout endpoints degrade to a
    /// descriptive service-unavailable error
    pub payments: Option<Arc<StripeGateway>>,
    pub image_store: Arc<ImageStore>,
    /// Shared admin bearer token; None disables the review endpoints
    pub admin_token: Option<String>,
    /// Public base URL used to build checkout redirect URLs
    pub base_url: String,
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new("SERVICE_UNAVAILABLE", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "SERVICE_UNAVAILABLE" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<ArticleServiceError> for ApiError {
    fn from(err: ArticleServiceError) -> Self {
        match err {
            ArticleServiceError::NotFound(id) => {
                ApiError::not_found(format!("Article not found: {}", id))
            }
            ArticleServiceError::Validation(msg) => ApiError::validation_error(msg),
            ArticleServiceError::Internal(e) => {
                tracing::error!("Article service error: {:#}", e);
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

impl From<InterviewServiceError> for ApiError {
    fn from(err: InterviewServiceError) -> Self {
        match err {
            InterviewServiceError::NotFound(id) => {
                ApiError::not_found(format!("Interview not found: {}", id))
            }
            InterviewServiceError::ArticleNotFound(id) => {
                ApiError::not_found(format!("Article not found: {}", id))
            }
            InterviewServiceError::Validation(msg) => ApiError::validation_error(msg),
            InterviewServiceError::Internal(e) => {
                tracing::error!("Interview service error: {:#}", e);
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

impl From<ImageStoreError> for ApiError {
    fn from(err: ImageStoreError) -> Self {
        match err {
            ImageStoreError::Validation(msg) => ApiError::validation_error(msg),
            ImageStoreError::Storage(e) => {
                tracing::error!("Image store error: {:#}", e);
                ApiError::internal_error("Failed to store image")
            }
        }
    }
}

/// Extract a bearer token from the Authorization header
fn extract_bearer_token(request: &Request) -> Option<String> {
    let auth_header = request.headers().get(header::AUTHORIZATION)?;
    let auth_str = auth_header.to_str().ok()?;
    auth_str.strip_prefix("Bearer ").map(|t| t.to_string())
}

/// Admin guard middleware
///
/// Compares the bearer token against the configured shared credential.
/// While no token is configured, every admin request is rejected with a
/// descriptive error instead of silently letting traffic through.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let expected = state.admin_token.as_deref().ok_or_else(|| {
        ApiError::service_unavailable("Admin access is not configured on this server")
    })?;

    let token = extract_bearer_token(&request)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    if token != expected {
        return Err(ApiError::unauthorized("Invalid admin token"));
    }

    Ok(next.run(request).await)
}
