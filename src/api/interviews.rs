//! Interview API endpoints
//!
//! Handles HTTP requests for KoL interview bookings:
//! - POST /api/v1/interviews - Book an interview for an article (public)
//! - GET /api/v1/interviews - List bookings with article filter (admin)
//! - PUT /api/v1/interviews/:id/payment - Update payment status (admin)

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{InterviewResponse, PaginatedInterviewsResponse};
use crate::models::{ListParams, PaymentStatus};

/// Request body for booking an interview
#[derive(Debug, Deserialize)]
pub struct CreateInterviewRequest {
    pub article_id: i64,
    /// RFC 3339 timestamp
    pub scheduled_time: DateTime<Utc>,
    pub duration_minutes: i32,
}

/// Query parameters for listing interviews
#[derive(Debug, Deserialize)]
pub struct ListInterviewsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Filter by owning article
    pub article_id: Option<i64>,
}

fn default_page() -> u32 {
    1
}
fn default_page_size() -> u32 {
    20
}

/// Request body for updating an interview's payment status
#[derive(Debug, Deserialize)]
pub struct UpdatePaymentRequest {
    pub payment_status: String,
}

/// POST /api/v1/interviews - Book an interview
pub async fn create_interview(
    State(state): State<AppState>,
    payload: Result<Json<CreateInterviewRequest>, JsonRejection>,
) -> Result<Json<InterviewResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::validation_error(e.body_text()))?;

    let interview = state
        .interview_service
        .book(
            request.article_id,
            request.scheduled_time,
            request.duration_minutes,
        )
        .await?;

    Ok(Json(interview.into()))
}

/// GET /api/v1/interviews - List bookings (admin)
pub async fn list_interviews(
    State(state): State<AppState>,
    Query(query): Query<ListInterviewsQuery>,
) -> Result<Json<PaginatedInterviewsResponse>, ApiError> {
    let params = ListParams::new(query.page, query.page_size);
    let result = state
        .interview_service
        .list(query.article_id, &params)
        .await?;

    let total = result.total;
    let page = result.page;
    let page_size = result.per_page;
    let total_pages = result.total_pages();

    Ok(Json(PaginatedInterviewsResponse {
        interviews: result.items.into_iter().map(Into::into).collect(),
        total,
        page,
        page_size,
        total_pages,
    }))
}

/// PUT /api/v1/interviews/:id/payment - Update payment status (admin)
pub async fn update_interview_payment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdatePaymentRequest>,
) -> Result<Json<InterviewResponse>, ApiError> {
    let status = PaymentStatus::from_str(&request.payment_status).ok_or_else(|| {
        ApiError::validation_error(format!("Unknown payment status: {}", request.payment_status))
    })?;

    let interview = state
        .interview_service
        .set_payment_status(id, status)
        .await?;

    Ok(Json(interview.into()))
}
