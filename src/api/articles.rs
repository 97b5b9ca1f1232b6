//! Article API endpoints
//!
//! Handles HTTP requests for the submission lifecycle:
//! - POST /api/v1/articles - Submit a new article (public intake)
//! - GET /api/v1/articles - List articles with status filter (admin)
//! - GET /api/v1/articles/:id - Get one article (admin)
//! - PUT /api/v1/articles/:id/status - Approve or reject (admin)

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{ArticleResponse, InterviewResponse, PaginatedArticlesResponse};
use crate::models::{ArticleStatus, CreateArticleInput, InterviewPackage, ListParams};
use crate::services::payments::parse_schedule;

/// Request body for submitting an article
#[derive(Debug, Deserialize)]
pub struct CreateArticleRequest {
    pub title: String,
    pub author_name: String,
    pub agency_contact: String,
    #[serde(default)]
    pub kol_name: String,
    #[serde(default)]
    pub kol_credentials: String,
    pub body: String,
    #[serde(default)]
    pub therapeutic_area: String,
    #[serde(default)]
    pub target_audience: String,
    #[serde(default)]
    pub article_type: String,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Package tier; defaults to basic
    #[serde(default)]
    pub interview_package: Option<String>,
    /// Requested interview date (YYYY-MM-DD)
    #[serde(default)]
    pub interview_date: Option<String>,
    /// Requested interview time (HH:MM)
    #[serde(default)]
    pub interview_time: Option<String>,
}

/// Response for a successful submission
#[derive(Debug, Serialize)]
pub struct CreateArticleResponse {
    #[serde(flatten)]
    pub article: ArticleResponse,
    /// Present when a premium package bundled an interview booking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interview: Option<InterviewResponse>,
}

/// Query parameters for listing articles
#[derive(Debug, Deserialize)]
pub struct ListArticlesQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Filter by status (pending_review, approved, rejected)
    pub status: Option<String>,
}

fn default_page() -> u32 {
    1
}
fn default_page_size() -> u32 {
    20
}

/// Request body for the admin review decision
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// POST /api/v1/articles - Submit a new article
///
/// Malformed or incomplete JSON is a 400 with the parser's message, not the
/// framework's default rejection.
pub async fn create_article(
    State(state): State<AppState>,
    payload: Result<Json<CreateArticleRequest>, JsonRejection>,
) -> Result<Json<CreateArticleResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::validation_error(e.body_text()))?;

    let package = match request.interview_package.as_deref() {
        None | Some("") => InterviewPackage::Basic,
        Some(name) => InterviewPackage::from_str(name)
            .ok_or_else(|| ApiError::validation_error(format!("Unknown package: {}", name)))?,
    };

    let schedule = parse_schedule(
        request.interview_date.as_deref(),
        request.interview_time.as_deref(),
    );

    let input = CreateArticleInput {
        title: request.title,
        author_name: request.author_name,
        agency_contact: request.agency_contact,
        kol_name: request.kol_name,
        kol_credentials: request.kol_credentials,
        body: request.body,
        therapeutic_area: request.therapeutic_area,
        target_audience: request.target_audience,
        article_type: request.article_type,
        image_url: request.image_url,
        interview_package: package,
    };

    let (article, interview) = state.article_service.submit(input, schedule).await?;

    Ok(Json(CreateArticleResponse {
        article: article.into(),
        interview: interview.map(Into::into),
    }))
}

/// GET /api/v1/articles - List articles with pagination (admin)
pub async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ListArticlesQuery>,
) -> Result<Json<PaginatedArticlesResponse>, ApiError> {
    let status = match query.status.as_deref() {
        None | Some("") | Some("all") => None,
        Some(name) => Some(
            ArticleStatus::from_str(name)
                .ok_or_else(|| ApiError::validation_error(format!("Unknown status: {}", name)))?,
        ),
    };

    let params = ListParams::new(query.page, query.page_size);
    let result = state.article_service.list(status, &params).await?;

    let total = result.total;
    let page = result.page;
    let page_size = result.per_page;
    let total_pages = result.total_pages();

    Ok(Json(PaginatedArticlesResponse {
        articles: result.items.into_iter().map(Into::into).collect(),
        total,
        page,
        page_size,
        total_pages,
    }))
}

/// GET /api/v1/articles/:id - Get one article (admin)
pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ArticleResponse>, ApiError> {
    let article = state
        .article_service
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Article not found: {}", id)))?;

    Ok(Json(article.into()))
}

/// PUT /api/v1/articles/:id/status - Set the review decision (admin)
pub async fn update_article_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<ArticleResponse>, ApiError> {
    let status = ArticleStatus::from_str(&request.status).ok_or_else(|| {
        ApiError::validation_error(format!("Unknown status: {}", request.status))
    })?;

    let article = state.article_service.set_status(id, status).await?;

    Ok(Json(article.into()))
}
