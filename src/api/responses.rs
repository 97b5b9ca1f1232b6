//! Shared API response types
//!
//! Common response structures used across multiple API endpoints to keep
//! the wire format consistent.

use serde::{Deserialize, Serialize};

/// Full article response
#[derive(Debug, Serialize, Deserialize)]
pub struct ArticleResponse {
    pub id: i64,
    pub title: String,
    pub author_name: String,
    pub agency_contact: String,
    pub kol_name: String,
    pub kol_credentials: String,
    pub body: String,
    pub therapeutic_area: String,
    pub target_audience: String,
    pub article_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub interview_package: String,
    pub status: String,
    pub payment_status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<crate::models::Article> for ArticleResponse {
    fn from(article: crate::models::Article) -> Self {
        Self {
            id: article.id,
            title: article.title,
            author_name: article.author_name,
            agency_contact: article.agency_contact,
            kol_name: article.kol_name,
            kol_credentials: article.kol_credentials,
            body: article.body,
            therapeutic_area: article.therapeutic_area,
            target_audience: article.target_audience,
            article_type: article.article_type,
            image_url: article.image_url,
            interview_package: article.interview_package.to_string(),
            status: article.status.to_string(),
            payment_status: article.payment_status.to_string(),
            created_at: article.created_at.to_rfc3339(),
            updated_at: article.updated_at.to_rfc3339(),
        }
    }
}

/// Interview response
#[derive(Debug, Serialize, Deserialize)]
pub struct InterviewResponse {
    pub id: i64,
    pub article_id: i64,
    pub scheduled_time: String,
    pub duration_minutes: i32,
    pub payment_status: String,
    pub created_at: String,
}

impl From<crate::models::Interview> for InterviewResponse {
    fn from(interview: crate::models::Interview) -> Self {
        Self {
            id: interview.id,
            article_id: interview.article_id,
            scheduled_time: interview.scheduled_time.to_rfc3339(),
            duration_minutes: interview.duration_minutes,
            payment_status: interview.payment_status.to_string(),
            created_at: interview.created_at.to_rfc3339(),
        }
    }
}

/// Paginated article list response
#[derive(Debug, Serialize)]
pub struct PaginatedArticlesResponse {
    pub articles: Vec<ArticleResponse>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

/// Paginated interview list response
#[derive(Debug, Serialize)]
pub struct PaginatedInterviewsResponse {
    pub interviews: Vec<InterviewResponse>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}
