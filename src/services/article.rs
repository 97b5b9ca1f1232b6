//! Article service
//!
//! Implements business logic for the submission lifecycle:
//! - Intake with validation and the transactional bundled-interview insert
//! - Admin review transitions (approve / reject)
//! - Applying payment outcomes reported by the checkout callback
//! - Listing with status filter and pagination
//!
//! Status rules: every article starts in `pending_review`; only `set_status`
//! (admin action) moves it to a terminal outcome, and only `apply_payment`
//! (the provider callback) touches payment state.

use crate::db::repositories::{ArticleRepository, InterviewRepository};
use crate::models::{
    Article, ArticleStatus, CreateArticleInput, CreateInterviewInput, Interview, InterviewSeed,
    ListParams, PagedResult, PaymentStatus,
};
use crate::services::email::Mailer;
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Error types for article service operations
#[derive(Debug, thiserror::Error)]
pub enum ArticleServiceError {
    /// Article not found
    #[error("Article not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Article service for the submission lifecycle
pub struct ArticleService {
    repo: Arc<dyn ArticleRepository>,
    interview_repo: Arc<dyn InterviewRepository>,
    mailer: Option<Arc<Mailer>>,
}

impl ArticleService {
    /// Create a new article service
    pub fn new(
        repo: Arc<dyn ArticleRepository>,
        interview_repo: Arc<dyn InterviewRepository>,
    ) -> Self {
        Self {
            repo,
            interview_repo,
            mailer: None,
        }
    }

    /// Attach a mailer for confirmation emails
    pub fn with_mailer(mut self, mailer: Arc<Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    /// Submit a new article
    ///
    /// When the package bundles an interview and a schedule was supplied,
    /// the interview row is created in the same transaction as the article;
    /// a failure on either insert rolls back both. The confirmation email is
    /// best-effort and never fails the submission.
    pub async fn submit(
        &self,
        input: CreateArticleInput,
        interview_schedule: Option<DateTime<Utc>>,
    ) -> Result<(Article, Option<Interview>), ArticleServiceError> {
        self.validate_input(&input)?;

        let seed = match (
            input.interview_package.interview_duration_minutes(),
            interview_schedule,
        ) {
            (Some(duration_minutes), Some(scheduled_time)) => Some(InterviewSeed {
                scheduled_time,
                duration_minutes,
            }),
            _ => None,
        };

        let (article, interview) = self
            .repo
            .create(&input, seed.as_ref())
            .await
            .context("Failed to create article")?;

        if let Some(ref mailer) = self.mailer {
            if let Err(e) = mailer
                .send_submission_confirmation(
                    &article.agency_contact,
                    &article.title,
                    &article.author_name,
                )
                .await
            {
                tracing::warn!(article_id = article.id, "Confirmation email failed: {}", e);
            }
        }

        tracing::info!(
            article_id = article.id,
            package = %article.interview_package,
            "Article submitted"
        );

        Ok((article, interview))
    }

    /// Get article by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Article>, ArticleServiceError> {
        Ok(self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get article by ID")?)
    }

    /// List articles, newest first, optionally filtered by status
    pub async fn list(
        &self,
        status: Option<ArticleStatus>,
        params: &ListParams,
    ) -> Result<PagedResult<Article>, ArticleServiceError> {
        let items = self
            .repo
            .list(status, params.offset(), params.limit())
            .await
            .context("Failed to list articles")?;
        let total = self
            .repo
            .count(status)
            .await
            .context("Failed to count articles")?;

        Ok(PagedResult::new(items, total, params))
    }

    /// Set the editorial review status (admin action)
    ///
    /// Only the terminal outcomes are accepted; there is no path back to
    /// `pending_review`. Last write wins between concurrent reviewers.
    pub async fn set_status(
        &self,
        id: i64,
        status: ArticleStatus,
    ) -> Result<Article, ArticleServiceError> {
        if !status.is_review_outcome() {
            return Err(ArticleServiceError::Validation(format!(
                "Invalid review outcome: {}",
                status
            )));
        }

        if self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get article by ID")?
            .is_none()
        {
            return Err(ArticleServiceError::NotFound(id.to_string()));
        }

        let article = self
            .repo
            .set_status(id, status)
            .await
            .context("Failed to update article status")?;

        tracing::info!(article_id = id, status = %status, "Article reviewed");

        Ok(article)
    }

    /// Apply a completed-checkout outcome reported by the payment callback
    ///
    /// Safe under redelivery: the article write is a blind overwrite and the
    /// interview write is an upsert keyed on article id. An unknown article
    /// id is logged and swallowed so the callback still acknowledges the
    /// event and stops provider retries.
    pub async fn apply_payment(
        &self,
        article_id: i64,
        package: crate::models::InterviewPackage,
        schedule: Option<DateTime<Utc>>,
    ) -> Result<(), ArticleServiceError> {
        let touched = self
            .repo
            .set_payment_status(article_id, PaymentStatus::Paid)
            .await
            .context("Failed to update article payment status")?;

        if touched == 0 {
            tracing::warn!(article_id, "Payment reported for unknown article");
            return Ok(());
        }

        tracing::info!(article_id, "Payment status updated to paid");

        if let (Some(duration_minutes), Some(scheduled_time)) =
            (package.interview_duration_minutes(), schedule)
        {
            self.interview_repo
                .upsert_by_article(&CreateInterviewInput {
                    article_id,
                    scheduled_time,
                    duration_minutes,
                    payment_status: PaymentStatus::Paid,
                })
                .await
                .context("Failed to upsert interview for paid article")?;

            tracing::info!(article_id, "Interview record created/updated");
        }

        if let Some(ref mailer) = self.mailer {
            if let Ok(Some(article)) = self.repo.get_by_id(article_id).await {
                let pricing = package.pricing();
                if let Err(e) = mailer
                    .send_payment_confirmation(
                        &article.agency_contact,
                        pricing.cents,
                        pricing.name,
                    )
                    .await
                {
                    tracing::warn!(article_id, "Payment confirmation email failed: {}", e);
                }
            }
        }

        Ok(())
    }

    /// Validate intake input
    fn validate_input(&self, input: &CreateArticleInput) -> Result<(), ArticleServiceError> {
        if input.title.trim().is_empty() {
            return Err(ArticleServiceError::Validation(
                "Article title cannot be empty".to_string(),
            ));
        }
        if input.author_name.trim().is_empty() {
            return Err(ArticleServiceError::Validation(
                "Author name cannot be empty".to_string(),
            ));
        }
        if input.agency_contact.trim().is_empty() || !input.agency_contact.contains('@') {
            return Err(ArticleServiceError::Validation(
                "A valid agency contact email is required".to_string(),
            ));
        }
        if input.body.trim().is_empty() {
            return Err(ArticleServiceError::Validation(
                "Article body cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
