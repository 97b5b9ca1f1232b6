//! Interview service
//!
//! Business logic for standalone interview bookings and admin payment
//! updates. Bundled bookings made at intake go through the article service
//! instead.

use crate::db::repositories::{ArticleRepository, InterviewRepository};
use crate::models::{
    CreateInterviewInput, Interview, ListParams, PagedResult, PaymentStatus,
};
use crate::services::email::Mailer;
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Error types for interview service operations
#[derive(Debug, thiserror::Error)]
pub enum InterviewServiceError {
    /// Interview not found
    #[error("Interview not found: {0}")]
    NotFound(String),

    /// Referenced article does not exist
    #[error("Article not found: {0}")]
    ArticleNotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Interview service
pub struct InterviewService {
    repo: Arc<dyn InterviewRepository>,
    article_repo: Arc<dyn ArticleRepository>,
    mailer: Option<Arc<Mailer>>,
}

impl InterviewService {
    /// Create a new interview service
    pub fn new(
        repo: Arc<dyn InterviewRepository>,
        article_repo: Arc<dyn ArticleRepository>,
    ) -> Self {
        Self {
            repo,
            article_repo,
            mailer: None,
        }
    }

    /// Attach a mailer for booking confirmations
    pub fn with_mailer(mut self, mailer: Arc<Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    /// Book an interview for an existing article
    ///
    /// Upserts by article id: re-booking replaces the previous schedule
    /// instead of stacking rows.
    pub async fn book(
        &self,
        article_id: i64,
        scheduled_time: DateTime<Utc>,
        duration_minutes: i32,
    ) -> Result<Interview, InterviewServiceError> {
        if duration_minutes <= 0 {
            return Err(InterviewServiceError::Validation(
                "Duration must be positive".to_string(),
            ));
        }

        if self
            .article_repo
            .get_by_id(article_id)
            .await
            .context("Failed to look up article")?
            .is_none()
        {
            return Err(InterviewServiceError::ArticleNotFound(
                article_id.to_string(),
            ));
        }

        let interview = self
            .repo
            .upsert_by_article(&CreateInterviewInput {
                article_id,
                scheduled_time,
                duration_minutes,
                payment_status: PaymentStatus::Pending,
            })
            .await
            .context("Failed to create interview booking")?;

        tracing::info!(
            interview_id = interview.id,
            article_id,
            "Interview booked"
        );

        Ok(interview)
    }

    /// Get interview by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Interview>, InterviewServiceError> {
        Ok(self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get interview by ID")?)
    }

    /// List interviews, newest first, optionally filtered by article
    pub async fn list(
        &self,
        article_id: Option<i64>,
        params: &ListParams,
    ) -> Result<PagedResult<Interview>, InterviewServiceError> {
        let items = self
            .repo
            .list(article_id, params.offset(), params.limit())
            .await
            .context("Failed to list interviews")?;
        let total = self
            .repo
            .count(article_id)
            .await
            .context("Failed to count interviews")?;

        Ok(PagedResult::new(items, total, params))
    }

    /// Update an interview's payment status (admin action)
    ///
    /// A move to `paid` sends a booking confirmation to the agency contact;
    /// the email is best-effort.
    pub async fn set_payment_status(
        &self,
        id: i64,
        status: PaymentStatus,
    ) -> Result<Interview, InterviewServiceError> {
        if self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get interview by ID")?
            .is_none()
        {
            return Err(InterviewServiceError::NotFound(id.to_string()));
        }

        let interview = self
            .repo
            .set_payment_status(id, status)
            .await
            .context("Failed to update interview payment status")?;

        if status == PaymentStatus::Paid {
            if let Some(ref mailer) = self.mailer {
                match self.article_repo.get_by_id(interview.article_id).await {
                    Ok(Some(article)) => {
                        if let Err(e) = mailer
                            .send_interview_confirmation(
                                &article.agency_contact,
                                &article.kol_name,
                                &interview.scheduled_time.to_rfc3339(),
                                interview.duration_minutes,
                            )
                            .await
                        {
                            tracing::warn!(
                                interview_id = id,
                                "Booking confirmation email failed: {}",
                                e
                            );
                        }
                    }
                    Ok(None) => {
                        tracing::warn!(interview_id = id, "Owning article missing, no email sent");
                    }
                    Err(e) => {
                        tracing::warn!(interview_id = id, "Article lookup failed: {}", e);
                    }
                }
            }
        }

        Ok(interview)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxArticleRepository, SqlxInterviewRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{CreateArticleInput, InterviewPackage};
    use chrono::TimeZone;

    async fn test_service() -> (InterviewService, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let article_repo = Arc::new(SqlxArticleRepository::new(pool.clone()));
        let input = CreateArticleInput {
            title: "Digital therapeutics in ADHD".to_string(),
            author_name: "Noa Levin".to_string(),
            agency_contact: "noa@agency.example".to_string(),
            kol_name: "Dr. Felix Hart".to_string(),
            kol_credentials: "MD, Psychiatry".to_string(),
            body: "Article body".to_string(),
            therapeutic_area: "Psychiatry".to_string(),
            target_audience: "Clinicians".to_string(),
            article_type: "Feature".to_string(),
            image_url: None,
            interview_package: InterviewPackage::Premium,
        };
        let (article, _) = article_repo.create(&input, None).await.unwrap();

        let service = InterviewService::new(
            Arc::new(SqlxInterviewRepository::new(pool)),
            article_repo,
        );
        (service, article.id)
    }

    fn when() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 11, 5, 9, 30, 0).unwrap()
    }

    #[tokio::test]
    async fn test_book_interview() {
        let (service, article_id) = test_service().await;

        let interview = service.book(article_id, when(), 15).await.unwrap();

        assert_eq!(interview.article_id, article_id);
        assert_eq!(interview.duration_minutes, 15);
        assert_eq!(interview.payment_status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_book_unknown_article_fails() {
        let (service, _) = test_service().await;

        let result = service.book(123456, when(), 15).await;
        assert!(matches!(
            result,
            Err(InterviewServiceError::ArticleNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_book_rejects_nonpositive_duration() {
        let (service, article_id) = test_service().await;

        let result = service.book(article_id, when(), 0).await;
        assert!(matches!(result, Err(InterviewServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_rebooking_replaces_schedule() {
        let (service, article_id) = test_service().await;

        service.book(article_id, when(), 15).await.unwrap();
        let rebooked = service
            .book(
                article_id,
                Utc.with_ymd_and_hms(2026, 11, 6, 11, 0, 0).unwrap(),
                30,
            )
            .await
            .unwrap();

        assert_eq!(rebooked.duration_minutes, 30);
        let page = service.list(Some(article_id), &ListParams::default()).await.unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_set_payment_status() {
        let (service, article_id) = test_service().await;

        let interview = service.book(article_id, when(), 15).await.unwrap();
        let updated = service
            .set_payment_status(interview.id, PaymentStatus::Paid)
            .await
            .unwrap();

        assert_eq!(updated.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn test_set_payment_status_unknown_interview() {
        let (service, _) = test_service().await;

        let result = service.set_payment_status(98765, PaymentStatus::Paid).await;
        assert!(matches!(result, Err(InterviewServiceError::NotFound(_))));
    }
}
