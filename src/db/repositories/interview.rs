//! Interview repository
//!
//! Database operations for scheduled KoL interviews.
//!
//! The table carries a UNIQUE constraint on article_id; `upsert_by_article`
//! leans on it so the payment callback can be redelivered without creating
//! duplicate bookings.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{CreateInterviewInput, Interview, PaymentStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Interview repository trait
#[async_trait]
pub trait InterviewRepository: Send + Sync {
    /// Create a new interview
    async fn create(&self, input: &CreateInterviewInput) -> Result<Interview>;

    /// Create or overwrite the interview for an article
    async fn upsert_by_article(&self, input: &CreateInterviewInput) -> Result<Interview>;

    /// Get interview by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Interview>>;

    /// Get the interview belonging to an article
    async fn get_by_article_id(&self, article_id: i64) -> Result<Option<Interview>>;

    /// List interviews with pagination, newest first, optionally filtered by
    /// article
    async fn list(
        &self,
        article_id: Option<i64>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Interview>>;

    /// Count interviews, optionally filtered by article
    async fn count(&self, article_id: Option<i64>) -> Result<i64>;

    /// Set the payment status
    async fn set_payment_status(&self, id: i64, status: PaymentStatus) -> Result<Interview>;
}

/// SQLx-based interview repository implementation
pub struct SqlxInterviewRepository {
    pool: DynDatabasePool,
}

impl SqlxInterviewRepository {
    /// Create a new SQLx interview repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn InterviewRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl InterviewRepository for SqlxInterviewRepository {
    async fn create(&self, input: &CreateInterviewInput) -> Result<Interview> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_interview_sqlite(self.pool.as_sqlite().unwrap(), input).await
            }
            DatabaseDriver::Mysql => {
                create_interview_mysql(self.pool.as_mysql().unwrap(), input).await
            }
        }
    }

    async fn upsert_by_article(&self, input: &CreateInterviewInput) -> Result<Interview> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                upsert_interview_sqlite(self.pool.as_sqlite().unwrap(), input).await
            }
            DatabaseDriver::Mysql => {
                upsert_interview_mysql(self.pool.as_mysql().unwrap(), input).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Interview>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_interview_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => {
                get_interview_by_id_mysql(self.pool.as_mysql().unwrap(), id).await
            }
        }
    }

    async fn get_by_article_id(&self, article_id: i64) -> Result<Option<Interview>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_interview_by_article_sqlite(self.pool.as_sqlite().unwrap(), article_id).await
            }
            DatabaseDriver::Mysql => {
                get_interview_by_article_mysql(self.pool.as_mysql().unwrap(), article_id).await
            }
        }
    }

    async fn list(
        &self,
        article_id: Option<i64>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Interview>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_interviews_sqlite(self.pool.as_sqlite().unwrap(), article_id, offset, limit)
                    .await
            }
            DatabaseDriver::Mysql => {
                list_interviews_mysql(self.pool.as_mysql().unwrap(), article_id, offset, limit)
                    .await
            }
        }
    }

    async fn count(&self, article_id: Option<i64>) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                count_interviews_sqlite(self.pool.as_sqlite().unwrap(), article_id).await
            }
            DatabaseDriver::Mysql => {
                count_interviews_mysql(self.pool.as_mysql().unwrap(), article_id).await
            }
        }
    }

    async fn set_payment_status(&self, id: i64, status: PaymentStatus) -> Result<Interview> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                set_payment_status_sqlite(self.pool.as_sqlite().unwrap(), id, status).await
            }
            DatabaseDriver::Mysql => {
                set_payment_status_mysql(self.pool.as_mysql().unwrap(), id, status).await
            }
        }
    }
}

const INTERVIEW_COLUMNS: &str =
    "id, article_id, scheduled_time, duration_minutes, payment_status, created_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_interview_sqlite(
    pool: &SqlitePool,
    input: &CreateInterviewInput,
) -> Result<Interview> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO interviews (article_id, scheduled_time, duration_minutes, payment_status, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(input.article_id)
    .bind(input.scheduled_time)
    .bind(input.duration_minutes)
    .bind(input.payment_status.as_str())
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create interview")?;

    Ok(Interview {
        id: result.last_insert_rowid(),
        article_id: input.article_id,
        scheduled_time: input.scheduled_time,
        duration_minutes: input.duration_minutes,
        payment_status: input.payment_status,
        created_at: now,
    })
}

async fn upsert_interview_sqlite(
    pool: &SqlitePool,
    input: &CreateInterviewInput,
) -> Result<Interview> {
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO interviews (article_id, scheduled_time, duration_minutes, payment_status, created_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(article_id) DO UPDATE SET
            scheduled_time = excluded.scheduled_time,
            duration_minutes = excluded.duration_minutes,
            payment_status = excluded.payment_status
        "#,
    )
    .bind(input.article_id)
    .bind(input.scheduled_time)
    .bind(input.duration_minutes)
    .bind(input.payment_status.as_str())
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to upsert interview")?;

    get_interview_by_article_sqlite(pool, input.article_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Interview missing after upsert: {}", input.article_id))
}

async fn get_interview_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Interview>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM interviews WHERE id = ?",
        INTERVIEW_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get interview by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_interview_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn get_interview_by_article_sqlite(
    pool: &SqlitePool,
    article_id: i64,
) -> Result<Option<Interview>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM interviews WHERE article_id = ?",
        INTERVIEW_COLUMNS
    ))
    .bind(article_id)
    .fetch_optional(pool)
    .await
    .context("Failed to get interview by article")?;

    match row {
        Some(row) => Ok(Some(row_to_interview_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn list_interviews_sqlite(
    pool: &SqlitePool,
    article_id: Option<i64>,
    offset: i64,
    limit: i64,
) -> Result<Vec<Interview>> {
    let rows = match article_id {
        Some(article_id) => {
            sqlx::query(&format!(
                "SELECT {} FROM interviews WHERE article_id = ? ORDER BY created_at DESC LIMIT ? OFFSET ?",
                INTERVIEW_COLUMNS
            ))
            .bind(article_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query(&format!(
                "SELECT {} FROM interviews ORDER BY created_at DESC LIMIT ? OFFSET ?",
                INTERVIEW_COLUMNS
            ))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
        }
    }
    .context("Failed to list interviews")?;

    let mut interviews = Vec::new();
    for row in rows {
        interviews.push(row_to_interview_sqlite(&row)?);
    }

    Ok(interviews)
}

async fn count_interviews_sqlite(pool: &SqlitePool, article_id: Option<i64>) -> Result<i64> {
    let row = match article_id {
        Some(article_id) => {
            sqlx::query("SELECT COUNT(*) as count FROM interviews WHERE article_id = ?")
                .bind(article_id)
                .fetch_one(pool)
                .await
        }
        None => {
            sqlx::query("SELECT COUNT(*) as count FROM interviews")
                .fetch_one(pool)
                .await
        }
    }
    .context("Failed to count interviews")?;

    Ok(row.get("count"))
}

async fn set_payment_status_sqlite(
    pool: &SqlitePool,
    id: i64,
    status: PaymentStatus,
) -> Result<Interview> {
    let result = sqlx::query("UPDATE interviews SET payment_status = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update interview payment status")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("Interview not found: {}", id);
    }

    get_interview_by_id_sqlite(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Interview not found after update: {}", id))
}

fn row_to_interview_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Interview> {
    let payment_str: String = row.get("payment_status");
    let payment_status = PaymentStatus::from_str(&payment_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid payment status: {}", payment_str))?;

    Ok(Interview {
        id: row.get("id"),
        article_id: row.get("article_id"),
        scheduled_time: row.get("scheduled_time"),
        duration_minutes: row.get("duration_minutes"),
        payment_status,
        created_at: row.get("created_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_interview_mysql(
    pool: &MySqlPool,
    input: &CreateInterviewInput,
) -> Result<Interview> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO interviews (article_id, scheduled_time, duration_minutes, payment_status, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(input.article_id)
    .bind(input.scheduled_time)
    .bind(input.duration_minutes)
    .bind(input.payment_status.as_str())
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create interview")?;

    Ok(Interview {
        id: result.last_insert_id() as i64,
        article_id: input.article_id,
        scheduled_time: input.scheduled_time,
        duration_minutes: input.duration_minutes,
        payment_status: input.payment_status,
        created_at: now,
    })
}

async fn upsert_interview_mysql(
    pool: &MySqlPool,
    input: &CreateInterviewInput,
) -> Result<Interview> {
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO interviews (article_id, scheduled_time, duration_minutes, payment_status, created_at)
        VALUES (?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            scheduled_time = VALUES(scheduled_time),
            duration_minutes = VALUES(duration_minutes),
            payment_status = VALUES(payment_status)
        "#,
    )
    .bind(input.article_id)
    .bind(input.scheduled_time)
    .bind(input.duration_minutes)
    .bind(input.payment_status.as_str())
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to upsert interview")?;

    get_interview_by_article_mysql(pool, input.article_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Interview missing after upsert: {}", input.article_id))
}

async fn get_interview_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Interview>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM interviews WHERE id = ?",
        INTERVIEW_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get interview by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_interview_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn get_interview_by_article_mysql(
    pool: &MySqlPool,
    article_id: i64,
) -> Result<Option<Interview>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM interviews WHERE article_id = ?",
        INTERVIEW_COLUMNS
    ))
    .bind(article_id)
    .fetch_optional(pool)
    .await
    .context("Failed to get interview by article")?;

    match row {
        Some(row) => Ok(Some(row_to_interview_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn list_interviews_mysql(
    pool: &MySqlPool,
    article_id: Option<i64>,
    offset: i64,
    limit: i64,
) -> Result<Vec<Interview>> {
    let rows = match article_id {
        Some(article_id) => {
            sqlx::query(&format!(
                "SELECT {} FROM interviews WHERE article_id = ? ORDER BY created_at DESC LIMIT ? OFFSET ?",
                INTERVIEW_COLUMNS
            ))
            .bind(article_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query(&format!(
                "SELECT {} FROM interviews ORDER BY created_at DESC LIMIT ? OFFSET ?",
                INTERVIEW_COLUMNS
            ))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
        }
    }
    .context("Failed to list interviews")?;

    let mut interviews = Vec::new();
    for row in rows {
        interviews.push(row_to_interview_mysql(&row)?);
    }

    Ok(interviews)
}

async fn count_interviews_mysql(pool: &MySqlPool, article_id: Option<i64>) -> Result<i64> {
    let row = match article_id {
        Some(article_id) => {
            sqlx::query("SELECT COUNT(*) as count FROM interviews WHERE article_id = ?")
                .bind(article_id)
                .fetch_one(pool)
                .await
        }
        None => {
            sqlx::query("SELECT COUNT(*) as count FROM interviews")
                .fetch_one(pool)
                .await
        }
    }
    .context("Failed to count interviews")?;

    Ok(row.get("count"))
}

async fn set_payment_status_mysql(
    pool: &MySqlPool,
    id: i64,
    status: PaymentStatus,
) -> Result<Interview> {
    let result = sqlx::query("UPDATE interviews SET payment_status = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update interview payment status")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("Interview not found: {}", id);
    }

    get_interview_by_id_mysql(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Interview not found after update: {}", id))
}

fn row_to_interview_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Interview> {
    let payment_str: String = row.get("payment_status");
    let payment_status = PaymentStatus::from_str(&payment_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid payment status: {}", payment_str))?;

    Ok(Interview {
        id: row.get("id"),
        article_id: row.get("article_id"),
        scheduled_time: row.get("scheduled_time"),
        duration_minutes: row.get("duration_minutes"),
        payment_status,
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::article::{ArticleRepository, SqlxArticleRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{CreateArticleInput, InterviewPackage};
    use chrono::TimeZone;

    async fn seeded_repos() -> (SqlxArticleRepository, SqlxInterviewRepository, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let articles = SqlxArticleRepository::new(pool.clone());
        let interviews = SqlxInterviewRepository::new(pool);

        let input = CreateArticleInput {
            title: "Biologics in severe asthma".to_string(),
            author_name: "Sam Ortiz".to_string(),
            agency_contact: "sam@agency.example".to_string(),
            kol_name: "Dr. Ilse Brandt".to_string(),
            kol_credentials: "MD, Pulmonology".to_string(),
            body: "Article body".to_string(),
            therapeutic_area: "Pulmonology".to_string(),
            target_audience: "Specialists".to_string(),
            article_type: "Expert Opinion".to_string(),
            image_url: None,
            interview_package: InterviewPackage::PremiumPlus,
        };
        let (article, _) = articles.create(&input, None).await.unwrap();

        (articles, interviews, article.id)
    }

    fn booking(article_id: i64, hour: u32, duration: i32) -> CreateInterviewInput {
        CreateInterviewInput {
            article_id,
            scheduled_time: Utc.with_ymd_and_hms(2026, 9, 15, hour, 0, 0).unwrap(),
            duration_minutes: duration,
            payment_status: PaymentStatus::Pending,
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let (_, interviews, article_id) = seeded_repos().await;

        let created = interviews.create(&booking(article_id, 10, 30)).await.unwrap();
        let fetched = interviews
            .get_by_id(created.id)
            .await
            .unwrap()
            .expect("Interview should exist");

        assert_eq!(fetched.article_id, article_id);
        assert_eq!(fetched.duration_minutes, 30);
        assert_eq!(fetched.payment_status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_create_rejects_missing_article() {
        let (_, interviews, _) = seeded_repos().await;
        let result = interviews.create(&booking(9999, 10, 15)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_upsert_overwrites_existing_booking() {
        let (_, interviews, article_id) = seeded_repos().await;

        interviews.create(&booking(article_id, 10, 15)).await.unwrap();

        let mut updated = booking(article_id, 16, 30);
        updated.payment_status = PaymentStatus::Paid;
        let result = interviews.upsert_by_article(&updated).await.unwrap();

        assert_eq!(result.duration_minutes, 30);
        assert_eq!(result.payment_status, PaymentStatus::Paid);

        // Still exactly one row for the article
        assert_eq!(interviews.count(Some(article_id)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let (_, interviews, article_id) = seeded_repos().await;

        let mut input = booking(article_id, 12, 15);
        input.payment_status = PaymentStatus::Paid;

        let first = interviews.upsert_by_article(&input).await.unwrap();
        let second = interviews.upsert_by_article(&input).await.unwrap();

        assert_eq!(first.article_id, second.article_id);
        assert_eq!(second.payment_status, PaymentStatus::Paid);
        assert_eq!(interviews.count(None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_set_payment_status() {
        let (_, interviews, article_id) = seeded_repos().await;

        let created = interviews.create(&booking(article_id, 10, 15)).await.unwrap();
        let updated = interviews
            .set_payment_status(created.id, PaymentStatus::Paid)
            .await
            .unwrap();

        assert_eq!(updated.payment_status, PaymentStatus::Paid);
    }
}
