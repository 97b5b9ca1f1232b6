//! Article repository
//!
//! Database operations for articles.
//!
//! This module provides:
//! - `ArticleRepository` trait defining the interface for article data access
//! - `SqlxArticleRepository` implementing the trait for SQLite and MySQL
//!
//! The intake insert and the bundled interview insert run in one
//! transaction: either both rows land or neither does.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{
    Article, ArticleStatus, CreateArticleInput, Interview, InterviewPackage, InterviewSeed,
    PaymentStatus,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Article repository trait
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Create a new article, optionally with its bundled interview, in a
    /// single transaction
    async fn create(
        &self,
        input: &CreateArticleInput,
        interview: Option<&InterviewSeed>,
    ) -> Result<(Article, Option<Interview>)>;

    /// Get article by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Article>>;

    /// List articles with pagination, newest first, optionally filtered by
    /// status
    async fn list(
        &self,
        status: Option<ArticleStatus>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Article>>;

    /// Count articles, optionally filtered by status
    async fn count(&self, status: Option<ArticleStatus>) -> Result<i64>;

    /// Set the editorial review status
    async fn set_status(&self, id: i64, status: ArticleStatus) -> Result<Article>;

    /// Overwrite the payment status, returning the number of rows touched
    ///
    /// A blind overwrite on purpose: provider callbacks may be redelivered
    /// and writing the same value again is harmless.
    async fn set_payment_status(&self, id: i64, status: PaymentStatus) -> Result<u64>;
}

/// SQLx-based article repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxArticleRepository {
    pool: DynDatabasePool,
}

impl SqlxArticleRepository {
    /// Create a new SQLx article repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ArticleRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ArticleRepository for SqlxArticleRepository {
    async fn create(
        &self,
        input: &CreateArticleInput,
        interview: Option<&InterviewSeed>,
    ) -> Result<(Article, Option<Interview>)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_article_sqlite(self.pool.as_sqlite().unwrap(), input, interview).await
            }
            DatabaseDriver::Mysql => {
                create_article_mysql(self.pool.as_mysql().unwrap(), input, interview).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Article>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_article_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => {
                get_article_by_id_mysql(self.pool.as_mysql().unwrap(), id).await
            }
        }
    }

    async fn list(
        &self,
        status: Option<ArticleStatus>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Article>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_articles_sqlite(self.pool.as_sqlite().unwrap(), status, offset, limit).await
            }
            DatabaseDriver::Mysql => {
                list_articles_mysql(self.pool.as_mysql().unwrap(), status, offset, limit).await
            }
        }
    }

    async fn count(&self, status: Option<ArticleStatus>) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                count_articles_sqlite(self.pool.as_sqlite().unwrap(), status).await
            }
            DatabaseDriver::Mysql => {
                count_articles_mysql(self.pool.as_mysql().unwrap(), status).await
            }
        }
    }

    async fn set_status(&self, id: i64, status: ArticleStatus) -> Result<Article> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                set_status_sqlite(self.pool.as_sqlite().unwrap(), id, status).await
            }
            DatabaseDriver::Mysql => {
                set_status_mysql(self.pool.as_mysql().unwrap(), id, status).await
            }
        }
    }

    async fn set_payment_status(&self, id: i64, status: PaymentStatus) -> Result<u64> {
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

const ARTICLE_COLUMNS: &str = "id, title, author_name, agency_contact, kol_name, kol_credentials, body, therapeutic_area, target_audience, article_type, image_url, interview_package, status, payment_status, created_at, updated_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_article_sqlite(
    pool: &SqlitePool,
    input: &CreateArticleInput,
    interview: Option<&InterviewSeed>,
) -> Result<(Article, Option<Interview>)> {
    let now = Utc::now();

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        r#"
        INSERT INTO articles (title, author_name, agency_contact, kol_name, kol_credentials, body, therapeutic_area, target_audience, article_type, image_url, interview_package, status, payment_status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.title)
    .bind(&input.author_name)
    .bind(&input.agency_contact)
    .bind(&input.kol_name)
    .bind(&input.kol_credentials)
    .bind(&input.body)
    .bind(&input.therapeutic_area)
    .bind(&input.target_audience)
    .bind(&input.article_type)
    .bind(&input.image_url)
    .bind(input.interview_package.as_str())
    .bind(ArticleStatus::PendingReview.as_str())
    .bind(PaymentStatus::Pending.as_str())
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to create article")?;

    let article_id = result.last_insert_rowid();

    let created_interview = if let Some(seed) = interview {
        let result = sqlx::query(
            r#"
            INSERT INTO interviews (article_id, scheduled_time, duration_minutes, payment_status, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(article_id)
        .bind(seed.scheduled_time)
        .bind(seed.duration_minutes)
        .bind(PaymentStatus::Pending.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to create bundled interview")?;

        Some(Interview {
            id: result.last_insert_rowid(),
            article_id,
            scheduled_time: seed.scheduled_time,
            duration_minutes: seed.duration_minutes,
            payment_status: PaymentStatus::Pending,
            created_at: now,
        })
    } else {
        None
    };

    tx.commit().await.context("Failed to commit intake")?;

    Ok((
        Article {
            id: article_id,
            title: input.title.clone(),
            author_name: input.author_name.clone(),
            agency_contact: input.agency_contact.clone(),
            kol_name: input.kol_name.clone(),
            kol_credentials: input.kol_credentials.clone(),
            body: input.body.clone(),
            therapeutic_area: input.therapeutic_area.clone(),
            target_audience: input.target_audience.clone(),
            article_type: input.article_type.clone(),
            image_url: input.image_url.clone(),
            interview_package: input.interview_package,
            status: ArticleStatus::PendingReview,
            payment_status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        },
        created_interview,
    ))
}

async fn get_article_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Article>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM articles WHERE id = ?",
        ARTICLE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get article by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_article_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn list_articles_sqlite(
    pool: &SqlitePool,
    status: Option<ArticleStatus>,
    offset: i64,
    limit: i64,
) -> Result<Vec<Article>> {
    let rows = match status {
        Some(status) => {
            sqlx::query(&format!(
                "SELECT {} FROM articles WHERE status = ? ORDER BY created_at DESC LIMIT ? OFFSET ?",
                ARTICLE_COLUMNS
            ))
            .bind(status.as_str())
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query(&format!(
                "SELECT {} FROM articles ORDER BY created_at DESC LIMIT ? OFFSET ?",
                ARTICLE_COLUMNS
            ))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
        }
    }
    .context("Failed to list articles")?;

    let mut articles = Vec::new();
    for row in rows {
        articles.push(row_to_article_sqlite(&row)?);
    }

    Ok(articles)
}

async fn count_articles_sqlite(pool: &SqlitePool, status: Option<ArticleStatus>) -> Result<i64> {
    let row = match status {
        Some(status) => {
            sqlx::query("SELECT COUNT(*) as count FROM articles WHERE status = ?")
                .bind(status.as_str())
                .fetch_one(pool)
                .await
        }
        None => {
            sqlx::query("SELECT COUNT(*) as count FROM articles")
                .fetch_one(pool)
                .await
        }
    }
    .context("Failed to count articles")?;

    Ok(row.get("count"))
}

async fn set_status_sqlite(pool: &SqlitePool, id: i64, status: ArticleStatus) -> Result<Article> {
    let now = Utc::now();

    let result = sqlx::query("UPDATE articles SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(now)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update article status")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("Article not found: {}", id);
    }

    get_article_by_id_sqlite(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Article not found after update: {}", id))
}

async fn set_payment_status_sqlite(
    pool: &SqlitePool,
    id: i64,
    status: PaymentStatus,
) -> Result<u64> {
    let now = Utc::now();

    let result = sqlx::query("UPDATE articles SET payment_status = ?, updated_at = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(now)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update article payment status")?;

    Ok(result.rows_affected())
}

fn row_to_article_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Article> {
    let status_str: String = row.get("status");
    let status = ArticleStatus::from_str(&status_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid article status: {}", status_str))?;

    let payment_str: String = row.get("payment_status");
    let payment_status = PaymentStatus::from_str(&payment_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid payment status: {}", payment_str))?;

    let package_str: String = row.get("interview_package");
    let interview_package = InterviewPackage::from_str(&package_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid interview package: {}", package_str))?;

    Ok(Article {
        id: row.get("id"),
        title: row.get("title"),
        author_name: row.get("author_name"),
        agency_contact: row.get("agency_contact"),
        kol_name: row.get("kol_name"),
        kol_credentials: row.get("kol_credentials"),
        body: row.get("body"),
        therapeutic_area: row.get("therapeutic_area"),
        target_audience: row.get("target_audience"),
        article_type: row.get("article_type"),
        image_url: row.try_get("image_url").ok(),
        interview_package,
        status,
        payment_status,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_article_mysql(
    pool: &MySqlPool,
    input: &CreateArticleInput,
    interview: Option<&InterviewSeed>,
) -> Result<(Article, Option<Interview>)> {
    let now = Utc::now();

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        r#"
        INSERT INTO articles (title, author_name, agency_contact, kol_name, kol_credentials, body, therapeutic_area, target_audience, article_type, image_url, interview_package, status, payment_status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.title)
    .bind(&input.author_name)
    .bind(&input.agency_contact)
    .bind(&input.kol_name)
    .bind(&input.kol_credentials)
    .bind(&input.body)
    .bind(&input.therapeutic_area)
    .bind(&input.target_audience)
    .bind(&input.article_type)
    .bind(&input.image_url)
    .bind(input.interview_package.as_str())
    .bind(ArticleStatus::PendingReview.as_str())
    .bind(PaymentStatus::Pending.as_str())
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to create article")?;

    let article_id = result.last_insert_id() as i64;

    let created_interview = if let Some(seed) = interview {
        let result = sqlx::query(
            r#"
            INSERT INTO interviews (article_id, scheduled_time, duration_minutes, payment_status, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(article_id)
        .bind(seed.scheduled_time)
        .bind(seed.duration_minutes)
        .bind(PaymentStatus::Pending.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to create bundled interview")?;

        Some(Interview {
            id: result.last_insert_id() as i64,
            article_id,
            scheduled_time: seed.scheduled_time,
            duration_minutes: seed.duration_minutes,
            payment_status: PaymentStatus::Pending,
            created_at: now,
        })
    } else {
        None
    };

    tx.commit().await.context("Failed to commit intake")?;

    Ok((
        Article {
            id: article_id,
            title: input.title.clone(),
            author_name: input.author_name.clone(),
            agency_contact: input.agency_contact.clone(),
            kol_name: input.kol_name.clone(),
            kol_credentials: input.kol_credentials.clone(),
            body: input.body.clone(),
            therapeutic_area: input.therapeutic_area.clone(),
            target_audience: input.target_audience.clone(),
            article_type: input.article_type.clone(),
            image_url: input.image_url.clone(),
            interview_package: input.interview_package,
            status: ArticleStatus::PendingReview,
            payment_status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        },
        created_interview,
    ))
}

async fn get_article_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Article>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM articles WHERE id = ?",
        ARTICLE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get article by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_article_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn list_articles_mysql(
    pool: &MySqlPool,
    status: Option<ArticleStatus>,
    offset: i64,
    limit: i64,
) -> Result<Vec<Article>> {
    let rows = match status {
        Some(status) => {
            sqlx::query(&format!(
                "SELECT {} FROM articles WHERE status = ? ORDER BY created_at DESC LIMIT ? OFFSET ?",
                ARTICLE_COLUMNS
            ))
            .bind(status.as_str())
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query(&format!(
                "SELECT {} FROM articles ORDER BY created_at DESC LIMIT ? OFFSET ?",
                ARTICLE_COLUMNS
            ))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
        }
    }
    .context("Failed to list articles")?;

    let mut articles = Vec::new();
    for row in rows {
        articles.push(row_to_article_mysql(&row)?);
    }

    Ok(articles)
}

async fn count_articles_mysql(pool: &MySqlPool, status: Option<ArticleStatus>) -> Result<i64> {
    let row = match status {
        Some(status) => {
            sqlx::query("SELECT COUNT(*) as count FROM articles WHERE status = ?")
                .bind(status.as_str())
                .fetch_one(pool)
                .await
        }
        None => {
            sqlx::query("SELECT COUNT(*) as count FROM articles")
                .fetch_one(pool)
                .await
        }
    }
    .context("Failed to count articles")?;

    Ok(row.get("count"))
}

async fn set_status_mysql(pool: &MySqlPool, id: i64, status: ArticleStatus) -> Result<Article> {
    let now = Utc::now();

    let result = sqlx::query("UPDATE articles SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(now)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update article status")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("Article not found: {}", id);
    }

    get_article_by_id_mysql(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Article not found after update: {}", id))
}

async fn set_payment_status_mysql(
    pool: &MySqlPool,
    id: i64,
    status: PaymentStatus,
) -> Result<u64> {
    let now = Utc::now();

    let result = sqlx::query("UPDATE articles SET payment_status = ?, updated_at = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(now)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update article payment status")?;

    Ok(result.rows_affected())
}

fn row_to_article_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Article> {
    let status_str: String = row.get("status");
    let status = ArticleStatus::from_str(&status_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid article status: {}", status_str))?;

    let payment_str: String = row.get("payment_status");
    let payment_status = PaymentStatus::from_str(&payment_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid payment status: {}", payment_str))?;

    let package_str: String = row.get("interview_package");
    let interview_package = InterviewPackage::from_str(&package_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid interview package: {}", package_str))?;

    Ok(Article {
        id: row.get("id"),
        title: row.get("title"),
        author_name: row.get("author_name"),
        agency_contact: row.get("agency_contact"),
        kol_name: row.get("kol_name"),
        kol_credentials: row.get("kol_credentials"),
        body: row.get("body"),
        therapeutic_area: row.get("therapeutic_area"),
        target_audience: row.get("target_audience"),
        article_type: row.get("article_type"),
        image_url: row.try_get("image_url").ok(),
        interview_package,
        status,
        payment_status,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::InterviewPackage;
    use chrono::TimeZone;

    async fn test_repo() -> SqlxArticleRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxArticleRepository::new(pool)
    }

    fn sample_input(package: InterviewPackage) -> CreateArticleInput {
        CreateArticleInput {
            title: "GLP-1 agonists in primary care".to_string(),
            author_name: "Dana Wells".to_string(),
            agency_contact: "dana@agency.example".to_string(),
            kol_name: "Dr. Marisol Vega".to_string(),
            kol_credentials: "MD, Endocrinology".to_string(),
            body: "Long-form article body".to_string(),
            therapeutic_area: "Endocrinology".to_string(),
            target_audience: "Primary care physicians".to_string(),
            article_type: "Clinical Review".to_string(),
            image_url: None,
            interview_package: package,
        }
    }

    #[tokio::test]
    async fn test_create_basic_has_no_interview() {
        let repo = test_repo().await;

        let (article, interview) = repo
            .create(&sample_input(InterviewPackage::Basic), None)
            .await
            .expect("Failed to create article");

        assert!(article.id > 0);
        assert_eq!(article.status, ArticleStatus::PendingReview);
        assert_eq!(article.payment_status, PaymentStatus::Pending);
        assert!(interview.is_none());
    }

    #[tokio::test]
    async fn test_create_with_interview_is_transactional() {
        let repo = test_repo().await;

        let seed = InterviewSeed {
            scheduled_time: Utc.with_ymd_and_hms(2026, 9, 1, 14, 0, 0).unwrap(),
            duration_minutes: 15,
        };
        let (article, interview) = repo
            .create(&sample_input(InterviewPackage::Premium), Some(&seed))
            .await
            .expect("Failed to create article with interview");

        let interview = interview.expect("Interview should be created");
        assert_eq!(interview.article_id, article.id);
        assert_eq!(interview.duration_minutes, 15);
        assert_eq!(interview.payment_status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_get_by_id_roundtrip() {
        let repo = test_repo().await;

        let (created, _) = repo
            .create(&sample_input(InterviewPackage::Basic), None)
            .await
            .unwrap();
        let fetched = repo
            .get_by_id(created.id)
            .await
            .unwrap()
            .expect("Article should exist");

        assert_eq!(fetched.title, created.title);
        assert_eq!(fetched.interview_package, InterviewPackage::Basic);
        assert_eq!(fetched.status, ArticleStatus::PendingReview);
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let repo = test_repo().await;

        let (a, _) = repo
            .create(&sample_input(InterviewPackage::Basic), None)
            .await
            .unwrap();
        let (_b, _) = repo
            .create(&sample_input(InterviewPackage::Basic), None)
            .await
            .unwrap();

        repo.set_status(a.id, ArticleStatus::Approved).await.unwrap();

        let approved = repo
            .list(Some(ArticleStatus::Approved), 0, 10)
            .await
            .unwrap();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].id, a.id);

        let all = repo.list(None, 0, 10).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(repo.count(Some(ArticleStatus::PendingReview)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_set_status_missing_article_fails() {
        let repo = test_repo().await;
        let result = repo.set_status(42, ArticleStatus::Approved).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_set_payment_status_is_idempotent() {
        let repo = test_repo().await;

        let (article, _) = repo
            .create(&sample_input(InterviewPackage::Basic), None)
            .await
            .unwrap();

        let first = repo
            .set_payment_status(article.id, PaymentStatus::Paid)
            .await
            .unwrap();
        let second = repo
            .set_payment_status(article.id, PaymentStatus::Paid)
            .await
            .unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 1);

        let fetched = repo.get_by_id(article.id).await.unwrap().unwrap();
        assert_eq!(fetched.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn test_set_payment_status_unknown_article_touches_nothing() {
        let repo = test_repo().await;
        let touched = repo
            .set_payment_status(4242, PaymentStatus::Paid)
            .await
            .unwrap();
        assert_eq!(touched, 0);
    }
}
