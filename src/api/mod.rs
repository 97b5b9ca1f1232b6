//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP API endpoints for MedTimes:
//! - Article intake and admin review endpoints
//! - Interview booking endpoints
//! - Checkout and verification endpoints
//! - Stripe webhook receiver
//! - Image upload endpoint
//! - Health check

pub mod articles;
pub mod health;
pub mod interviews;
pub mod middleware;
pub mod payments;
pub mod responses;
pub mod upload;
pub mod webhooks;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::path::Path;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub use middleware::{ApiError, AppState};

/// Multipart body ceiling; sits above the validated max file size so an
/// oversize upload reaches the handler and gets the descriptive 400 instead
/// of a bare body-limit rejection.
const UPLOAD_BODY_LIMIT: usize = 12 * 1024 * 1024;

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (shared bearer token)
    let admin_routes = Router::new()
        .route("/articles", get(articles::list_articles))
        .route("/articles/{id}", get(articles::get_article))
        .route("/articles/{id}/status", put(articles::update_article_status))
        .route("/interviews", get(interviews::list_interviews))
        .route(
            "/interviews/{id}/payment",
            put(interviews::update_interview_payment),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_admin,
        ));

    // Public routes
    Router::new()
        .route("/articles", post(articles::create_article))
        .route("/interviews", post(interviews::create_interview))
        .route("/payment/checkout", post(payments::create_checkout))
        .route("/payment/verify", get(payments::verify_checkout))
        .route(
            "/upload/image",
            post(upload::upload_image).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/webhooks/stripe", post(webhooks::stripe_webhook))
        .route("/health", get(health::health_check))
        .merge(admin_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str, upload_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        // Locally stored uploads are served straight from disk
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ImageHostConfig, UploadConfig};
    use crate::db::repositories::{SqlxArticleRepository, SqlxInterviewRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::services::{ArticleService, ImageStore, InterviewService, StripeGateway};
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use std::sync::Arc;

    const ADMIN_TOKEN: &str = "test-admin-token";

    /// Build a test server over an in-memory database.
    ///
    /// The returned TempDir keeps the upload directory alive for the test.
    async fn test_server(with_admin: bool, with_stripe: bool) -> (TestServer, tempfile::TempDir) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let article_repo = Arc::new(SqlxArticleRepository::new(pool.clone()));
        let interview_repo = Arc::new(SqlxInterviewRepository::new(pool.clone()));

        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let upload = UploadConfig {
            path: dir.path().join("uploads"),
            ..UploadConfig::default()
        };

        let payments = with_stripe.then(|| {
            Arc::new(StripeGateway::new(
                "sk_test_abc",
                Some("whsec_test_secret".to_string()),
            ))
        });

        let state = AppState {
            pool,
            article_service: Arc::new(ArticleService::new(
                article_repo.clone(),
                interview_repo.clone(),
            )),
            interview_service: Arc::new(InterviewService::new(interview_repo, article_repo)),
            payments,
            image_store: Arc::new(ImageStore::new(upload, ImageHostConfig::default())),
            admin_token: with_admin.then(|| ADMIN_TOKEN.to_string()),
            base_url: "http://localhost:3000".to_string(),
        };

        let upload_dir = dir.path().join("uploads");
        let server = TestServer::new(build_router(state, "http://localhost:3000", &upload_dir))
            .expect("Failed to build test server");

        (server, dir)
    }

    fn submission(package: &str) -> Value {
        json!({
            "title": "Biosimilars in rheumatology",
            "author_name": "Jordan Blake",
            "agency_contact": "jordan@agency.example",
            "kol_name": "Dr. Priya Nair",
            "kol_credentials": "MD, Rheumatology",
            "body": "Long-form article body",
            "therapeutic_area": "Rheumatology",
            "target_audience": "Rheumatologists",
            "article_type": "Clinical Review",
            "interview_package": package,
        })
    }

    #[tokio::test]
    async fn test_submit_basic_article() {
        let (server, _dir) = test_server(true, false).await;

        let response = server
            .post("/api/v1/articles")
            .json(&submission("basic"))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["status"], "pending_review");
        assert_eq!(body["payment_status"], "pending");
        assert_eq!(body["interview_package"], "basic");
        assert!(body.get("interview").is_none());

        // No interview row was created
        let list = server
            .get("/api/v1/interviews")
            .authorization_bearer(ADMIN_TOKEN)
            .await;
        list.assert_status_ok();
        assert_eq!(list.json::<Value>()["total"], 0);
    }

    #[tokio::test]
    async fn test_submit_premium_with_schedule_books_interview() {
        let (server, _dir) = test_server(true, false).await;

        let mut payload = submission("premium");
        payload["interview_date"] = json!("2026-10-20");
        payload["interview_time"] = json!("14:00");

        let response = server.post("/api/v1/articles").json(&payload).await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["interview"]["duration_minutes"], 15);
        assert_eq!(body["interview"]["payment_status"], "pending");
    }

    #[tokio::test]
    async fn test_submit_unknown_package_is_rejected() {
        let (server, _dir) = test_server(true, false).await;

        let response = server
            .post("/api/v1/articles")
            .json(&submission("platinum"))
            .await;
        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_submit_missing_fields_is_rejected() {
        let (server, _dir) = test_server(true, false).await;

        let response = server
            .post("/api/v1/articles")
            .json(&json!({ "title": "No body" }))
            .await;
        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_admin_routes_require_token() {
        let (server, _dir) = test_server(true, false).await;

        let response = server.get("/api/v1/articles").await;
        response.assert_status_unauthorized();

        let response = server
            .get("/api/v1/articles")
            .authorization_bearer("wrong-token")
            .await;
        response.assert_status_unauthorized();

        let response = server
            .get("/api/v1/articles")
            .authorization_bearer(ADMIN_TOKEN)
            .await;
        response.assert_status_ok();
    }

    #[tokio::test]
    async fn test_admin_routes_unavailable_without_configured_token() {
        let (server, _dir) = test_server(false, false).await;

        let response = server
            .get("/api/v1/articles")
            .authorization_bearer(ADMIN_TOKEN)
            .await;
        assert_eq!(response.status_code().as_u16(), 503);
    }

    #[tokio::test]
    async fn test_admin_review_approves_article() {
        let (server, _dir) = test_server(true, false).await;

        let created: Value = server
            .post("/api/v1/articles")
            .json(&submission("basic"))
            .await
            .json();
        let id = created["id"].as_i64().unwrap();

        let response = server
            .put(&format!("/api/v1/articles/{}/status", id))
            .authorization_bearer(ADMIN_TOKEN)
            .json(&json!({ "status": "approved" }))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "approved");

        // Filtered listing sees it
        let list: Value = server
            .get("/api/v1/articles")
            .add_query_param("status", "approved")
            .authorization_bearer(ADMIN_TOKEN)
            .await
            .json();
        assert_eq!(list["total"], 1);
    }

    #[tokio::test]
    async fn test_admin_review_rejects_invalid_status() {
        let (server, _dir) = test_server(true, false).await;

        let created: Value = server
            .post("/api/v1/articles")
            .json(&submission("basic"))
            .await
            .json();
        let id = created["id"].as_i64().unwrap();

        let response = server
            .put(&format!("/api/v1/articles/{}/status", id))
            .authorization_bearer(ADMIN_TOKEN)
            .json(&json!({ "status": "published" }))
            .await;
        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_interview_booking_for_missing_article() {
        let (server, _dir) = test_server(true, false).await;

        let response = server
            .post("/api/v1/interviews")
            .json(&json!({
                "article_id": 9999,
                "scheduled_time": "2026-10-20T14:00:00Z",
                "duration_minutes": 15,
            }))
            .await;
        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn test_webhook_invalid_signature_mutates_nothing() {
        let (server, _dir) = test_server(true, true).await;

        let created: Value = server
            .post("/api/v1/articles")
            .json(&submission("premium"))
            .await
            .json();
        let id = created["id"].as_i64().unwrap();

        let response = server
            .post("/api/v1/webhooks/stripe")
            .add_header(
                axum::http::HeaderName::from_static("stripe-signature"),
                axum::http::HeaderValue::from_static("t=1,v1=deadbeef"),
            )
            .text(r#"{"id":"evt_test","type":"checkout.session.completed"}"#)
            .await;
        response.assert_status_bad_request();

        // Payment status is untouched
        let article: Value = server
            .get(&format!("/api/v1/articles/{}", id))
            .authorization_bearer(ADMIN_TOKEN)
            .await
            .json();
        assert_eq!(article["payment_status"], "pending");
    }

    #[tokio::test]
    async fn test_webhook_missing_signature_header() {
        let (server, _dir) = test_server(true, true).await;

        let response = server
            .post("/api/v1/webhooks/stripe")
            .text("{}")
            .await;
        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_checkout_unavailable_without_stripe() {
        let (server, _dir) = test_server(true, false).await;

        let created: Value = server
            .post("/api/v1/articles")
            .json(&submission("premium"))
            .await
            .json();

        let response = server
            .post("/api/v1/payment/checkout")
            .json(&json!({
                "article_id": created["id"],
                "package": "premium",
            }))
            .await;
        assert_eq!(response.status_code().as_u16(), 503);
    }

    #[tokio::test]
    async fn test_verify_requires_session_id() {
        let (server, _dir) = test_server(true, true).await;

        let response = server.get("/api/v1/payment/verify").await;
        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_upload_rejects_wrong_content_type() {
        let (server, _dir) = test_server(true, false).await;

        let part = axum_test::multipart::Part::bytes(b"%PDF-1.4".to_vec())
            .file_name("paper.pdf")
            .mime_type("application/pdf");
        let form = axum_test::multipart::MultipartForm::new().add_part("file", part);

        let response = server.post("/api/v1/upload/image").multipart(form).await;
        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_upload_stores_valid_image() {
        let (server, _dir) = test_server(true, false).await;

        let part = axum_test::multipart::Part::bytes(vec![0x89, 0x50, 0x4E, 0x47])
            .file_name("figure.png")
            .mime_type("image/png");
        let form = axum_test::multipart::MultipartForm::new().add_part("file", part);

        let response = server.post("/api/v1/upload/image").multipart(form).await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert!(body["url"].as_str().unwrap().starts_with("/uploads/"));
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (server, _dir) = test_server(true, false).await;

        let response = server.get("/api/v1/health").await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["database"], "up");
    }
}
