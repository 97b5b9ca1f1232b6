//! MedTimes - content submission and KoL interview booking backend

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use medtimes::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{SqlxArticleRepository, SqlxInterviewRepository},
    },
    services::{ArticleService, ImageStore, InterviewService, Mailer, StripeGateway},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "medtimes=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting MedTimes backend...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Create repositories
    let article_repo = Arc::new(SqlxArticleRepository::new(pool.clone()));
    let interview_repo = Arc::new(SqlxInterviewRepository::new(pool.clone()));

    // Optional mailer; submissions go through without it
    let mailer = match Mailer::from_config(&config.email) {
        Some(Ok(mailer)) => {
            tracing::info!("Email configured: {}", config.email.smtp_host);
            Some(Arc::new(mailer))
        }
        Some(Err(e)) => {
            tracing::warn!("Email configuration invalid, notifications disabled: {}", e);
            None
        }
        None => {
            tracing::warn!("Email not configured, notifications disabled");
            None
        }
    };

    // Optional Stripe gateway; checkout endpoints degrade without it
    let payments = match StripeGateway::from_config(&config.stripe) {
        Some(gateway) => {
            if config.stripe.webhook_secret.is_none() {
                tracing::warn!("Stripe webhook secret missing, callbacks will be rejected");
            }
            tracing::info!("Stripe checkout configured");
            Some(Arc::new(gateway))
        }
        None => {
            tracing::warn!("Stripe not configured, checkout endpoints disabled");
            None
        }
    };

    if config.admin.token.is_none() {
        tracing::warn!("Admin token not configured, review endpoints disabled");
    }

    // Initialize services
    let mut article_service = ArticleService::new(article_repo.clone(), interview_repo.clone());
    let mut interview_service = InterviewService::new(interview_repo, article_repo);
    if let Some(ref mailer) = mailer {
        article_service = article_service.with_mailer(mailer.clone());
        interview_service = interview_service.with_mailer(mailer.clone());
    }

    let image_store = ImageStore::new(config.upload.clone(), config.image_host.clone());
    if config.image_host.is_configured() {
        tracing::info!("Remote image host configured");
    } else {
        tracing::info!("Storing uploads on local disk: {:?}", config.upload.path);
    }

    // Build application state
    let state = AppState {
        pool: pool.clone(),
        article_service: Arc::new(article_service),
        interview_service: Arc::new(interview_service),
        payments,
        image_store: Arc::new(image_store),
        admin_token: config.admin.token.clone(),
        base_url: config.server.base_url.clone(),
    };

    // Build router
    let app = api::build_router(state, &config.server.cors_origin, &config.upload.path);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
