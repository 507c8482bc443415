//! Newsroom - a small news site with moderated comments

use anyhow::Result;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use newsroom::{
    api::{self, AppState},
    config::Config,
    db,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "newsroom=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Newsroom...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    pool.ping().await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    let applied = db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed ({} applied)", applied);

    let state = AppState::from_pool(pool.clone(), &config)?;
    tracing::info!(
        "Services ready: {} news on the home page, {} banned words",
        state.news_service.home_page_count(),
        state.comment_service.banned_words().words().len()
    );

    // Demo mode: sample news and a demo user
    #[cfg(feature = "demo")]
    seed_demo(&state).await?;

    // Expired session cleanup (runs every hour)
    {
        let user_service = state.user_service.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(3600));
            loop {
                interval.tick().await;
                match user_service.cleanup_expired_sessions().await {
                    Ok(0) => {}
                    Ok(n) => tracing::info!("Removed {} expired sessions", n),
                    Err(e) => tracing::warn!("Session cleanup failed: {}", e),
                }
            }
        });
    }

    // Build router
    let app = api::build_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Database connections closed");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down...");
}

#[cfg(feature = "demo")]
async fn seed_demo(state: &AppState) -> Result<()> {
    use chrono::{Duration, Utc};
    use newsroom::models::{CreateNewsInput, CreateUserInput};

    if state.user_service.get_by_username("demo").await?.is_none() {
        tracing::info!("Demo mode: Creating default user (demo/demo123)");
        state
            .user_service
            .signup(CreateUserInput::new("demo", "demo123"))
            .await?;
    }

    if state.news_service.count().await? == 0 {
        let today = Utc::now().date_naive();
        for i in 0..=i64::from(state.news_service.home_page_count()) {
            let input = CreateNewsInput::new(format!("Новость {}", i + 1), "Просто текст.")
                .with_date(today - Duration::days(i));
            state.news_service.create(input).await?;
        }
        tracing::info!("Demo mode: Sample news created");
    }

    Ok(())
}
