use std::sync::Arc;

mod app;
mod auth;
mod bootcamps;
mod config;
mod db;
mod error;
mod mail;
mod response;
mod reviews;
mod state;
#[cfg(test)]
mod testing;

use crate::{config::AppConfig, state::AppState};

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "devcamper=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Arc::new(AppConfig::from_env()?);
    let pool = db::connect(&config.database_url).await?;
    db::migrate(&pool).await?;

    if !config.smtp.is_configured() {
        tracing::warn!("SMTP not configured; password reset emails will fail");
    }

    let state = AppState::from_pool(pool, config);
    app::serve(app::build_app(state)).await
}
