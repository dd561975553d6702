//! pulsecheck service binary

use anyhow::Result;
use clap::Parser;
use pulsecheck::services::ai_client::AiSummaryClient;
use pulsecheck::services::theme_sweep::ThemeSweep;
use pulsecheck::{build_router, db, AppState, Config};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Startup fails here if the AI collaborator URL is missing.
    let config = Arc::new(Config::parse());

    info!("Starting pulsecheck v{}", env!("CARGO_PKG_VERSION"));
    info!("Database path: {}", config.database.display());

    let pool = db::init_database(&config.database).await?;

    let ai = AiSummaryClient::new(&config.ai_summary_url, config.ai_timeout())?;

    // Escalation sweep runs on its own timer, sharing only the pool.
    let sweep = Arc::new(ThemeSweep::new(
        pool.clone(),
        config.crisis_theme.clone(),
        config.sweep_interval(),
    ));
    sweep.run();

    let state = AppState::new(pool, config.clone(), ai);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!("pulsecheck listening on http://{}", config.bind);

    axum::serve(listener, app).await?;

    Ok(())
}
