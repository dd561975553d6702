//! pulsecheck — anonymous wellbeing check-in intake and
//! re-classification service
//!
//! Devices submit a 5-question assessment; the service scores it,
//! classifies it into a severity band, and enforces one submission per
//! identity per calendar day. A background sweep re-reads cached
//! AI-derived themes and escalates severity when a crisis indicator
//! appears.

use axum::{
    routing::{delete, get, post},
    Router,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod cooldown;
pub mod db;
pub mod error;
pub mod identity;
pub mod models;
pub mod scoring;
pub mod services;

pub use config::Config;
pub use error::{Error, Result};

use services::ai_client::AiSummaryClient;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<Config>,
    pub ai: AiSummaryClient,
}

impl AppState {
    pub fn new(db: SqlitePool, config: Arc<Config>, ai: AiSummaryClient) -> Self {
        Self { db, config, ai }
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/identify", get(api::checkin::identify))
        .route("/api/checkin", post(api::checkin::submit))
        .route("/api/cooldown", get(api::checkin::cooldown))
        .route("/api/stats", get(api::stats::overview))
        .route("/api/chart/languages", get(api::stats::chart_languages))
        .route("/api/chart/severity", get(api::stats::chart_severity))
        .route("/api/chart/age-groups", get(api::stats::chart_age_groups))
        .route("/api/chart/weekly-trend", get(api::stats::chart_weekly_trend))
        .route("/api/meta/languages", get(api::stats::meta_languages))
        .route("/api/meta/age-groups", get(api::stats::meta_age_groups))
        .route("/api/identities", get(api::admin::list_identities))
        .route(
            "/api/identities/:id/submissions",
            get(api::admin::identity_submissions),
        )
        .route("/api/identities/:id", delete(api::admin::delete_identity))
        .merge(api::health::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
