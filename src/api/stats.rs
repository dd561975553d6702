//! Statistics and chart endpoints
//!
//! All aggregates are total-inclusive: enumerated dimensions always
//! list every value, with zeros where there is no data.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{AgeGroup, Language};
use crate::services::stats::{
    self, AgeGroupDistribution, LanguageDistribution, SeverityStat, StatsFilter, StatsOverview,
    WeeklyTrend,
};
use crate::AppState;

/// GET /api/stats
pub async fn overview(
    State(state): State<AppState>,
    Query(filter): Query<StatsFilter>,
) -> Result<Json<StatsOverview>> {
    let overview = stats::overview(&state.db, &state.ai, &state.config, &filter).await?;
    Ok(Json(overview))
}

/// GET /api/chart/languages
pub async fn chart_languages(State(state): State<AppState>) -> Result<Json<LanguageDistribution>> {
    Ok(Json(stats::distribution_by_language(&state.db).await?))
}

/// GET /api/chart/severity
pub async fn chart_severity(State(state): State<AppState>) -> Result<Json<Vec<SeverityStat>>> {
    Ok(Json(stats::distribution_by_severity(&state.db).await?))
}

/// GET /api/chart/age-groups
pub async fn chart_age_groups(State(state): State<AppState>) -> Result<Json<AgeGroupDistribution>> {
    Ok(Json(stats::distribution_by_age_group(&state.db).await?))
}

#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    #[serde(default = "default_weeks")]
    pub weeks: i64,
}

fn default_weeks() -> i64 {
    8
}

/// GET /api/chart/weekly-trend?weeks=N
pub async fn chart_weekly_trend(
    State(state): State<AppState>,
    Query(query): Query<TrendQuery>,
) -> Result<Json<WeeklyTrend>> {
    Ok(Json(stats::weekly_trend(&state.db, query.weeks).await?))
}

#[derive(Debug, Serialize)]
pub struct CatalogEntry {
    pub code: &'static str,
    pub name: &'static str,
}

/// GET /api/meta/languages
pub async fn meta_languages() -> Json<Vec<CatalogEntry>> {
    Json(
        Language::ALL
            .iter()
            .map(|l| CatalogEntry {
                code: l.as_str(),
                name: l.display_name(),
            })
            .collect(),
    )
}

/// GET /api/meta/age-groups
pub async fn meta_age_groups() -> Json<Vec<CatalogEntry>> {
    Json(
        AgeGroup::ALL
            .iter()
            .map(|g| CatalogEntry {
                code: g.as_str(),
                name: g.display_name(),
            })
            .collect(),
    )
}
