//! AI summary cache repository
//!
//! The collaborator owns this data; we only cache its latest output per
//! identity. The escalation sweep reads exclusively from this cache.

use crate::error::Result;
use crate::models::AiSummary;
use sqlx::SqlitePool;

pub async fn upsert(pool: &SqlitePool, summary: &AiSummary) -> Result<()> {
    sqlx::query(
        "INSERT INTO ai_summaries (identity_id, summary, themes, generated_at)
         VALUES (?, ?, ?, ?)
         ON CONFLICT(identity_id) DO UPDATE SET
            summary = excluded.summary,
            themes = excluded.themes,
            generated_at = excluded.generated_at",
    )
    .bind(&summary.identity_id)
    .bind(&summary.summary)
    .bind(&summary.themes)
    .bind(summary.generated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_identity(pool: &SqlitePool, identity_id: &str) -> Result<Option<AiSummary>> {
    let row = sqlx::query_as::<_, AiSummary>(
        "SELECT identity_id, summary, themes, generated_at FROM ai_summaries WHERE identity_id = ?",
    )
    .bind(identity_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Distinct identities whose cached theme set contains an exact match
/// for `theme`. Themes are a JSON array column; json_each unnests it.
pub async fn identities_with_theme(pool: &SqlitePool, theme: &str) -> Result<Vec<String>> {
    let ids: Vec<String> = sqlx::query_scalar(
        "SELECT DISTINCT s.identity_id
         FROM ai_summaries s, json_each(s.themes)
         WHERE json_each.value = ?",
    )
    .bind(theme)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}
