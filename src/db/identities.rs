//! Identity repository

use crate::error::{Error, Result};
use crate::models::{AgeGroup, Identity, Language};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Identity row plus its submission count, for admin listings
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct IdentityWithCount {
    pub id: String,
    pub fingerprint: String,
    pub language: Option<Language>,
    pub age_group: Option<AgeGroup>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub submission_count: i64,
}

pub async fn find_by_fingerprint(pool: &SqlitePool, fingerprint: &str) -> Result<Option<Identity>> {
    let identity = sqlx::query_as::<_, Identity>(
        "SELECT id, fingerprint, language, age_group, created_at, last_seen_at
         FROM identities WHERE fingerprint = ?",
    )
    .bind(fingerprint)
    .fetch_optional(pool)
    .await?;
    Ok(identity)
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Identity>> {
    let identity = sqlx::query_as::<_, Identity>(
        "SELECT id, fingerprint, language, age_group, created_at, last_seen_at
         FROM identities WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(identity)
}

/// Find the identity for a fingerprint, creating it on first contact.
/// Existing identities get `last_seen_at` bumped; a default language is
/// applied only when the stored one is absent.
pub async fn resolve_or_create(
    pool: &SqlitePool,
    fingerprint: &str,
    default_language: Option<Language>,
    now: DateTime<Utc>,
) -> Result<(Identity, bool)> {
    if let Some(existing) = find_by_fingerprint(pool, fingerprint).await? {
        sqlx::query("UPDATE identities SET last_seen_at = ? WHERE id = ?")
            .bind(now)
            .bind(&existing.id)
            .execute(pool)
            .await?;

        let mut identity = existing;
        identity.last_seen_at = now;

        if identity.language.is_none() {
            if let Some(lang) = default_language {
                sqlx::query("UPDATE identities SET language = ? WHERE id = ?")
                    .bind(lang)
                    .bind(&identity.id)
                    .execute(pool)
                    .await?;
                identity.language = Some(lang);
            }
        }

        return Ok((identity, false));
    }

    let identity = Identity {
        id: Uuid::new_v4().to_string(),
        fingerprint: fingerprint.to_string(),
        language: default_language,
        age_group: None,
        created_at: now,
        last_seen_at: now,
    };

    // ON CONFLICT DO NOTHING: two first-contact requests can race here,
    // and the loser must adopt the winner's row instead of erroring.
    let result = sqlx::query(
        "INSERT INTO identities (id, fingerprint, language, age_group, created_at, last_seen_at)
         VALUES (?, ?, ?, ?, ?, ?)
         ON CONFLICT(fingerprint) DO NOTHING",
    )
    .bind(&identity.id)
    .bind(&identity.fingerprint)
    .bind(identity.language)
    .bind(identity.age_group)
    .bind(identity.created_at)
    .bind(identity.last_seen_at)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        let existing = find_by_fingerprint(pool, fingerprint).await?.ok_or_else(|| {
            Error::Internal(format!(
                "Identity insert raced but no row found for fingerprint {}",
                fingerprint
            ))
        })?;
        return Ok((existing, false));
    }

    Ok((identity, true))
}

/// Persist reconciled profile fields
pub async fn update_profile(
    pool: &SqlitePool,
    id: &str,
    language: Language,
    age_group: AgeGroup,
) -> Result<()> {
    sqlx::query("UPDATE identities SET language = ?, age_group = ? WHERE id = ?")
        .bind(language)
        .bind(age_group)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn list_with_counts(pool: &SqlitePool) -> Result<Vec<IdentityWithCount>> {
    let rows = sqlx::query_as::<_, IdentityWithCount>(
        "SELECT i.id, i.fingerprint, i.language, i.age_group, i.created_at, i.last_seen_at,
                COUNT(s.id) AS submission_count
         FROM identities i
         LEFT JOIN submissions s ON s.identity_id = i.id
         GROUP BY i.id
         ORDER BY i.created_at DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Administrative removal; submissions cascade via the foreign key.
/// Returns false when the identity did not exist.
pub async fn delete(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM identities WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
