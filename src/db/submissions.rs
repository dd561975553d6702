//! Submission repository
//!
//! Submissions are immutable after insert except for `severity`, which
//! only the escalation sweep rewrites through `escalate_severity`.

use crate::error::{Error, Result};
use crate::models::{AgeGroup, Language, Severity, Submission};
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

/// Optional filters for aggregate queries
#[derive(Debug, Clone, Default)]
pub struct SubmissionQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub language: Option<Language>,
    pub age_group: Option<AgeGroup>,
    pub severity: Option<Severity>,
    pub min_score: Option<i64>,
    pub max_score: Option<i64>,
}

/// Slim row for aggregate computation
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScoreRow {
    pub identity_id: String,
    pub score: i64,
    pub submitted_at: DateTime<Utc>,
}

pub async fn insert(pool: &SqlitePool, submission: &Submission) -> Result<()> {
    sqlx::query(
        "INSERT INTO submissions
            (id, identity_id, ip_hash, answers, raw_score, score, severity,
             language, age_group, submitted_at, day_key)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&submission.id)
    .bind(&submission.identity_id)
    .bind(&submission.ip_hash)
    .bind(&submission.answers)
    .bind(submission.raw_score)
    .bind(submission.score)
    .bind(submission.severity)
    .bind(submission.language)
    .bind(submission.age_group)
    .bind(submission.submitted_at)
    .bind(&submission.day_key)
    .execute(pool)
    .await?;
    Ok(())
}

/// True when an error is the (identity_id, day_key) uniqueness constraint
/// firing; callers report it as a cooldown rejection, not a failure.
pub fn is_unique_violation(err: &Error) -> bool {
    matches!(
        err,
        Error::Database(sqlx::Error::Database(db)) if db.is_unique_violation()
    )
}

pub async fn latest_for_identity(
    pool: &SqlitePool,
    identity_id: &str,
) -> Result<Option<Submission>> {
    let row = sqlx::query_as::<_, Submission>(
        "SELECT * FROM submissions WHERE identity_id = ?
         ORDER BY submitted_at DESC LIMIT 1",
    )
    .bind(identity_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn list_for_identity(pool: &SqlitePool, identity_id: &str) -> Result<Vec<Submission>> {
    let rows = sqlx::query_as::<_, Submission>(
        "SELECT * FROM submissions WHERE identity_id = ? ORDER BY submitted_at DESC",
    )
    .bind(identity_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Rounded mean score of one identity's submissions since `since`,
/// or None when there are none.
pub async fn rolling_average(
    pool: &SqlitePool,
    identity_id: &str,
    since: DateTime<Utc>,
) -> Result<Option<i64>> {
    let avg: Option<f64> = sqlx::query_scalar(
        "SELECT AVG(score) FROM submissions WHERE identity_id = ? AND submitted_at >= ?",
    )
    .bind(identity_id)
    .bind(since)
    .fetch_one(pool)
    .await?;
    Ok(avg.map(|a| a.round() as i64))
}

/// Engagement counters for the identify endpoint
#[derive(Debug, Clone, serde::Serialize)]
pub struct EngagementStats {
    pub total_submissions: i64,
    /// Distinct local calendar days with at least one submission
    pub days_active: i64,
    pub last_submission: Option<DateTime<Utc>>,
}

pub async fn engagement_stats(pool: &SqlitePool, identity_id: &str) -> Result<EngagementStats> {
    let (total, days_active): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(DISTINCT day_key) FROM submissions WHERE identity_id = ?",
    )
    .bind(identity_id)
    .fetch_one(pool)
    .await?;

    let last_submission: Option<DateTime<Utc>> = sqlx::query_scalar(
        "SELECT MAX(submitted_at) FROM submissions WHERE identity_id = ?",
    )
    .bind(identity_id)
    .fetch_one(pool)
    .await?;

    Ok(EngagementStats {
        total_submissions: total,
        days_active,
        last_submission,
    })
}

/// True when the identity already has a submission on the given day
pub async fn has_submission_on_day(
    pool: &SqlitePool,
    identity_id: &str,
    day_key: &str,
) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM submissions WHERE identity_id = ? AND day_key = ?")
            .bind(identity_id)
            .bind(day_key)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

/// (average score, count) grouped by language; absent languages are not
/// listed here, the aggregator fills zero defaults.
pub async fn stats_by_language(pool: &SqlitePool) -> Result<Vec<(Language, f64, i64)>> {
    let rows = sqlx::query_as::<_, (Language, f64, i64)>(
        "SELECT language, AVG(score), COUNT(*) FROM submissions GROUP BY language",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn stats_by_severity(pool: &SqlitePool) -> Result<Vec<(Severity, i64)>> {
    let rows = sqlx::query_as::<_, (Severity, i64)>(
        "SELECT severity, COUNT(*) FROM submissions GROUP BY severity",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn stats_by_age_group(pool: &SqlitePool) -> Result<Vec<(AgeGroup, f64, i64)>> {
    let rows = sqlx::query_as::<_, (AgeGroup, f64, i64)>(
        "SELECT age_group, AVG(score), COUNT(*) FROM submissions GROUP BY age_group",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Scores in [from, to], ascending, for trend windows
pub async fn scores_between(
    pool: &SqlitePool,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<ScoreRow>> {
    let rows = sqlx::query_as::<_, ScoreRow>(
        "SELECT identity_id, score, submitted_at FROM submissions
         WHERE submitted_at >= ? AND submitted_at <= ?
         ORDER BY submitted_at ASC",
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Filtered score rows for the stats overview
pub async fn query_scores(pool: &SqlitePool, query: &SubmissionQuery) -> Result<Vec<ScoreRow>> {
    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT identity_id, score, submitted_at FROM submissions WHERE 1=1");

    if let Some(from) = query.from {
        builder.push(" AND submitted_at >= ").push_bind(from);
    }
    if let Some(to) = query.to {
        builder.push(" AND submitted_at <= ").push_bind(to);
    }
    if let Some(language) = query.language {
        builder.push(" AND language = ").push_bind(language);
    }
    if let Some(age_group) = query.age_group {
        builder.push(" AND age_group = ").push_bind(age_group);
    }
    if let Some(severity) = query.severity {
        builder.push(" AND severity = ").push_bind(severity);
    }
    if let Some(min) = query.min_score {
        builder.push(" AND score >= ").push_bind(min);
    }
    if let Some(max) = query.max_score {
        builder.push(" AND score <= ").push_bind(max);
    }
    builder.push(" ORDER BY submitted_at DESC");

    let rows = builder
        .build_query_as::<ScoreRow>()
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// The sweep's single sanctioned mutation: raise a submission to the
/// given severity unless it is already there. Idempotent.
pub async fn escalate_severity(
    pool: &SqlitePool,
    submission_id: &str,
    severity: Severity,
) -> Result<bool> {
    let result = sqlx::query("UPDATE submissions SET severity = ? WHERE id = ? AND severity != ?")
        .bind(severity)
        .bind(submission_id)
        .bind(severity)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
