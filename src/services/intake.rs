//! Submission intake orchestration
//!
//! The submit path runs strictly in sequence: identity resolution,
//! cooldown check, profile reconciliation, scoring, persistence. The
//! fast-path cooldown read is advisory; the (identity_id, day_key)
//! uniqueness constraint is what actually holds under concurrent
//! submits, and a constraint violation is reported as a cooldown
//! rejection. No AI call happens here.

use crate::config::Config;
use crate::cooldown::{self, CooldownStatus};
use crate::db::{identities, submissions};
use crate::error::{Error, Result};
use crate::identity;
use crate::models::{AgeGroup, AssessmentAnswers, Identity, Language, Submission};
use crate::scoring;
use chrono::{DateTime, Duration, Local, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

/// Everything the intake path needs from one request
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub client_fingerprint: Option<String>,
    pub user_agent: String,
    pub network_address: String,
    pub accept_language: Option<String>,
    pub answers: AssessmentAnswers,
    pub language: Option<Language>,
    pub age_group: Option<AgeGroup>,
}

/// Caller-facing slice of the stored submission
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub id: String,
    pub raw_score: i64,
    pub score: i64,
    pub severity: crate::models::Severity,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    pub submission: SubmissionReceipt,
    /// Mean of this identity's scores over the trailing 7 days;
    /// informational only.
    pub rolling_average: Option<i64>,
    pub identity: IdentityProfile,
    pub cooldown: CooldownStatus,
    pub feedback: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct IdentityProfile {
    pub id: String,
    pub fingerprint: String,
    pub language: Option<Language>,
    pub age_group: Option<AgeGroup>,
}

impl IdentityProfile {
    fn from_identity(identity: &Identity) -> Self {
        IdentityProfile {
            id: identity.id.clone(),
            fingerprint: identity.fingerprint.clone(),
            language: identity.language,
            age_group: identity.age_group,
        }
    }
}

/// Identity resolution result for the identify endpoint
#[derive(Debug, Clone, Serialize)]
pub struct IdentifyOutcome {
    pub identity: IdentityProfile,
    pub is_new: bool,
    pub journey: Journey,
}

#[derive(Debug, Clone, Serialize)]
pub struct Journey {
    pub days_since_joined: i64,
    pub days_active: i64,
    pub total_submissions: i64,
    pub last_submission: Option<DateTime<Utc>>,
    pub checked_in_today: bool,
}

/// Resolve (or create) the identity for a request and report its
/// engagement journey.
pub async fn identify(
    pool: &SqlitePool,
    client_fingerprint: Option<&str>,
    user_agent: &str,
    accept_language: Option<&str>,
) -> Result<IdentifyOutcome> {
    let now = Utc::now();
    let fingerprint = identity::resolve_fingerprint(client_fingerprint, user_agent);
    let default_language = accept_language.and_then(Language::from_accept_language);

    let (identity, is_new) =
        identities::resolve_or_create(pool, &fingerprint, default_language, now).await?;

    let stats = submissions::engagement_stats(pool, &identity.id).await?;
    let checked_in_today =
        submissions::has_submission_on_day(pool, &identity.id, &cooldown::day_key(now)).await?;

    let days_since_joined = (now.with_timezone(&Local).date_naive()
        - identity.created_at.with_timezone(&Local).date_naive())
    .num_days();

    Ok(IdentifyOutcome {
        identity: IdentityProfile::from_identity(&identity),
        is_new,
        journey: Journey {
            days_since_joined,
            days_active: stats.days_active,
            total_submissions: stats.total_submissions,
            last_submission: stats.last_submission,
            checked_in_today,
        },
    })
}

/// Current cooldown standing for an identity.
///
/// Fails open: a transient read failure allows submission rather than
/// blocking users on infrastructure errors. The uniqueness constraint
/// still backstops correctness.
pub async fn cooldown_status(pool: &SqlitePool, identity_id: &str, now: DateTime<Utc>) -> CooldownStatus {
    match submissions::latest_for_identity(pool, identity_id).await {
        Ok(Some(latest)) if latest.day_key == cooldown::day_key(now) => {
            CooldownStatus::blocked(latest.submitted_at, now)
        }
        Ok(_) => CooldownStatus::allowed(),
        Err(e) => {
            warn!(
                "Cooldown lookup failed for {} (failing open): {}",
                identity_id, e
            );
            CooldownStatus::allowed()
        }
    }
}

/// The submit-assessment use case.
pub async fn submit_assessment(
    pool: &SqlitePool,
    config: &Config,
    request: SubmitRequest,
) -> Result<SubmitOutcome> {
    let now = Utc::now();

    // 1. Resolve or create identity; bumps last_seen_at.
    let fingerprint =
        identity::resolve_fingerprint(request.client_fingerprint.as_deref(), &request.user_agent);
    let default_language = request
        .accept_language
        .as_deref()
        .and_then(Language::from_accept_language);
    let (mut identity, _) =
        identities::resolve_or_create(pool, &fingerprint, default_language, now).await?;

    // 2. Cooldown fast path.
    let status = cooldown_status(pool, &identity.id, now).await;
    if !status.allowed {
        return Err(Error::CooldownActive {
            next_eligible_at: status
                .next_eligible_at
                .unwrap_or_else(|| cooldown::start_of_next_day(now)),
        });
    }

    // 3. Reconcile profile: request values win; stored values fill the
    //    gaps; both absent is a rejection.
    let language = request
        .language
        .or(identity.language)
        .ok_or(Error::IncompleteProfile)?;
    let age_group = request
        .age_group
        .or(identity.age_group)
        .ok_or(Error::IncompleteProfile)?;

    if identity.language != Some(language) || identity.age_group != Some(age_group) {
        identities::update_profile(pool, &identity.id, language, age_group).await?;
        identity.language = Some(language);
        identity.age_group = Some(age_group);
    }

    // 4. Validate and score.
    let breakdown = scoring::score_answers(&request.answers)?;

    // 5. Persist. The raw network address is hashed, never stored.
    let answers_json = serde_json::to_string(&request.answers)
        .map_err(|e| Error::Internal(format!("Failed to encode answers: {}", e)))?;

    let submission = Submission {
        id: Uuid::new_v4().to_string(),
        identity_id: identity.id.clone(),
        ip_hash: identity::hash_network_address(&request.network_address, &config.ip_hash_salt),
        answers: answers_json,
        raw_score: breakdown.raw_score,
        score: breakdown.score,
        severity: breakdown.severity,
        language,
        age_group,
        submitted_at: now,
        day_key: cooldown::day_key(now),
    };

    if let Err(e) = submissions::insert(pool, &submission).await {
        // A concurrent submit for the same identity won the day; report
        // it as the cooldown it is, not as a server failure.
        if submissions::is_unique_violation(&e) {
            return Err(Error::CooldownActive {
                next_eligible_at: cooldown::start_of_next_day(now),
            });
        }
        return Err(e);
    }

    info!(
        "Submission {} recorded for identity {} (score {}, {:?})",
        submission.id, identity.id, submission.score, submission.severity
    );

    // 6. Contextual feedback: trailing-7-day rolling average.
    let rolling_average =
        submissions::rolling_average(pool, &identity.id, now - Duration::days(7)).await?;

    // 7. Report when the caller may submit next.
    let cooldown = cooldown_status(pool, &identity.id, now).await;

    Ok(SubmitOutcome {
        submission: SubmissionReceipt {
            id: submission.id,
            raw_score: submission.raw_score,
            score: submission.score,
            severity: submission.severity,
            submitted_at: submission.submitted_at,
        },
        rolling_average,
        identity: IdentityProfile::from_identity(&identity),
        cooldown,
        feedback: scoring::score_feedback(breakdown.score),
    })
}
