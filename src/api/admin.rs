//! Admin-facing identity read paths
//!
//! Unknown identity ids are NOT_FOUND here, distinct from validation
//! failures on the intake path. The AI summary is fetched lazily and
//! degrades to a sentinel `ai_error` field when unavailable.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::{identities, submissions};
use crate::error::{Error, Result};
use crate::models::{AiSummary, Submission};
use crate::scoring;
use crate::services::intake::IdentityProfile;
use crate::AppState;

/// GET /api/identities
pub async fn list_identities(
    State(state): State<AppState>,
) -> Result<Json<Vec<identities::IdentityWithCount>>> {
    Ok(Json(identities::list_with_counts(&state.db).await?))
}

/// One answer with its survey wording attached
#[derive(Debug, Serialize)]
pub struct LabeledAnswer {
    pub question_key: String,
    pub question: &'static str,
    pub answer: i64,
    pub answer_text: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SubmissionDetail {
    pub id: String,
    pub responses: Vec<LabeledAnswer>,
    pub raw_score: i64,
    pub score: i64,
    pub severity: crate::models::Severity,
    pub category: &'static str,
    pub submitted_at: DateTime<Utc>,
}

impl SubmissionDetail {
    fn from_submission(submission: &Submission) -> Self {
        let parsed: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(&submission.answers).unwrap_or_default();

        let mut responses: Vec<LabeledAnswer> = parsed
            .iter()
            .map(|(key, value)| {
                let answer = value.as_i64().unwrap_or(-1);
                LabeledAnswer {
                    question_key: key.clone(),
                    question: scoring::question_label(key),
                    answer,
                    answer_text: scoring::option_label(answer),
                }
            })
            .collect();
        responses.sort_by(|a, b| a.question_key.cmp(&b.question_key));

        SubmissionDetail {
            id: submission.id.clone(),
            responses,
            raw_score: submission.raw_score,
            score: submission.score,
            severity: submission.severity,
            category: scoring::score_category(submission.score),
            submitted_at: submission.submitted_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IdentitySubmissionsResponse {
    pub identity: IdentityProfile,
    pub submissions: Vec<SubmissionDetail>,
    pub total: usize,
    pub ai_summary: Option<AiSummary>,
    /// Sentinel set when the collaborator was unavailable and no cache existed
    pub ai_error: Option<&'static str>,
}

/// GET /api/identities/:id/submissions
pub async fn identity_submissions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<IdentitySubmissionsResponse>> {
    let identity = identities::find_by_id(&state.db, &id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Identity {} not found", id)))?;

    let rows = submissions::list_for_identity(&state.db, &identity.id).await?;
    let details: Vec<SubmissionDetail> = rows.iter().map(SubmissionDetail::from_submission).collect();

    // Lazy enrichment; never fails the read.
    let ai_summary = state.ai.summary_with_cache(&state.db, &identity.id).await?;
    let ai_error = if ai_summary.is_none() {
        Some("AI summary unavailable")
    } else {
        None
    };

    Ok(Json(IdentitySubmissionsResponse {
        identity: IdentityProfile {
            id: identity.id.clone(),
            fingerprint: identity.fingerprint.clone(),
            language: identity.language,
            age_group: identity.age_group,
        },
        total: details.len(),
        submissions: details,
        ai_summary,
        ai_error,
    }))
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub id: String,
}

/// DELETE /api/identities/:id
///
/// Explicit administrative removal; submissions cascade.
pub async fn delete_identity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if !identities::delete(&state.db, &id).await? {
        return Err(Error::NotFound(format!("Identity {} not found", id)));
    }
    Ok(Json(DeleteResponse { deleted: true, id }))
}
