//! Intake endpoints: identify, submit, cooldown status

use axum::{
    extract::State,
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::api::client_signals;
use crate::cooldown::CooldownStatus;
use crate::db::identities;
use crate::error::Result;
use crate::identity;
use crate::models::{AgeGroup, AssessmentAnswers, Language};
use crate::services::intake::{self, IdentifyOutcome, SubmitOutcome, SubmitRequest};
use crate::AppState;

/// POST /api/checkin request body
#[derive(Debug, Deserialize)]
pub struct CheckinBody {
    pub answers: AssessmentAnswers,
    pub language: Option<Language>,
    pub age_group: Option<AgeGroup>,
}

/// GET /api/identify
///
/// Resolves (creating on first contact) the anonymous identity for the
/// device behind this request and reports its engagement journey.
pub async fn identify(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<IdentifyOutcome>> {
    let signals = client_signals(&headers);
    let outcome = intake::identify(
        &state.db,
        signals.fingerprint.as_deref(),
        &signals.user_agent,
        signals.accept_language.as_deref(),
    )
    .await?;
    Ok(Json(outcome))
}

/// POST /api/checkin
pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CheckinBody>,
) -> Result<Json<SubmitOutcome>> {
    let signals = client_signals(&headers);

    let outcome = intake::submit_assessment(
        &state.db,
        &state.config,
        SubmitRequest {
            client_fingerprint: signals.fingerprint,
            user_agent: signals.user_agent,
            network_address: signals.network_address,
            accept_language: signals.accept_language,
            answers: body.answers,
            language: body.language,
            age_group: body.age_group,
        },
    )
    .await?;

    Ok(Json(outcome))
}

/// GET /api/cooldown
///
/// Cooldown standing for the resolved identity. A device that has never
/// submitted (or never been seen) is simply allowed.
pub async fn cooldown(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CooldownStatus>> {
    let signals = client_signals(&headers);
    let fingerprint =
        identity::resolve_fingerprint(signals.fingerprint.as_deref(), &signals.user_agent);

    let status = match identities::find_by_fingerprint(&state.db, &fingerprint).await? {
        Some(identity) => intake::cooldown_status(&state.db, &identity.id, Utc::now()).await,
        None => CooldownStatus::allowed(),
    };

    Ok(Json(status))
}
