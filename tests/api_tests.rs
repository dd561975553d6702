//! Integration tests for the HTTP surface
//!
//! Each test builds the full router over a fresh in-memory database and
//! drives it with `tower::ServiceExt::oneshot`. The AI collaborator URL
//! points at an unroutable endpoint, so every AI lookup exercises the
//! degraded path.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tower::util::ServiceExt;

use pulsecheck::services::ai_client::AiSummaryClient;
use pulsecheck::{build_router, db, AppState, Config};

const ANDROID_UA: &str =
    "Mozilla/5.0 (Linux; Android 13; Pixel 7) AppleWebKit/537.36 Mobile Safari/537.36";
const WINDOWS_UA: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/120.0 Safari/537.36";

fn test_config() -> Config {
    Config {
        bind: "127.0.0.1:0".to_string(),
        database: PathBuf::from(":memory:"),
        // Unroutable: connection refused immediately, AI always degrades
        ai_summary_url: "http://127.0.0.1:9/summaries".to_string(),
        ai_timeout_secs: 1,
        ip_hash_salt: "test-salt".to_string(),
        crisis_theme: "Onveiligheidsgevoel".to_string(),
        sweep_interval_secs: 60,
        theme_fanout: 4,
    }
}

async fn setup_app() -> (axum::Router, AppState) {
    let pool = db::init_memory_database().await.expect("in-memory db");
    let config = Arc::new(test_config());
    let ai = AiSummaryClient::new(&config.ai_summary_url, config.ai_timeout()).expect("ai client");
    let state = AppState::new(pool, config, ai);
    (build_router(state.clone()), state)
}

fn get(uri: &str, user_agent: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("user-agent", user_agent)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, user_agent: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("user-agent", user_agent)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

fn checkin_body() -> Value {
    json!({
        "answers": {
            "question1": 3,
            "question2": 3,
            "question3": 2,
            "question4": 3,
            "question5": 3
        },
        "language": "ENGLISH",
        "age_group": "AGE_26_40"
    })
}

// ===========================================================================
// Health

#[tokio::test]
async fn health_endpoint_reports_module() {
    let (app, _) = setup_app().await;

    let response = app.oneshot(get("/health", ANDROID_UA)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "pulsecheck");
}

// ===========================================================================
// Identify

#[tokio::test]
async fn identify_creates_identity_with_empty_journey() {
    let (app, _) = setup_app().await;

    let response = app.oneshot(get("/api/identify", ANDROID_UA)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["is_new"], true);
    assert_eq!(body["journey"]["total_submissions"], 0);
    assert_eq!(body["journey"]["days_active"], 0);
    assert_eq!(body["journey"]["checked_in_today"], false);
    assert_eq!(body["identity"]["fingerprint"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn identify_twice_resolves_same_identity() {
    let (app, _) = setup_app().await;

    let first = app
        .clone()
        .oneshot(get("/api/identify", ANDROID_UA))
        .await
        .unwrap();
    let first_body = extract_json(first.into_body()).await;

    let second = app.oneshot(get("/api/identify", ANDROID_UA)).await.unwrap();
    let second_body = extract_json(second.into_body()).await;

    assert_eq!(second_body["is_new"], false);
    assert_eq!(first_body["identity"]["id"], second_body["identity"]["id"]);
}

#[tokio::test]
async fn identify_uses_accept_language_default() {
    let (app, _) = setup_app().await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/identify")
        .header("user-agent", ANDROID_UA)
        .header("accept-language", "nl-NL,nl;q=0.9")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["identity"]["language"], "NEDERLANDS");
}

// ===========================================================================
// Submit

#[tokio::test]
async fn submit_scores_and_classifies() {
    let (app, _) = setup_app().await;

    let response = app
        .oneshot(post_json("/api/checkin", ANDROID_UA, checkin_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["submission"]["raw_score"], 14);
    assert_eq!(body["submission"]["score"], 56);
    assert_eq!(body["submission"]["severity"], "ORANGE");
    // First submission: rolling average equals its own score
    assert_eq!(body["rolling_average"], 56);
    assert_eq!(body["cooldown"]["allowed"], false);
    assert!(body["cooldown"]["next_eligible_at"].is_string());
}

#[tokio::test]
async fn second_submit_same_day_is_cooldown_conflict() {
    let (app, state) = setup_app().await;

    let first = app
        .clone()
        .oneshot(post_json("/api/checkin", ANDROID_UA, checkin_body()))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(post_json("/api/checkin", ANDROID_UA, checkin_body()))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let body = extract_json(second.into_body()).await;
    assert_eq!(body["error"]["code"], "SUBMISSION_COOLDOWN");
    assert!(body["error"]["next_eligible_at"].is_string());

    // Submission count unchanged by the rejected attempt
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM submissions")
        .fetch_one(&state.db)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn concurrent_submits_persist_exactly_one() {
    let (app, state) = setup_app().await;

    let (a, b) = tokio::join!(
        app.clone()
            .oneshot(post_json("/api/checkin", ANDROID_UA, checkin_body())),
        app.clone()
            .oneshot(post_json("/api/checkin", ANDROID_UA, checkin_body())),
    );

    let statuses = [a.unwrap().status(), b.unwrap().status()];
    let ok = statuses.iter().filter(|s| **s == StatusCode::OK).count();
    let conflict = statuses
        .iter()
        .filter(|s| **s == StatusCode::CONFLICT)
        .count();
    assert_eq!(ok, 1, "exactly one submit must win the day");
    assert_eq!(conflict, 1);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM submissions")
        .fetch_one(&state.db)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn out_of_range_answer_is_rejected() {
    let (app, _) = setup_app().await;

    let body = json!({
        "answers": {
            "question1": 6,
            "question2": 0,
            "question3": 0,
            "question4": 0,
            "question5": 0
        },
        "language": "ENGLISH",
        "age_group": "AGE_18_25"
    });

    let response = app
        .oneshot(post_json("/api/checkin", ANDROID_UA, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "INVALID_RESPONSES");
}

#[tokio::test]
async fn missing_profile_is_rejected_until_provided() {
    let (app, _) = setup_app().await;

    // No language/age_group in the body, none stored on the identity,
    // and no Accept-Language to fall back on.
    let body = json!({
        "answers": {
            "question1": 1, "question2": 1, "question3": 1,
            "question4": 1, "question5": 1
        }
    });

    let response = app
        .clone()
        .oneshot(post_json("/api/checkin", ANDROID_UA, body.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let parsed = extract_json(response.into_body()).await;
    assert_eq!(parsed["error"]["code"], "INCOMPLETE_PROFILE");

    // With a full profile the same answers go through.
    let response = app
        .oneshot(post_json("/api/checkin", ANDROID_UA, checkin_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn stored_profile_fills_missing_request_fields() {
    let (app, _) = setup_app().await;

    // First submit stores the profile.
    let first = app
        .clone()
        .oneshot(post_json("/api/checkin", WINDOWS_UA, checkin_body()))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let first_body = extract_json(first.into_body()).await;
    let fingerprint = first_body["identity"]["fingerprint"].as_str().unwrap();

    // Next day cannot be simulated here, so exercise the reconciliation
    // path through the cooldown rejection: the request without profile
    // fields must fail on cooldown (i.e. it got past profile checks).
    let body = json!({
        "answers": {
            "question1": 2, "question2": 2, "question3": 2,
            "question4": 2, "question5": 2
        }
    });
    let request = Request::builder()
        .method("POST")
        .uri("/api/checkin")
        .header("user-agent", WINDOWS_UA)
        .header("x-device-id", fingerprint)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// ===========================================================================
// Cooldown endpoint

#[tokio::test]
async fn cooldown_allows_unseen_device() {
    let (app, _) = setup_app().await;

    let response = app.oneshot(get("/api/cooldown", WINDOWS_UA)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["allowed"], true);
}

#[tokio::test]
async fn cooldown_blocks_after_submit() {
    let (app, _) = setup_app().await;

    app.clone()
        .oneshot(post_json("/api/checkin", ANDROID_UA, checkin_body()))
        .await
        .unwrap();

    let response = app.oneshot(get("/api/cooldown", ANDROID_UA)).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["allowed"], false);
    assert!(body["next_eligible_at"].is_string());
    assert!(body["last_submission_at"].is_string());
}

// ===========================================================================
// Charts: total-inclusive zero defaults

#[tokio::test]
async fn chart_languages_lists_all_languages_on_empty_db() {
    let (app, _) = setup_app().await;

    let response = app
        .oneshot(get("/api/chart/languages", ANDROID_UA))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;

    assert_eq!(body["total_languages"], 11);
    let languages = body["languages"].as_array().unwrap();
    assert_eq!(languages.len(), 11);
    for lang in languages {
        assert_eq!(lang["submissions"], 0);
        assert_eq!(lang["average_score"], 0);
    }
}

#[tokio::test]
async fn chart_severity_lists_all_bands_with_percentages() {
    let (app, _) = setup_app().await;

    // Empty first: all zero.
    let response = app
        .clone()
        .oneshot(get("/api/chart/severity", ANDROID_UA))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    let bands = body.as_array().unwrap();
    assert_eq!(bands.len(), 3);
    for band in bands {
        assert_eq!(band["submissions"], 0);
        assert_eq!(band["percentage"], 0);
    }

    // One ORANGE submission: 100% in one band, zeroes elsewhere.
    app.clone()
        .oneshot(post_json("/api/checkin", ANDROID_UA, checkin_body()))
        .await
        .unwrap();

    let response = app
        .oneshot(get("/api/chart/severity", ANDROID_UA))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    let bands = body.as_array().unwrap();
    assert_eq!(bands.len(), 3);

    let orange = bands.iter().find(|b| b["severity"] == "ORANGE").unwrap();
    assert_eq!(orange["submissions"], 1);
    assert_eq!(orange["percentage"], 100);
    let red = bands.iter().find(|b| b["severity"] == "RED").unwrap();
    assert_eq!(red["submissions"], 0);
}

#[tokio::test]
async fn chart_age_groups_lists_all_groups() {
    let (app, _) = setup_app().await;

    let response = app
        .oneshot(get("/api/chart/age-groups", ANDROID_UA))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total_age_groups"], 5);
    assert_eq!(body["age_groups"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn weekly_trend_empty_dataset_reports_no_data() {
    let (app, _) = setup_app().await;

    let response = app
        .oneshot(get("/api/chart/weekly-trend?weeks=4", ANDROID_UA))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;

    assert_eq!(body["summary"]["trend"], "no_data");
    assert_eq!(body["summary"]["total_submissions"], 0);
    assert!(body["weeks"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn weekly_trend_includes_empty_weeks_in_window() {
    let (app, _) = setup_app().await;

    app.clone()
        .oneshot(post_json("/api/checkin", ANDROID_UA, checkin_body()))
        .await
        .unwrap();

    let response = app
        .oneshot(get("/api/chart/weekly-trend?weeks=4", ANDROID_UA))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;

    let weeks = body["weeks"].as_array().unwrap();
    assert_eq!(weeks.len(), 4);
    let with_data: Vec<_> = weeks.iter().filter(|w| w["submissions"] == 1).collect();
    assert_eq!(with_data.len(), 1);
    assert_eq!(with_data[0]["average_score"], 56);
    // A single populated week cannot call a direction
    assert_eq!(body["summary"]["trend"], "no_data");
}

// ===========================================================================
// Stats overview

#[tokio::test]
async fn stats_overview_empty_dataset_is_all_zeroes() {
    let (app, _) = setup_app().await;

    let response = app.oneshot(get("/api/stats", ANDROID_UA)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total"], 0);
    assert_eq!(body["average_score"], 0);
    assert_eq!(body["low_wellbeing_percentage"], 0);
    assert!(body["themes"]["top_themes"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn stats_overview_reports_filtered_window() {
    let (app, _) = setup_app().await;

    app.clone()
        .oneshot(post_json("/api/checkin", ANDROID_UA, checkin_body()))
        .await
        .unwrap();

    let response = app
        .oneshot(get("/api/stats?date_range=last_7_days", ANDROID_UA))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;

    assert_eq!(body["total"], 1);
    assert_eq!(body["average_score"], 56);
    // 56 >= 50, so nothing in the low band
    assert_eq!(body["low_wellbeing_percentage"], 0);
    // No data in the preceding window
    assert_eq!(body["total_change_percent"], 0);
}

#[tokio::test]
async fn stats_overview_filters_by_language() {
    let (app, _) = setup_app().await;

    app.clone()
        .oneshot(post_json("/api/checkin", ANDROID_UA, checkin_body()))
        .await
        .unwrap();

    let response = app
        .oneshot(get("/api/stats?language=ARABIC", ANDROID_UA))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total"], 0);
}

// ===========================================================================
// Admin paths

#[tokio::test]
async fn unknown_identity_is_not_found() {
    let (app, _) = setup_app().await;

    let response = app
        .oneshot(get("/api/identities/no-such-id/submissions", ANDROID_UA))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn identity_submissions_degrade_without_ai() {
    let (app, _) = setup_app().await;

    let submit = app
        .clone()
        .oneshot(post_json("/api/checkin", ANDROID_UA, checkin_body()))
        .await
        .unwrap();
    let submitted = extract_json(submit.into_body()).await;
    let identity_id = submitted["identity"]["id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(get(
            &format!("/api/identities/{}/submissions", identity_id),
            ANDROID_UA,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["ai_summary"], Value::Null);
    assert_eq!(body["ai_error"], "AI summary unavailable");

    let responses = body["submissions"][0]["responses"].as_array().unwrap();
    assert_eq!(responses.len(), 5);
    assert_eq!(
        responses[0]["question"],
        "I have felt cheerful and in good spirits"
    );
    assert_eq!(responses[0]["answer_text"], "Often");
}

#[tokio::test]
async fn delete_identity_cascades_to_submissions() {
    let (app, state) = setup_app().await;

    let submit = app
        .clone()
        .oneshot(post_json("/api/checkin", ANDROID_UA, checkin_body()))
        .await
        .unwrap();
    let submitted = extract_json(submit.into_body()).await;
    let identity_id = submitted["identity"]["id"].as_str().unwrap().to_string();

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/identities/{}", identity_id))
        .header("user-agent", ANDROID_UA)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM submissions")
        .fetch_one(&state.db)
        .await
        .unwrap();
    assert_eq!(remaining, 0);

    // Deleting again is NOT_FOUND
    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/identities/{}", identity_id))
        .header("user-agent", ANDROID_UA)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ===========================================================================
// Meta catalogs

#[tokio::test]
async fn meta_catalogs_enumerate_known_values() {
    let (app, _) = setup_app().await;

    let response = app
        .clone()
        .oneshot(get("/api/meta/languages", ANDROID_UA))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body.as_array().unwrap().len(), 11);

    let response = app
        .oneshot(get("/api/meta/age-groups", ANDROID_UA))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    let groups = body.as_array().unwrap();
    assert_eq!(groups.len(), 5);
    assert_eq!(groups[0]["code"], "AGE_12_17");
    assert_eq!(groups[0]["name"], "12-17 years");
}
