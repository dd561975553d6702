//! AI summarization collaborator client
//!
//! The collaborator is treated as unreliable: every request is bounded
//! by the configured timeout, and any failure surfaces as
//! `ExternalUnavailable`, which callers degrade on (cache fallback or
//! absent enrichment) rather than propagate.

use crate::db::summaries;
use crate::error::{Error, Result};
use crate::models::AiSummary;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::{debug, warn};

/// Wire request to the collaborator
#[derive(Debug, Serialize)]
struct SummaryRequest<'a> {
    identity_id: &'a str,
}

/// Wire response from the collaborator
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
    #[serde(default)]
    pub themes: Vec<String>,
}

#[derive(Clone)]
pub struct AiSummaryClient {
    http: reqwest::Client,
    base_url: String,
}

impl AiSummaryClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build AI client: {}", e)))?;

        Ok(AiSummaryClient {
            http,
            base_url: base_url.to_string(),
        })
    }

    /// One summarization round-trip. Timeouts, non-2xx statuses and
    /// undecodable bodies all map to `ExternalUnavailable`.
    pub async fn fetch_summary(&self, identity_id: &str) -> Result<SummaryResponse> {
        let response = self
            .http
            .post(&self.base_url)
            .json(&SummaryRequest { identity_id })
            .send()
            .await
            .map_err(|e| Error::ExternalUnavailable(format!("AI summary request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::ExternalUnavailable(format!(
                "AI summary endpoint returned {}",
                response.status()
            )));
        }

        response
            .json::<SummaryResponse>()
            .await
            .map_err(|e| Error::ExternalUnavailable(format!("AI summary decode failed: {}", e)))
    }

    /// Fetch a fresh summary and refresh the cache; on collaborator
    /// failure fall back to the cached copy. Only persistence errors
    /// propagate.
    pub async fn summary_with_cache(
        &self,
        pool: &SqlitePool,
        identity_id: &str,
    ) -> Result<Option<AiSummary>> {
        match self.fetch_summary(identity_id).await {
            Ok(fresh) => {
                let themes = serde_json::to_string(&fresh.themes)
                    .unwrap_or_else(|_| "[]".to_string());
                let summary = AiSummary {
                    identity_id: identity_id.to_string(),
                    summary: fresh.summary,
                    themes,
                    generated_at: Utc::now(),
                };
                summaries::upsert(pool, &summary).await?;
                Ok(Some(summary))
            }
            Err(e) => {
                debug!("AI summary unavailable for {}: {}", identity_id, e);
                let cached = summaries::find_by_identity(pool, identity_id).await?;
                if cached.is_none() {
                    warn!("No cached AI summary for identity {}", identity_id);
                }
                Ok(cached)
            }
        }
    }
}
