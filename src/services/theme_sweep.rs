//! Escalation sweep
//!
//! Recurring background task that scans cached AI summaries for the
//! configured crisis theme and force-raises the flagged identities'
//! latest submissions to RED. At-least-once reconciliation: re-running
//! with nothing new is a no-op, and one identity's failure never halts
//! the rest of the batch. Shares nothing with request handling except
//! the database pool.

use crate::db::{submissions, summaries};
use crate::error::Result;
use crate::models::Severity;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, error, info};

/// Outcome of one sweep pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Identities carrying the crisis theme
    pub flagged: usize,
    /// Submissions actually raised to RED this pass
    pub escalated: usize,
    /// Identities whose processing failed (logged, skipped)
    pub failed: usize,
}

pub struct ThemeSweep {
    db: SqlitePool,
    crisis_theme: String,
    interval: Duration,
}

impl ThemeSweep {
    pub fn new(db: SqlitePool, crisis_theme: String, interval: Duration) -> Self {
        ThemeSweep {
            db,
            crisis_theme,
            interval,
        }
    }

    /// Spawn the sweep loop. Runs until the process exits.
    pub fn run(self: Arc<Self>) {
        info!(
            "Starting escalation sweep (interval: {:?}, theme: {:?})",
            self.interval, self.crisis_theme
        );

        tokio::spawn(async move {
            let mut timer = interval(self.interval);
            timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                timer.tick().await;

                match self.run_once().await {
                    Ok(report) if report.escalated > 0 || report.failed > 0 => {
                        info!(
                            "Escalation sweep: {} flagged, {} escalated, {} failed",
                            report.flagged, report.escalated, report.failed
                        );
                    }
                    Ok(_) => {}
                    Err(e) => error!("Escalation sweep pass failed: {}", e),
                }
            }
        });
    }

    /// One sweep pass. Only the initial theme scan can fail the pass;
    /// per-identity work is isolated.
    pub async fn run_once(&self) -> Result<SweepReport> {
        let identity_ids = summaries::identities_with_theme(&self.db, &self.crisis_theme).await?;

        if identity_ids.is_empty() {
            debug!("No identities flagged with {:?}", self.crisis_theme);
            return Ok(SweepReport::default());
        }

        let mut report = SweepReport {
            flagged: identity_ids.len(),
            ..Default::default()
        };

        for identity_id in &identity_ids {
            match self.escalate_identity(identity_id).await {
                Ok(true) => report.escalated += 1,
                Ok(false) => {}
                Err(e) => {
                    report.failed += 1;
                    error!("Failed to process flagged identity {}: {}", identity_id, e);
                }
            }
        }

        Ok(report)
    }

    /// Raise the identity's most recent submission to RED if it is not
    /// already. Setting RED when already RED is a safe no-op.
    async fn escalate_identity(&self, identity_id: &str) -> Result<bool> {
        let latest = match submissions::latest_for_identity(&self.db, identity_id).await? {
            Some(submission) => submission,
            None => return Ok(false),
        };

        if latest.severity == Severity::Red {
            return Ok(false);
        }

        let changed = submissions::escalate_severity(&self.db, &latest.id, Severity::Red).await?;
        if changed {
            info!(
                "Escalated submission {} (identity {}) to RED due to {:?}",
                latest.id, identity_id, self.crisis_theme
            );
        }
        Ok(changed)
    }
}
