//! Calendar-day cooldown arithmetic
//!
//! One accepted submission per identity per calendar day, where the day
//! boundary is local midnight of the evaluation instant (not a rolling
//! 24h window). These helpers are pure; the persistence-side uniqueness
//! constraint on (identity_id, day_key) is the actual correctness
//! guarantee under concurrency.

use chrono::{DateTime, Datelike, Local, LocalResult, NaiveTime, TimeZone, Utc};
use serde::Serialize;

/// Result of a cooldown evaluation
#[derive(Debug, Clone, Serialize)]
pub struct CooldownStatus {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_eligible_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_submission_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl CooldownStatus {
    pub fn allowed() -> Self {
        CooldownStatus {
            allowed: true,
            next_eligible_at: None,
            last_submission_at: None,
            reason: None,
        }
    }

    pub fn blocked(last_submission_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let next = start_of_next_day(now);
        CooldownStatus {
            allowed: false,
            next_eligible_at: Some(next),
            last_submission_at: Some(last_submission_at),
            reason: Some(format!(
                "Already submitted today. Next submission opens at {}.",
                next.to_rfc3339()
            )),
        }
    }
}

/// Local calendar date of an instant, as stored in `day_key`
pub fn day_key(instant: DateTime<Utc>) -> String {
    let local = instant.with_timezone(&Local);
    format!(
        "{:04}-{:02}-{:02}",
        local.year(),
        local.month(),
        local.day()
    )
}

/// First instant of the local calendar day after `now`
pub fn start_of_next_day(now: DateTime<Utc>) -> DateTime<Utc> {
    let local_day = now.with_timezone(&Local).date_naive();
    let next_day = match local_day.succ_opt() {
        Some(d) => d,
        // Date overflow only at the calendar horizon
        None => return now,
    };

    match Local.from_local_datetime(&next_day.and_time(NaiveTime::MIN)) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        // Midnight skipped by a DST transition: fall back to 24h from now
        LocalResult::None => now + chrono::Duration::days(1),
    }
}

/// True when two instants fall on the same local calendar day
pub fn same_calendar_day(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    day_key(a) == day_key(b)
}
