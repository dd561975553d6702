//! Aggregate statistics over stored submissions
//!
//! Every categorical output lists every enumerated value with zero
//! defaults, so chart consumers never handle missing keys. Each query
//! here is independently computable and read-only.

use crate::config::Config;
use crate::db::submissions::{self, ScoreRow, SubmissionQuery};
use crate::error::Result;
use crate::models::{AgeGroup, Language, Severity};
use crate::services::ai_client::AiSummaryClient;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::debug;

/// Filters accepted by the stats overview
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsFilter {
    /// Range keyword: last_7_days, last_10_days, last_15_days,
    /// last_30_days, yesterday, last_2_month, last_3_month,
    /// last_6_month, last_1_year
    pub date_range: Option<String>,
    pub language: Option<Language>,
    pub age_group: Option<AgeGroup>,
    pub severity: Option<Severity>,
    pub min_score: Option<i64>,
    pub max_score: Option<i64>,
}

fn range_days(keyword: &str) -> Option<i64> {
    match keyword {
        "yesterday" => Some(1),
        "last_7_days" => Some(7),
        "last_10_days" => Some(10),
        "last_15_days" => Some(15),
        "last_30_days" => Some(30),
        "last_2_month" => Some(60),
        "last_3_month" => Some(90),
        "last_6_month" => Some(180),
        "last_1_year" => Some(365),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Distributions

#[derive(Debug, Clone, Serialize)]
pub struct LanguageStat {
    pub language: Language,
    pub average_score: i64,
    pub submissions: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LanguageDistribution {
    pub total_languages: usize,
    pub languages: Vec<LanguageStat>,
}

pub async fn distribution_by_language(pool: &SqlitePool) -> Result<LanguageDistribution> {
    let grouped = submissions::stats_by_language(pool).await?;
    let by_language: HashMap<Language, (f64, i64)> = grouped
        .into_iter()
        .map(|(lang, avg, count)| (lang, (avg, count)))
        .collect();

    let languages = Language::ALL
        .iter()
        .map(|lang| {
            let (avg, count) = by_language.get(lang).copied().unwrap_or((0.0, 0));
            LanguageStat {
                language: *lang,
                average_score: avg.round() as i64,
                submissions: count,
            }
        })
        .collect::<Vec<_>>();

    Ok(LanguageDistribution {
        total_languages: languages.len(),
        languages,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct SeverityStat {
    pub severity: Severity,
    pub name: &'static str,
    pub color: &'static str,
    pub submissions: i64,
    /// Share of all submissions, rounded percent; 0 on an empty dataset
    pub percentage: i64,
}

pub async fn distribution_by_severity(pool: &SqlitePool) -> Result<Vec<SeverityStat>> {
    let grouped = submissions::stats_by_severity(pool).await?;
    let by_severity: HashMap<Severity, i64> = grouped.into_iter().collect();
    let total: i64 = by_severity.values().sum();

    Ok(Severity::ALL
        .iter()
        .map(|severity| {
            let count = by_severity.get(severity).copied().unwrap_or(0);
            let percentage = if total == 0 {
                0
            } else {
                ((count as f64 / total as f64) * 100.0).round() as i64
            };
            SeverityStat {
                severity: *severity,
                name: severity.display_name(),
                color: severity.color(),
                submissions: count,
                percentage,
            }
        })
        .collect())
}

#[derive(Debug, Clone, Serialize)]
pub struct AgeGroupStat {
    pub age_group: AgeGroup,
    pub average_score: i64,
    pub submissions: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgeGroupDistribution {
    pub total_age_groups: usize,
    pub age_groups: Vec<AgeGroupStat>,
}

pub async fn distribution_by_age_group(pool: &SqlitePool) -> Result<AgeGroupDistribution> {
    let grouped = submissions::stats_by_age_group(pool).await?;
    let by_group: HashMap<AgeGroup, (f64, i64)> = grouped
        .into_iter()
        .map(|(group, avg, count)| (group, (avg, count)))
        .collect();

    let age_groups = AgeGroup::ALL
        .iter()
        .map(|group| {
            let (avg, count) = by_group.get(group).copied().unwrap_or((0.0, 0));
            AgeGroupStat {
                age_group: *group,
                average_score: avg.round() as i64,
                submissions: count,
            }
        })
        .collect::<Vec<_>>();

    Ok(AgeGroupDistribution {
        total_age_groups: age_groups.len(),
        age_groups,
    })
}

// ---------------------------------------------------------------------------
// Weekly trend

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
    NoData,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekStat {
    /// ISO week key, e.g. "2026-W35"
    pub week_key: String,
    pub label: String,
    pub average_score: i64,
    pub submissions: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyTrend {
    pub weeks: Vec<WeekStat>,
    pub summary: TrendSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendSummary {
    pub total_submissions: i64,
    pub overall_average: i64,
    pub trend: Trend,
    pub window_weeks: i64,
}

fn iso_week_key(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}

/// Per-ISO-week averages over the trailing `weeks` weeks, empty weeks
/// included. Trend compares the earliest and latest non-empty week; a
/// difference above 2 points calls a direction, anything else is stable.
pub async fn weekly_trend(pool: &SqlitePool, weeks: i64) -> Result<WeeklyTrend> {
    let weeks = weeks.clamp(1, 52);
    let now = Utc::now();
    let start = now - Duration::days(weeks * 7);

    let rows = submissions::scores_between(pool, start, now).await?;

    if rows.is_empty() {
        return Ok(WeeklyTrend {
            weeks: Vec::new(),
            summary: TrendSummary {
                total_submissions: 0,
                overall_average: 0,
                trend: Trend::NoData,
                window_weeks: weeks,
            },
        });
    }

    let mut by_week: HashMap<String, (i64, i64)> = HashMap::new();
    for row in &rows {
        let key = iso_week_key(row.submitted_at.date_naive());
        let entry = by_week.entry(key).or_insert((0, 0));
        entry.0 += row.score;
        entry.1 += 1;
    }

    let mut week_stats = Vec::with_capacity(weeks as usize);
    for i in (0..weeks).rev() {
        let anchor = (now - Duration::days(7 * i)).date_naive();
        let iso = anchor.iso_week();
        let monday =
            NaiveDate::from_isoywd_opt(iso.year(), iso.week(), Weekday::Mon).unwrap_or(anchor);
        let key = iso_week_key(anchor);
        let (sum, count) = by_week.get(&key).copied().unwrap_or((0, 0));
        let average = if count > 0 {
            (sum as f64 / count as f64).round() as i64
        } else {
            0
        };

        week_stats.push(WeekStat {
            label: format!("Week {:02}", iso.week()),
            week_key: key,
            average_score: average,
            submissions: count,
            start_date: monday,
            end_date: monday + Duration::days(6),
        });
    }

    let total: i64 = rows.len() as i64;
    let overall_average =
        (rows.iter().map(|r| r.score).sum::<i64>() as f64 / total as f64).round() as i64;

    let non_empty: Vec<&WeekStat> = week_stats.iter().filter(|w| w.submissions > 0).collect();
    let trend = match (non_empty.first(), non_empty.last()) {
        (Some(first), Some(last)) if non_empty.len() >= 2 => {
            if last.average_score > first.average_score + 2 {
                Trend::Increasing
            } else if last.average_score < first.average_score - 2 {
                Trend::Decreasing
            } else {
                Trend::Stable
            }
        }
        _ => Trend::NoData,
    };

    Ok(WeeklyTrend {
        weeks: week_stats,
        summary: TrendSummary {
            total_submissions: total,
            overall_average,
            trend,
            window_weeks: weeks,
        },
    })
}

// ---------------------------------------------------------------------------
// Theme frequency

#[derive(Debug, Clone, Serialize)]
pub struct ThemeCount {
    pub theme: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThemeFrequency {
    pub top_themes: Vec<ThemeCount>,
    pub other_themes_count: i64,
    pub theme_categories: Vec<ThemeCount>,
}

/// Best-effort theme tally across the given identities. Bounded
/// concurrency; a failed lookup contributes nothing and never aborts
/// the aggregate.
pub async fn theme_frequency(
    pool: &SqlitePool,
    ai: &AiSummaryClient,
    identity_ids: Vec<String>,
    fanout: usize,
) -> ThemeFrequency {
    let fanout = fanout.max(1);

    let summaries: Vec<_> = futures::stream::iter(identity_ids)
        .map(|id| {
            let ai = ai.clone();
            let pool = pool.clone();
            async move {
                match ai.summary_with_cache(&pool, &id).await {
                    Ok(summary) => summary,
                    Err(e) => {
                        debug!("Theme lookup skipped for {}: {}", id, e);
                        None
                    }
                }
            }
        })
        .buffer_unordered(fanout)
        .collect()
        .await;

    let mut counts: HashMap<String, i64> = HashMap::new();
    for summary in summaries.into_iter().flatten() {
        for theme in summary.theme_list() {
            *counts.entry(theme).or_insert(0) += 1;
        }
    }

    let mut theme_categories: Vec<ThemeCount> = counts
        .into_iter()
        .map(|(theme, count)| ThemeCount { theme, count })
        .collect();
    theme_categories.sort_by(|a, b| b.count.cmp(&a.count).then(a.theme.cmp(&b.theme)));

    let top_themes: Vec<ThemeCount> = theme_categories.iter().take(3).cloned().collect();
    let other_themes_count = theme_categories.len().saturating_sub(top_themes.len()) as i64;

    ThemeFrequency {
        top_themes,
        other_themes_count,
        theme_categories,
    }
}

// ---------------------------------------------------------------------------
// Filtered overview with period-over-period comparison

#[derive(Debug, Clone, Serialize)]
pub struct StatsOverview {
    pub total: i64,
    /// Change vs the immediately preceding same-length window, percent
    pub total_change_percent: i64,
    pub average_score: i64,
    /// Point delta vs the preceding window
    pub average_score_change: i64,
    /// Share of submissions scoring below 50, rounded percent
    pub low_wellbeing_percentage: i64,
    /// Point delta vs the preceding window
    pub low_wellbeing_change: i64,
    pub themes: ThemeFrequency,
}

fn low_share_percent(rows: &[ScoreRow]) -> i64 {
    if rows.is_empty() {
        return 0;
    }
    let low = rows.iter().filter(|r| r.score < 50).count();
    ((low as f64 / rows.len() as f64) * 100.0).round() as i64
}

fn mean_score(rows: &[ScoreRow]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    rows.iter().map(|r| r.score).sum::<i64>() as f64 / rows.len() as f64
}

/// Filtered overview. The comparison window is the same-length window
/// immediately preceding the current one; without a date range there is
/// nothing to compare against and all deltas are zero.
pub async fn overview(
    pool: &SqlitePool,
    ai: &AiSummaryClient,
    config: &Config,
    filter: &StatsFilter,
) -> Result<StatsOverview> {
    let now = Utc::now();
    let days = filter.date_range.as_deref().and_then(range_days);

    let mut current = SubmissionQuery {
        language: filter.language,
        age_group: filter.age_group,
        severity: filter.severity,
        min_score: filter.min_score,
        max_score: filter.max_score,
        ..Default::default()
    };
    if let Some(days) = days {
        current.from = Some(now - Duration::days(days));
        current.to = Some(now);
    }

    let rows = submissions::query_scores(pool, &current).await?;
    let total = rows.len() as i64;

    if total == 0 {
        return Ok(StatsOverview {
            total: 0,
            total_change_percent: 0,
            average_score: 0,
            average_score_change: 0,
            low_wellbeing_percentage: 0,
            low_wellbeing_change: 0,
            themes: ThemeFrequency {
                top_themes: Vec::new(),
                other_themes_count: 0,
                theme_categories: Vec::new(),
            },
        });
    }

    let average = mean_score(&rows);
    let low_percent = low_share_percent(&rows);

    // Themes: one lookup per distinct identity in the window.
    let mut identity_ids: Vec<String> = rows.iter().map(|r| r.identity_id.clone()).collect();
    identity_ids.sort();
    identity_ids.dedup();
    let themes = theme_frequency(pool, ai, identity_ids, config.theme_fanout).await;

    // Preceding window of the same length.
    let (total_change_percent, average_score_change, low_wellbeing_change) =
        match days {
            Some(days) => {
                let previous = SubmissionQuery {
                    from: Some(now - Duration::days(days * 2)),
                    to: Some(now - Duration::days(days)),
                    ..current.clone()
                };
                let prev_rows = submissions::query_scores(pool, &previous).await?;
                let prev_total = prev_rows.len() as i64;

                let total_change = if prev_total > 0 {
                    (((total - prev_total) as f64 / prev_total as f64) * 100.0).round() as i64
                } else {
                    0
                };
                let average_change = (average - mean_score(&prev_rows)).round() as i64;
                let low_change = low_percent - low_share_percent(&prev_rows);
                (total_change, average_change, low_change)
            }
            None => (0, 0, 0),
        };

    Ok(StatsOverview {
        total,
        total_change_percent,
        average_score: average.round() as i64,
        average_score_change,
        low_wellbeing_percentage: low_percent,
        low_wellbeing_change,
        themes,
    })
}
