//! Domain types shared across the service
//!
//! All categorical enums expose a complete `ALL` listing so aggregate
//! endpoints can emit every value with zero defaults, even for dimensions
//! with no data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity band for a normalized wellbeing score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Red,
    Orange,
    Green,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Red, Severity::Orange, Severity::Green];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Red => "RED",
            Severity::Orange => "ORANGE",
            Severity::Green => "GREEN",
        }
    }

    /// Chart label for the band
    pub fn display_name(&self) -> &'static str {
        match self {
            Severity::Red => "Low",
            Severity::Orange => "Moderate",
            Severity::Green => "High",
        }
    }

    /// Chart color for the band
    pub fn color(&self) -> &'static str {
        match self {
            Severity::Red => "#FF4842",
            Severity::Orange => "#FFC107",
            Severity::Green => "#48BB78",
        }
    }
}

/// Supported survey languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Language {
    English,
    Nederlands,
    Arabic,
    Tigrinya,
    Russian,
    Farsi,
    Dari,
    Somali,
    Ukrainian,
    French,
    Turkish,
}

impl Language {
    pub const ALL: [Language; 11] = [
        Language::English,
        Language::Nederlands,
        Language::Arabic,
        Language::Tigrinya,
        Language::Russian,
        Language::Farsi,
        Language::Dari,
        Language::Somali,
        Language::Ukrainian,
        Language::French,
        Language::Turkish,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "ENGLISH",
            Language::Nederlands => "NEDERLANDS",
            Language::Arabic => "ARABIC",
            Language::Tigrinya => "TIGRINYA",
            Language::Russian => "RUSSIAN",
            Language::Farsi => "FARSI",
            Language::Dari => "DARI",
            Language::Somali => "SOMALI",
            Language::Ukrainian => "UKRAINIAN",
            Language::French => "FRENCH",
            Language::Turkish => "TURKISH",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Nederlands => "Nederlands",
            Language::Arabic => "Arabic",
            Language::Tigrinya => "Tigrinya",
            Language::Russian => "Russian",
            Language::Farsi => "Farsi",
            Language::Dari => "Dari",
            Language::Somali => "Somali",
            Language::Ukrainian => "Ukrainian",
            Language::French => "French",
            Language::Turkish => "Turkish",
        }
    }

    /// Map a browser Accept-Language primary subtag to a supported language
    pub fn from_accept_language(header: &str) -> Option<Language> {
        let primary = header
            .split(',')
            .next()?
            .split('-')
            .next()?
            .trim()
            .to_lowercase();

        match primary.as_str() {
            "en" => Some(Language::English),
            "nl" => Some(Language::Nederlands),
            "ar" => Some(Language::Arabic),
            "ti" => Some(Language::Tigrinya),
            "ru" => Some(Language::Russian),
            "fa" => Some(Language::Farsi),
            "prs" => Some(Language::Dari),
            "so" => Some(Language::Somali),
            "uk" => Some(Language::Ukrainian),
            "fr" => Some(Language::French),
            "tr" => Some(Language::Turkish),
            _ => None,
        }
    }
}

/// Respondent age group (self-reported, never verified)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum AgeGroup {
    #[serde(rename = "AGE_12_17")]
    #[sqlx(rename = "AGE_12_17")]
    Age12To17,
    #[serde(rename = "AGE_18_25")]
    #[sqlx(rename = "AGE_18_25")]
    Age18To25,
    #[serde(rename = "AGE_26_40")]
    #[sqlx(rename = "AGE_26_40")]
    Age26To40,
    #[serde(rename = "AGE_41_60")]
    #[sqlx(rename = "AGE_41_60")]
    Age41To60,
    #[serde(rename = "AGE_60_PLUS")]
    #[sqlx(rename = "AGE_60_PLUS")]
    Age60Plus,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 5] = [
        AgeGroup::Age12To17,
        AgeGroup::Age18To25,
        AgeGroup::Age26To40,
        AgeGroup::Age41To60,
        AgeGroup::Age60Plus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::Age12To17 => "AGE_12_17",
            AgeGroup::Age18To25 => "AGE_18_25",
            AgeGroup::Age26To40 => "AGE_26_40",
            AgeGroup::Age41To60 => "AGE_41_60",
            AgeGroup::Age60Plus => "AGE_60_PLUS",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AgeGroup::Age12To17 => "12-17 years",
            AgeGroup::Age18To25 => "18-25 years",
            AgeGroup::Age26To40 => "26-40 years",
            AgeGroup::Age41To60 => "41-60 years",
            AgeGroup::Age60Plus => "60+ years",
        }
    }
}

/// The five survey answers, each 0-5
///
/// Kept as signed integers so out-of-range request values reach the
/// validator instead of failing JSON deserialization opaquely.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AssessmentAnswers {
    pub question1: i64,
    pub question2: i64,
    pub question3: i64,
    pub question4: i64,
    pub question5: i64,
}

impl AssessmentAnswers {
    pub fn values(&self) -> [i64; 5] {
        [
            self.question1,
            self.question2,
            self.question3,
            self.question4,
            self.question5,
        ]
    }
}

/// Anonymous device-derived actor record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Identity {
    pub id: String,
    pub fingerprint: String,
    pub language: Option<Language>,
    pub age_group: Option<AgeGroup>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// A stored assessment. Immutable after creation except `severity`,
/// which only the escalation sweep rewrites.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Submission {
    pub id: String,
    pub identity_id: String,
    pub ip_hash: String,
    /// JSON object of question key -> answer value
    pub answers: String,
    pub raw_score: i64,
    pub score: i64,
    pub severity: Severity,
    pub language: Language,
    pub age_group: AgeGroup,
    pub submitted_at: DateTime<Utc>,
    /// Local calendar date of submission; UNIQUE(identity_id, day_key)
    /// is the authoritative one-per-day guarantee.
    pub day_key: String,
}

/// Cached output of the external AI summarization collaborator
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AiSummary {
    pub identity_id: String,
    pub summary: String,
    /// JSON array of theme strings
    pub themes: String,
    pub generated_at: DateTime<Utc>,
}

impl AiSummary {
    /// Decode the stored themes column, tolerating malformed rows
    pub fn theme_list(&self) -> Vec<String> {
        serde_json::from_str(&self.themes).unwrap_or_default()
    }
}
