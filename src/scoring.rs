//! WHO-5 scoring engine
//!
//! Pure: no persistence, no side effects. Validation rejects bad input
//! before scoring; scoring itself cannot fail on valid input.
//!
//! Severity thresholds are the 50/70 bands wired into the live intake
//! path. (A stricter 44/84 banding existed historically and is not
//! implemented here.)

use crate::error::{Error, Result};
use crate::models::{AssessmentAnswers, Severity};

/// Number of survey questions
pub const QUESTION_COUNT: usize = 5;
/// Maximum value of a single answer
pub const MAX_ANSWER: i64 = 5;
/// Maximum raw score (sum of all answers)
pub const MAX_RAW_SCORE: i64 = QUESTION_COUNT as i64 * MAX_ANSWER;

/// Result of scoring one assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreBreakdown {
    /// Sum of the five answers, 0-25
    pub raw_score: i64,
    /// Normalized to 0-100
    pub score: i64,
    pub severity: Severity,
}

/// Validate and score a set of answers.
pub fn score_answers(answers: &AssessmentAnswers) -> Result<ScoreBreakdown> {
    for (i, value) in answers.values().iter().enumerate() {
        if *value < 0 || *value > MAX_ANSWER {
            return Err(Error::Validation(format!(
                "Answer to question {} must be between 0 and {}, got {}",
                i + 1,
                MAX_ANSWER,
                value
            )));
        }
    }

    let raw_score: i64 = answers.values().iter().sum();
    let score = (raw_score as f64 / MAX_RAW_SCORE as f64 * 100.0).round() as i64;

    Ok(ScoreBreakdown {
        raw_score,
        score,
        severity: severity_for(score),
    })
}

/// Classify a normalized score into its severity band.
pub fn severity_for(score: i64) -> Severity {
    if score < 50 {
        Severity::Red
    } else if score < 70 {
        Severity::Orange
    } else {
        Severity::Green
    }
}

/// Question wording keyed by answer-object field
pub fn question_label(key: &str) -> &'static str {
    match key {
        "question1" => "I have felt cheerful and in good spirits",
        "question2" => "I have felt calm and relaxed",
        "question3" => "I have felt active and vigorous",
        "question4" => "I woke up feeling fresh and rested",
        "question5" => "My daily life has been filled with things that interest me",
        _ => "Unknown question",
    }
}

/// Answer option wording (0-5 scale)
pub fn option_label(value: i64) -> &'static str {
    match value {
        0 => "Never",
        1 => "Rarely",
        2 => "Sometimes",
        3 => "Often",
        4 => "Most of the time",
        5 => "All the time",
        _ => "Unknown",
    }
}

/// Short category name for a normalized score
pub fn score_category(score: i64) -> &'static str {
    match severity_for(score) {
        Severity::Green => "High",
        Severity::Orange => "Moderate",
        Severity::Red => "Needs Support",
    }
}

/// Respondent-facing feedback for a normalized score
pub fn score_feedback(score: i64) -> &'static str {
    match severity_for(score) {
        Severity::Green => {
            "You're doing well overall. Keep nurturing the practices that support your wellbeing."
        }
        Severity::Orange => {
            "Moderate wellbeing reported. Some positive moments, with noticeable energy fluctuations."
        }
        Severity::Red => {
            "Things seem to have been difficult lately. Small steps toward self-care can make a difference."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(v: [i64; 5]) -> AssessmentAnswers {
        AssessmentAnswers {
            question1: v[0],
            question2: v[1],
            question3: v[2],
            question4: v[3],
            question5: v[4],
        }
    }

    #[test]
    fn all_fives_is_green_100() {
        let b = score_answers(&answers([5, 5, 5, 5, 5])).unwrap();
        assert_eq!(b.raw_score, 25);
        assert_eq!(b.score, 100);
        assert_eq!(b.severity, Severity::Green);
    }

    #[test]
    fn all_zeroes_is_red_0() {
        let b = score_answers(&answers([0, 0, 0, 0, 0])).unwrap();
        assert_eq!(b.raw_score, 0);
        assert_eq!(b.score, 0);
        assert_eq!(b.severity, Severity::Red);
    }

    #[test]
    fn mid_range_is_orange() {
        // 3+3+2+3+3 = 14 -> 56
        let b = score_answers(&answers([3, 3, 2, 3, 3])).unwrap();
        assert_eq!(b.raw_score, 14);
        assert_eq!(b.score, 56);
        assert_eq!(b.severity, Severity::Orange);
    }

    #[test]
    fn band_boundaries_are_exact() {
        assert_eq!(severity_for(45), Severity::Red);
        assert_eq!(severity_for(49), Severity::Red);
        assert_eq!(severity_for(50), Severity::Orange);
        assert_eq!(severity_for(69), Severity::Orange);
        assert_eq!(severity_for(70), Severity::Green);
    }

    #[test]
    fn normalized_score_matches_formula_for_all_raw_scores() {
        for q1 in 0..=5 {
            for q5 in 0..=5 {
                let b = score_answers(&answers([q1, 2, 3, 1, q5])).unwrap();
                let raw = q1 + 2 + 3 + 1 + q5;
                let expected = (raw as f64 / 25.0 * 100.0).round() as i64;
                assert_eq!(b.score, expected);
                assert!((0..=100).contains(&b.score));
            }
        }
    }

    #[test]
    fn out_of_range_answers_rejected() {
        assert!(score_answers(&answers([6, 0, 0, 0, 0])).is_err());
        assert!(score_answers(&answers([0, 0, -1, 0, 0])).is_err());
    }

    #[test]
    fn labels_cover_scale() {
        assert_eq!(option_label(0), "Never");
        assert_eq!(option_label(5), "All the time");
        assert_eq!(option_label(9), "Unknown");
        assert_eq!(
            question_label("question2"),
            "I have felt calm and relaxed"
        );
    }
}
