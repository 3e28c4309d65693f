//! Keyword-frequency safety scoring of model-generated analysis text.
//!
//! The external model returns free text; this module reduces it to a
//! three-level safety score with a confidence percentage by counting
//! occurrences of fixed danger and safe vocabularies.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Terms whose presence indicates a hazard. Matching is case-insensitive
/// substring matching, so "unsafe" also scores a hit for "safe" on the
/// other list.
const DANGER_KEYWORDS: &[&str] = &[
    "danger",
    "unsafe",
    "hazard",
    "flood",
    "pothole",
    "damage",
    "crack",
    "critical",
    "emergency",
    "severe",
    "collapsed",
    "broken",
    "eroded",
];

const SAFE_KEYWORDS: &[&str] = &[
    "safe",
    "good",
    "normal",
    "stable",
    "intact",
    "excellent",
    "fine",
    "well-maintained",
    "solid",
    "secure",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SafetyLevel {
    Safe,
    Moderate,
    Danger,
}

impl SafetyLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "Safe",
            Self::Moderate => "Moderate",
            Self::Danger => "Danger",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Safe" => Some(Self::Safe),
            "Moderate" => Some(Self::Moderate),
            "Danger" => Some(Self::Danger),
            _ => None,
        }
    }
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafetyAssessment {
    pub level: SafetyLevel,
    /// Share of safe hits among all keyword hits, 0-100.
    pub percentage: u8,
}

/// Scores analysis text. With no keyword hits at all the result is the
/// neutral `{50, Moderate}`.
#[must_use]
pub fn assess(analysis: &str) -> SafetyAssessment {
    let lower = analysis.to_lowercase();

    let danger_hits: usize = DANGER_KEYWORDS.iter().map(|k| lower.matches(k).count()).sum();
    let safe_hits: usize = SAFE_KEYWORDS.iter().map(|k| lower.matches(k).count()).sum();

    let total = danger_hits + safe_hits;
    if total == 0 {
        return SafetyAssessment {
            level: SafetyLevel::Moderate,
            percentage: 50,
        };
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let percentage = ((safe_hits as f64 / total as f64) * 100.0).round() as u8;

    let level = if percentage >= 70 {
        SafetyLevel::Safe
    } else if percentage >= 40 {
        SafetyLevel::Moderate
    } else {
        SafetyLevel::Danger
    };

    SafetyAssessment { level, percentage }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_danger_only_text() {
        let result = assess("Severe pothole with visible cracks, dangerous for traffic.");
        assert_eq!(result.percentage, 0);
        assert_eq!(result.level, SafetyLevel::Danger);
    }

    #[test]
    fn test_safe_only_text() {
        let result = assess("The road surface is stable, intact and well-maintained.");
        assert_eq!(result.percentage, 100);
        assert_eq!(result.level, SafetyLevel::Safe);
    }

    #[test]
    fn test_no_keywords_defaults_to_moderate() {
        let result = assess("A photograph of a street.");
        assert_eq!(result.percentage, 50);
        assert_eq!(result.level, SafetyLevel::Moderate);
    }

    #[test]
    fn test_balanced_counts() {
        let result = assess("The pavement looks good but there is a crack.");
        assert_eq!(result.percentage, 50);
        assert_eq!(result.level, SafetyLevel::Moderate);
    }

    #[test]
    fn test_substring_matching_counts_embedded_keywords() {
        // "unsafe" contains "safe": one danger hit plus one safe hit.
        let result = assess("unsafe");
        assert_eq!(result.percentage, 50);
        assert_eq!(result.level, SafetyLevel::Moderate);
    }

    #[test]
    fn test_case_insensitive() {
        let result = assess("FLOODING near a COLLAPSED drain");
        assert_eq!(result.level, SafetyLevel::Danger);
    }

    #[test]
    fn test_rounding() {
        // 2 safe, 1 danger: 66.7% rounds to 67 -> Moderate.
        let result = assess("good and solid, one crack");
        assert_eq!(result.percentage, 67);
        assert_eq!(result.level, SafetyLevel::Moderate);
    }

    #[test]
    fn test_level_parse_round_trip() {
        for level in [SafetyLevel::Safe, SafetyLevel::Moderate, SafetyLevel::Danger] {
            assert_eq!(SafetyLevel::parse(level.as_str()), Some(level));
        }
        assert_eq!(SafetyLevel::parse("Unknown"), None);
    }
}
