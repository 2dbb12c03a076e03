//! Classifier output and the keyword correction applied after every call.
//!
//! A [`Classification`] is treated as an immutable value. The TV keyword
//! correction produces a new value, and [`ClassificationOutcome`] keeps both
//! the raw and the effective result so the audit log can show the override.

use serde::{Deserialize, Serialize};

use crate::{Priority, ValidationError};

/// Category forced when the text is about television and not about Internet.
pub const TV_CATEGORY: &str = "CONNECTION_TV";

/// Substrings (lowercase) that mark a television/IPTV request.
const TV_KEYWORDS: &[&str] = &["телевиден", "тв ", "iptv", "tv ", "телеканал", "канал "];

/// Substrings (lowercase) that mark an Internet request and suppress the TV override.
const INTERNET_KEYWORDS: &[&str] = &["интернет"];

/// Structured result of the classification gateway.
///
/// Deserialization is strict: every field except `auto_resolvable` is
/// required and unknown fields are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Classification {
    pub category_code: String,
    pub department_code: String,
    pub priority: Priority,
    pub language: String,
    #[serde(default)]
    pub auto_resolvable: bool,
    pub confidence: f64,
}

impl Classification {
    /// Deterministic result used when no classification service is configured.
    pub fn fallback() -> Self {
        Self {
            category_code: "GENERAL".to_string(),
            department_code: "IT-SERVICE".to_string(),
            priority: Priority::P3,
            language: "ru".to_string(),
            auto_resolvable: false,
            confidence: 0.5,
        }
    }

    /// Check the invariants serde cannot express.
    pub fn validate(self) -> Result<Self, ValidationError> {
        if !(0.0..=1.0).contains(&self.confidence) || self.confidence.is_nan() {
            return Err(ValidationError::ConfidenceOutOfRange(self.confidence));
        }
        if self.category_code.trim().is_empty() {
            return Err(ValidationError::MissingField("category_code"));
        }
        if self.department_code.trim().is_empty() {
            return Err(ValidationError::MissingField("department_code"));
        }
        if self.language.trim().is_empty() {
            return Err(ValidationError::MissingField("language"));
        }
        Ok(self)
    }

    /// Return a copy with the TV keyword correction applied to `text`.
    pub fn with_keyword_override(&self, text: &str) -> Self {
        let mut corrected = self.clone();
        if tv_override_applies(text) {
            corrected.category_code = TV_CATEGORY.to_string();
        }
        corrected
    }

    /// Whether this result asks for an automated answer with enough confidence.
    pub fn qualifies_for_auto_resolution(&self, threshold: f64) -> bool {
        self.auto_resolvable && self.confidence >= threshold
    }
}

/// True when `text` mentions television/IPTV and does not mention Internet.
pub fn tv_override_applies(text: &str) -> bool {
    let lower = text.to_lowercase();
    TV_KEYWORDS.iter().any(|kw| lower.contains(kw))
        && !INTERNET_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Raw classifier output paired with the keyword-corrected result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationOutcome {
    pub raw: Classification,
    pub effective: Classification,
}

impl ClassificationOutcome {
    /// Apply the keyword correction for `text` to `raw`.
    pub fn correct(raw: Classification, text: &str) -> Self {
        let effective = raw.with_keyword_override(text);
        Self { raw, effective }
    }

    pub fn overridden(&self) -> bool {
        self.raw.category_code != self.effective.category_code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn internet_result() -> Classification {
        Classification {
            category_code: "INTERNET_HOME".into(),
            department_code: "technical_support".into(),
            priority: Priority::P2,
            language: "ru".into(),
            auto_resolvable: true,
            confidence: 0.9,
        }
    }

    #[test]
    fn iptv_without_internet_forces_tv_category() {
        let raw = internet_result();
        let outcome = ClassificationOutcome::correct(raw, "Не работает IPTV приставка");
        assert_eq!(outcome.effective.category_code, TV_CATEGORY);
        assert_eq!(outcome.raw.category_code, "INTERNET_HOME");
        assert!(outcome.overridden());
    }

    #[test]
    fn internet_keyword_suppresses_override() {
        let raw = internet_result();
        let outcome = ClassificationOutcome::correct(raw, "IPTV и интернет не работают");
        assert_eq!(outcome.effective.category_code, "INTERNET_HOME");
        assert!(!outcome.overridden());
    }

    #[test]
    fn override_is_case_insensitive() {
        assert!(tv_override_applies("Пропало ТЕЛЕВИДЕНИЕ"));
        assert!(tv_override_applies("my TV box is dead"));
        assert!(!tv_override_applies("Пропал ИНТЕРНЕТ и телевидение"));
    }

    #[test]
    fn unrelated_text_keeps_category() {
        let raw = internet_result();
        let corrected = raw.with_keyword_override("Медленная скорость");
        assert_eq!(corrected, raw);
    }

    #[test]
    fn fallback_values() {
        let fb = Classification::fallback();
        assert_eq!(fb.category_code, "GENERAL");
        assert_eq!(fb.department_code, "IT-SERVICE");
        assert_eq!(fb.priority, Priority::P3);
        assert_eq!(fb.language, "ru");
        assert!(!fb.auto_resolvable);
        assert_eq!(fb.confidence, 0.5);
    }

    #[test]
    fn strict_parse_rejects_unknown_fields() {
        let json = r#"{
            "category_code": "GENERAL",
            "department_code": "customer_care",
            "priority": "P3",
            "language": "ru",
            "auto_resolvable": false,
            "confidence": 0.4,
            "mood": "angry"
        }"#;
        assert!(serde_json::from_str::<Classification>(json).is_err());
    }

    #[test]
    fn strict_parse_rejects_bad_priority() {
        let json = r#"{
            "category_code": "GENERAL",
            "department_code": "customer_care",
            "priority": "urgent",
            "language": "ru",
            "confidence": 0.4
        }"#;
        assert!(serde_json::from_str::<Classification>(json).is_err());
    }

    #[test]
    fn auto_resolvable_defaults_to_false() {
        let json = r#"{
            "category_code": "GENERAL",
            "department_code": "customer_care",
            "priority": "P4",
            "language": "kk",
            "confidence": 0.95
        }"#;
        let parsed: Classification = serde_json::from_str(json).unwrap();
        assert!(!parsed.auto_resolvable);
        assert!(!parsed.qualifies_for_auto_resolution(0.8));
    }

    #[test]
    fn validate_rejects_out_of_range_confidence() {
        let mut c = internet_result();
        c.confidence = 1.5;
        assert_eq!(
            c.validate().unwrap_err(),
            ValidationError::ConfidenceOutOfRange(1.5)
        );
    }

    #[test]
    fn threshold_is_inclusive() {
        let mut c = internet_result();
        c.confidence = 0.8;
        assert!(c.qualifies_for_auto_resolution(0.8));
        c.confidence = 0.79;
        assert!(!c.qualifies_for_auto_resolution(0.8));
    }
}
