//! Request-type buckets with legacy synonym folding.

use serde::{Deserialize, Serialize};

/// Canonical request-type bucket.
///
/// Older clients sent `difficulty`, `proposal` and `job`; these fold into
/// `Problem`, `Feedback` and `Career`. Missing or unrecognised hints land in
/// `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Problem,
    Question,
    Feedback,
    Career,
    Partner,
    Other,
}

impl RequestKind {
    pub const ALL: [RequestKind; 6] = [
        Self::Problem,
        Self::Question,
        Self::Feedback,
        Self::Career,
        Self::Partner,
        Self::Other,
    ];

    /// Fold a raw hint (including legacy synonyms) into its bucket.
    pub fn fold(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Other;
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "problem" | "difficulty" => Self::Problem,
            "question" => Self::Question,
            "feedback" | "proposal" => Self::Feedback,
            "career" | "job" => Self::Career,
            "partner" => Self::Partner,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Problem => "problem",
            Self::Question => "question",
            Self::Feedback => "feedback",
            Self::Career => "career",
            Self::Partner => "partner",
            Self::Other => "other",
        }
    }
}
