//! Parsing of model replies.
//!
//! Providers often wrap JSON in a Markdown code fence; the fence is removed
//! before strict deserialization.

use helpdesk_core::Classification;
use serde::Deserialize;

use crate::AiError;

/// Strip a surrounding ```` ``` ```` / ```` ```json ```` fence, if any.
pub fn strip_fences(content: &str) -> &str {
    let trimmed = content.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let inner = trimmed.trim_matches('`');
    let inner = match inner.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("json") => &inner[4..],
        _ => inner,
    };
    inner.trim()
}

/// Parse and validate a classifier reply. Any deviation is an error.
pub fn parse_classification(content: &str) -> Result<Classification, AiError> {
    let parsed: Classification = serde_json::from_str(strip_fences(content))?;
    Ok(parsed.validate()?)
}

#[derive(Deserialize)]
struct Suggestions {
    suggestions: Vec<String>,
}

/// Parse a `{"suggestions": [...]}` reply, dropping blanks and keeping at most `max`.
pub fn parse_suggestions(content: &str, max: usize) -> Result<Vec<String>, AiError> {
    let parsed: Suggestions = serde_json::from_str(strip_fences(content))?;
    Ok(parsed
        .suggestions
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .take(max)
        .collect())
}

/// First `max_chars` characters of `text`.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_core::Priority;

    const REPLY: &str = r#"{"category_code":"INTERNET_HOME","department_code":"technical_support","priority":"P2","language":"ru","auto_resolvable":true,"confidence":0.92}"#;

    #[test]
    fn plain_json_parses() {
        let c = parse_classification(REPLY).unwrap();
        assert_eq!(c.category_code, "INTERNET_HOME");
        assert_eq!(c.priority, Priority::P2);
        assert!(c.auto_resolvable);
    }

    #[test]
    fn fenced_json_parses() {
        let fenced = format!("```json\n{REPLY}\n```");
        assert_eq!(strip_fences(&fenced), REPLY);
        assert!(parse_classification(&fenced).is_ok());

        let bare_fence = format!("```\n{REPLY}\n```");
        assert!(parse_classification(&bare_fence).is_ok());
    }

    #[test]
    fn prose_reply_is_a_protocol_failure() {
        let err = parse_classification("Sure! The category is INTERNET_HOME.").unwrap_err();
        assert!(matches!(err, AiError::Json(_)));
    }

    #[test]
    fn unknown_priority_is_rejected() {
        let reply = REPLY.replace("\"P2\"", "\"P7\"");
        assert!(parse_classification(&reply).is_err());
    }

    #[test]
    fn out_of_range_confidence_is_rejected() {
        let reply = REPLY.replace("0.92", "1.7");
        assert!(matches!(parse_classification(&reply), Err(AiError::Invalid(_))));
    }

    #[test]
    fn suggestions_are_trimmed_and_capped() {
        let reply = r#"```json
{"suggestions": [" Перезагрузите роутер ", "", "Проверьте кабель", "Позвоните нам", "Ещё"]}
```"#;
        let out = parse_suggestions(reply, 3).unwrap();
        assert_eq!(out, vec!["Перезагрузите роутер", "Проверьте кабель", "Позвоните нам"]);
    }

    #[test]
    fn excerpt_counts_characters_not_bytes() {
        assert_eq!(excerpt("привет", 3), "при");
        assert_eq!(excerpt("hi", 500), "hi");
    }
}
