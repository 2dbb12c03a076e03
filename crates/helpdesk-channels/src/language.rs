/// Letters found in Kazakh but not in Russian.
const KAZAKH_LETTERS: &str = "әіңғүұқөһӘІҢҒҮҰҚӨҺ";

/// Alphabet-based guess: any Kazakh-specific letter means `kk`, otherwise
/// any basic Cyrillic letter means `ru`, otherwise `fallback` (or `ru` when
/// that is blank).
pub fn detect_language<'a>(text: &str, fallback: &'a str) -> &'a str {
    if text.chars().any(|c| KAZAKH_LETTERS.contains(c)) {
        return "kk";
    }
    if text
        .chars()
        .any(|c| ('а'..='я').contains(&c) || ('А'..='Я').contains(&c))
    {
        return "ru";
    }
    if fallback.trim().is_empty() {
        "ru"
    } else {
        fallback
    }
}
