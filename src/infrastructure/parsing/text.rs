//! Small text helpers shared by the extractors and the normalizer

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NUMBER_PATTERN: Regex = Regex::new(r"-?\d+(?:[.,]\d+)?").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Collapse runs of whitespace and trim
pub fn clean_text(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Lowercase, treat `_` and `-` as spaces, collapse whitespace
pub fn normalize_key(text: &str) -> String {
    let spaced: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c == '_' || c == '-' { ' ' } else { c })
        .collect();
    clean_text(&spaced)
}

/// True for cells like `☐`, `☑`, `✓` or blanks: nothing alphanumeric at all
pub fn is_pure_glyph(text: &str) -> bool {
    !text.chars().any(char::is_alphanumeric)
}

/// First numeric substring, with `,` read as a decimal separator.
///
/// `"8.5 điểm"` gives `"8.5"`, `"7,25/10"` gives `"7.25"`.
pub fn first_number(text: &str) -> Option<String> {
    NUMBER_PATTERN
        .find(text)
        .map(|m| m.as_str().replace(',', "."))
}

pub fn parse_first_number(text: &str) -> Option<f64> {
    first_number(text)?.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Split a full name into `(first_name, last_name)`.
///
/// The last token is the given name, the rest is the family part. A single
/// token becomes the first name alone.
pub fn split_full_name(full_name: &str) -> Option<(String, Option<String>)> {
    let tokens: Vec<&str> = full_name.split_whitespace().collect();
    match tokens.split_last() {
        None => None,
        Some((first, [])) => Some(((*first).to_string(), None)),
        Some((first, rest)) => Some(((*first).to_string(), Some(rest.join(" ")))),
    }
}
