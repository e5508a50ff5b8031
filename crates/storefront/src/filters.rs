//! Custom Askama template filters.

use std::fmt::Display;

/// Longest product description shown on a listing card, in characters.
const EXCERPT_CHARS: usize = 140;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Shortens a product description for the catalog grid, cutting at a word
/// boundary and appending an ellipsis.
///
/// Usage in templates: `{{ product.description|excerpt }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn excerpt(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(shorten(&value.to_string(), EXCERPT_CHARS))
}

fn shorten(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };

    let (head, _) = text.split_at(cut);
    let head = head
        .rfind(char::is_whitespace)
        .map_or(head, |space| head.split_at(space).0)
        .trim_end_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace());
    format!("{head}…")
}
