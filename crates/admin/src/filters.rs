//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Up to two initials for an avatar badge.
///
/// Usage in templates: `{{ row.name|initials }}`
#[askama::filter_fn]
pub fn initials(name: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(initials_of(&name.to_string()))
}

/// Bot response time in seconds, one decimal place.
///
/// Usage in templates: `{{ ms|seconds }}`
#[askama::filter_fn]
pub fn seconds(millis: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let text = millis.to_string();
    Ok(text
        .parse::<u64>()
        .map_or(text, |ms| format!("{}.{}s", ms / 1000, (ms % 1000) / 100)))
}

fn initials_of(name: &str) -> String {
    let letters: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().find(|c| c.is_alphanumeric()))
        .take(2)
        .flat_map(char::to_uppercase)
        .collect();
    if letters.is_empty() {
        "?".to_string()
    } else {
        letters
    }
}
