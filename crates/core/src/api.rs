//! Backend response envelopes and error bodies.

use serde::Deserialize;
use serde_json::Value;

/// Longest raw body we are willing to show a user as an error message.
const MAX_RAW_ERROR_LEN: usize = 200;

/// A response that may or may not be wrapped in `{success, message, data}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Enveloped<T> {
    Wrapped {
        #[serde(default)]
        success: Option<bool>,
        #[serde(default)]
        message: Option<String>,
        data: T,
    },
    Bare(T),
}

impl<T> Enveloped<T> {
    #[must_use]
    pub fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data, .. } | Self::Bare(data) => data,
        }
    }

    /// The envelope's message, if there was one.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Wrapped { message, .. } => message.as_deref(),
            Self::Bare(_) => None,
        }
    }
}

/// Pick a human-readable message out of an error response body.
///
/// Looks at `message`, `error` and `detail` in that order, then at the first
/// field-level validation message (`{"email": ["Enter a valid email."]}`),
/// then falls back to the raw body when it is short, and finally to the
/// status code.
#[must_use]
pub fn error_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = keyed_message(&value) {
            return message;
        }
        if let Some(message) = first_field_message(&value) {
            return message;
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() < MAX_RAW_ERROR_LEN && !trimmed.starts_with('<') {
        return trimmed.to_string();
    }

    format!("Request failed with status {status}")
}

fn keyed_message(value: &Value) -> Option<String> {
    ["message", "error", "detail"]
        .into_iter()
        .filter_map(|key| value.get(key))
        .find_map(as_message)
}

fn first_field_message(value: &Value) -> Option<String> {
    value.as_object()?.values().find_map(as_message)
}

fn as_message(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Array(items) => items.iter().find_map(as_message),
        _ => None,
    }
}
