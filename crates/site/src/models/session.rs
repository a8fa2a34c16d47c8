//! Session-stored types.
//!
//! Visitors never log in; the session only carries a one-shot notice
//! between a form post and the page it redirects to.

use serde::{Deserialize, Serialize};

/// Session keys.
pub mod keys {
    /// Notice shown once on the next page render.
    pub const FLASH: &str = "flash";
}

/// Notice tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashKind {
    Success,
    Error,
}

/// A one-shot notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub title: String,
    pub body: Option<String>,
}

impl Flash {
    pub fn success(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            title: title.into(),
            body: Some(body.into()),
        }
    }

    pub fn error(title: impl Into<String>, body: Option<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            title: title.into(),
            body,
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.kind == FlashKind::Error
    }
}
