//! Session-related types for admin authentication.
//!
//! Types stored in the session for authentication state.

use aaa_core::{AdminId, AdminRole, Email};
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Session-stored admin identity.
///
/// Minimal data stored in the session to identify the logged-in admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Backend account ID.
    pub id: AdminId,
    /// Admin's email address.
    pub email: Email,
    /// Admin's display name.
    pub name: String,
    /// Admin's role/permission level.
    pub role: AdminRole,
}

impl CurrentAdmin {
    #[must_use]
    pub fn is_super_admin(&self) -> bool {
        self.role == AdminRole::SuperAdmin
    }
}

/// Backend bearer tokens for the logged-in admin.
#[derive(Clone, Serialize, Deserialize)]
pub struct BackendToken {
    access: String,
    refresh: Option<String>,
    obtained_at: DateTime<Utc>,
}

impl BackendToken {
    #[must_use]
    pub fn new(access: String, refresh: Option<String>) -> Self {
        Self {
            access,
            refresh,
            obtained_at: Utc::now(),
        }
    }

    /// The access token, wrapped so it cannot leak through logs.
    #[must_use]
    pub fn access(&self) -> SecretString {
        SecretString::from(self.access.clone())
    }

    #[must_use]
    pub const fn has_refresh(&self) -> bool {
        self.refresh.is_some()
    }

    #[must_use]
    pub const fn obtained_at(&self) -> DateTime<Utc> {
        self.obtained_at
    }
}

impl std::fmt::Debug for BackendToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendToken")
            .field("access", &"[REDACTED]")
            .field("refresh", &self.refresh.as_ref().map(|_| "[REDACTED]"))
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

/// Severity of a one-shot notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashKind {
    Success,
    Error,
}

/// One-shot notice shown on the next page render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub title: String,
    pub body: Option<String>,
}

impl Flash {
    pub fn success(title: impl Into<String>, body: Option<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            title: title.into(),
            body,
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

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for the admin's backend tokens.
    pub const BACKEND_TOKEN: &str = "backend_token";

    /// Key for the pending one-shot notice.
    pub const FLASH: &str = "flash";
}
