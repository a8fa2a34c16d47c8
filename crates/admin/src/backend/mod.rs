//! Backend REST API client.
//!
//! The backend owns every record the admin panel shows. This module wraps
//! the endpoints the panel consumes:
//!
//! - [`auth`] - Admin login
//! - [`conversations`] - Chatbot conversations, manual replies, deletion
//! - [`accounts`] - Admin accounts and their status
//! - [`analytics`] - Dashboard summary counts
//! - [`records`] - Latest inquiries, claims, and activity
//!
//! # Authentication
//!
//! [`BackendClient`] is unauthenticated and only used for login. Every other
//! call goes through an [`AuthorizedBackend`], which attaches the logged-in
//! admin's bearer token.

pub mod accounts;
pub mod analytics;
pub mod auth;
pub mod client;
pub mod conversations;
pub mod records;

pub use accounts::AccountApi;
pub use analytics::AnalyticsApi;
pub use auth::{LoginSession, LoginUser};
pub use client::{AuthorizedBackend, BackendClient};
pub use conversations::{ConversationApi, ConversationQuery, ReplyResponse, ToggleResponse};
pub use records::RecordsApi;

use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body did not have the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Record does not exist (or was deleted).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Token missing or expired.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Token valid but the account may not do this.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A request URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl BackendError {
    /// Whether the session's token should be discarded.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Message suitable for a user-facing notice.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. }
            | Self::NotFound(message)
            | Self::Unauthorized(message)
            | Self::Forbidden(message) => message.clone(),
            Self::Http(e) if e.is_timeout() => "The server took too long to respond.".to_string(),
            Self::Http(_) => "Could not reach the server.".to_string(),
            Self::Parse(_) | Self::InvalidUrl(_) => {
                "The server sent an unexpected response.".to_string()
            }
        }
    }
}
