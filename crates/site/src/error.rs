//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before the response is built, and the visitor only
//! ever sees a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::services::LeadsError;

/// Application-level error type for the site.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend lead API call failed.
    #[error("Leads error: {0}")]
    Leads(#[from] LeadsError),

    /// Session store read or write failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Leads(e) if e.is_rejection() => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Leads(_) => StatusCode::BAD_GATEWAY,
            Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show a visitor.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Leads(e) => e.user_message(),
            Self::Session(_) => "Internal server error".to_string(),
        }
    }

    /// Send server-side failures to Sentry and the log.
    ///
    /// Backend rejections are the visitor's problem and are only logged at
    /// info level.
    pub fn report(&self) {
        if self.status().is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::info!(error = %self, "Submission rejected");
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.report();
        // Don't expose internal error details to clients
        (self.status(), self.user_message()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for a visitor action.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error. Form contents are never attached.
pub fn add_breadcrumb(category: &str, message: &str) {
    sentry::add_breadcrumb(sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(status: u16) -> AppError {
        AppError::Leads(LeadsError::Rejected {
            status,
            message: "Spam detected.".to_string(),
        })
    }

    #[test]
    fn test_app_error_display() {
        assert_eq!(
            rejected(400).to_string(),
            "Leads error: API error: 400 - Spam detected."
        );
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(rejected(400).status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(rejected(503).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            rejected(400).into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_rejection_message_reaches_visitor() {
        assert_eq!(rejected(400).user_message(), "Spam detected.");
        assert!(rejected(502).user_message().starts_with("We could not send"));
    }
}
