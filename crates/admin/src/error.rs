//! Unified error handling for admin.

use aaa_core::TransitionError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::backend::BackendError;
use crate::services::AccountError;

/// Marker placed on responses whose backend call was rejected for an
/// expired or revoked token. The session middleware flushes the session
/// when it sees it.
#[derive(Debug, Clone, Copy)]
pub struct BackendSessionExpired;

/// Application-level error type for the admin panel.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend API call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Session store read or write failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Status change not allowed from the account's current status.
    #[error("Invalid transition: {0}")]
    InvalidTransition(#[from] TransitionError),

    /// Another request for the same record is still in flight.
    #[error("Busy: {0}")]
    Busy(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Backend(e) => Self::Backend(e),
            AccountError::Transition(e) => Self::InvalidTransition(e),
            AccountError::Busy(_) => Self::Busy(err.to_string()),
        }
    }
}

/// Convenience alias used by handlers.
pub type Result<T, E = AppError> = std::result::Result<T, E>;

impl AppError {
    pub(crate) const fn status(&self) -> StatusCode {
        match self {
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Backend(e) => match e {
                BackendError::Unauthorized(_) => StatusCode::SEE_OTHER,
                BackendError::Forbidden(_) => StatusCode::FORBIDDEN,
                BackendError::NotFound(_) => StatusCode::NOT_FOUND,
                BackendError::Api { status, .. } if *status >= 400 && *status < 500 => {
                    StatusCode::BAD_REQUEST
                }
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::InvalidTransition(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Busy(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    const fn is_server_fault(&self) -> bool {
        match self {
            Self::Session(_) | Self::Internal(_) => true,
            Self::Backend(e) => matches!(
                e,
                BackendError::Http(_) | BackendError::Parse(_) | BackendError::InvalidUrl(_)
            ),
            _ => false,
        }
    }

    /// Message safe to show an admin.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Backend(e) => e.user_message(),
            Self::InvalidTransition(e) => e.to_string(),
            Self::Busy(m)
            | Self::NotFound(m)
            | Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::BadRequest(m) => m.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if self.is_server_fault() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        if let Self::Backend(e) = &self
            && e.is_unauthorized()
        {
            tracing::info!("Backend rejected the session token, signing out");
            let mut response = Redirect::to("/auth/login?expired=1").into_response();
            response.extensions_mut().insert(BackendSessionExpired);
            return response;
        }

        (self.status(), self.user_message()).into_response()
    }
}

/// Set the Sentry user context from an admin user ID.
pub fn set_sentry_user(admin_id: i64, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use aaa_core::{AdminAction, AdminStatus};

    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("conversation 12".to_string());
        assert_eq!(err.to_string(), "Not found: conversation 12");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        // Test that errors map to correct HTTP status codes
        fn get_status(err: AppError) -> StatusCode {
            let response = err.into_response();
            response.status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Busy("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Backend(BackendError::Api {
                status: 400,
                message: "Conversation is not active".to_string(),
            })),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Backend(BackendError::Api {
                status: 503,
                message: "down".to_string(),
            })),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_backend_unauthorized_redirects_and_marks_response() {
        let response =
            AppError::Backend(BackendError::Unauthorized("Token expired".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").map(|v| v.to_str().ok()),
            Some(Some("/auth/login?expired=1"))
        );
        assert!(response.extensions().get::<BackendSessionExpired>().is_some());
    }

    #[test]
    fn test_invalid_transition_is_bad_request() {
        let err = AdminStatus::Active.transition(AdminAction::Approve).unwrap_err();
        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
