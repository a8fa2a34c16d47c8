//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! # Auth (password login against the backend)
//! GET  /auth/login                                   - Login page
//! POST /auth/login                                   - Login
//! POST /auth/logout                                  - Logout
//!
//! # Dashboard
//! GET  /                                             - Summary counts
//!
//! # Chatbot sessions
//! GET  /admin/dashboard/chatbot                      - Conversation list (?status=&page=&q=&open=)
//! GET  /admin/dashboard/chatbot/{id}                 - Detail panel (HTMX fragment)
//! GET  /admin/dashboard/chatbot/{id}/body            - Message pane only (delayed re-fetch)
//! GET  /admin/dashboard/chatbot/{id}/events          - Live updates (SSE)
//! POST /admin/dashboard/chatbot/{id}/toggle-manual   - Flip manual/auto reply
//! POST /admin/dashboard/chatbot/{id}/reply           - Send a manual reply
//! POST /admin/dashboard/chatbot/{id}/close           - Close the panel
//! POST /admin/dashboard/chatbot/{id}/delete          - Delete (requires confirm=yes)
//!
//! # Super admin
//! GET  /super-admin/dashboard                        - Admin accounts (?status=&q=)
//! POST /super-admin/admins/{id}/status               - Approve / suspend / reinstate
//! POST /super-admin/admins/{id}/delete               - Delete (requires confirm=yes)
//! ```

use axum::{
    Router,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::{CurrentAdmin, Flash, FlashKind, session_keys};
use crate::state::AppState;

pub mod auth;
pub mod chatbot;
pub mod dashboard;
pub mod super_admin;

/// Build the full route table.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(chatbot::router())
        .merge(super_admin::router())
}

/// Admin user view for templates.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub name: String,
    pub email: String,
    pub is_super_admin: bool,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            name: admin.name.clone(),
            email: admin.email.to_string(),
            is_super_admin: admin.is_super_admin(),
        }
    }
}

/// One-shot notice for templates.
#[derive(Debug, Clone)]
pub struct FlashView {
    pub is_error: bool,
    pub title: String,
    pub body: String,
}

impl From<Flash> for FlashView {
    fn from(flash: Flash) -> Self {
        Self {
            is_error: flash.is_error(),
            title: flash.title,
            body: flash.body.unwrap_or_default(),
        }
    }
}

/// Queue a notice for the next page render.
pub(crate) async fn set_flash(session: &Session, flash: Flash) {
    if let Err(e) = session.insert(session_keys::FLASH, flash).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

/// Take the pending notice, if any.
pub(crate) async fn take_flash(session: &Session) -> Option<FlashView> {
    match session.remove::<Flash>(session_keys::FLASH).await {
        Ok(flash) => flash.map(Into::into),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read flash message");
            None
        }
    }
}

pub(crate) fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

/// Redirect that also works for HTMX requests.
pub(crate) fn see_other(headers: &HeaderMap, location: &str) -> Response {
    if is_htmx(headers) {
        (StatusCode::OK, [("HX-Redirect", location.to_string())]).into_response()
    } else {
        Redirect::to(location).into_response()
    }
}

#[derive(Serialize)]
struct ToastTrigger<'a> {
    toast: Toast<'a>,
}

#[derive(Serialize)]
struct Toast<'a> {
    kind: FlashKind,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
}

/// `HX-Trigger` value that raises a toast on the client.
pub(crate) fn toast_trigger(kind: FlashKind, title: &str, body: Option<&str>) -> String {
    serde_json::to_string(&ToastTrigger {
        toast: Toast { kind, title, body },
    })
    .unwrap_or_else(|_| r#"{"toast":{"kind":"error","title":"Something went wrong"}}"#.to_string())
}

/// Error response for an HTMX fragment request.
///
/// The message travels as a toast so the swapped region is left alone. An
/// expired backend session still goes through the normal sign-out path.
pub(crate) fn fragment_error(err: AppError) -> Response {
    if matches!(&err, AppError::Backend(e) if e.is_unauthorized()) {
        return err.into_response();
    }
    let status = err.status();
    if status.is_server_error() {
        let event_id = sentry::capture_error(&err);
        tracing::error!(error = %err, sentry_event_id = %event_id, "Fragment request failed");
    } else {
        tracing::info!(error = %err, "Fragment request rejected");
    }
    let trigger = toast_trigger(FlashKind::Error, "Action failed", Some(&err.user_message()));
    (status, [("HX-Trigger", trigger)], err.user_message()).into_response()
}

/// Render an askama template, logging failures.
pub(crate) fn render<T: askama::Template>(template: &T) -> String {
    template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    })
}
