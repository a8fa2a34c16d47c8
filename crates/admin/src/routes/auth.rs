//! Authentication route handlers for admin.
//!
//! Login posts email and password to the backend; the returned tokens are
//! kept in the server-side session.

use aaa_core::{AdminStatus, Email};
use askama::Template;
use axum::{
    Form, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::BackendError;
use crate::error::AppError;
use crate::filters;
use crate::middleware::{OptionalAdminAuth, clear_current_admin, set_current_admin};
use crate::models::{BackendToken, CurrentAdmin};
use crate::routes::render;
use crate::state::AppState;

/// Login page template.
#[derive(Template)]
#[template(path = "auth/login.html")]
struct LoginPageTemplate {
    email: String,
    error: Option<String>,
    notice: Option<String>,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(login_page).post(login))
        .route("/auth/logout", post(logout))
}

#[derive(Debug, Deserialize)]
struct LoginPageParams {
    #[serde(default)]
    expired: Option<String>,
}

/// Render the login page.
///
/// GET /auth/login
async fn login_page(
    OptionalAdminAuth(admin): OptionalAdminAuth,
    Query(params): Query<LoginPageParams>,
) -> Response {
    if admin.is_some() && params.expired.is_none() {
        return Redirect::to("/").into_response();
    }

    let notice = params
        .expired
        .map(|_| "Your session has expired. Please sign in again.".to_string());
    Html(render(&LoginPageTemplate {
        email: String::new(),
        error: None,
        notice,
    }))
    .into_response()
}

#[derive(Deserialize)]
struct LoginForm {
    email: String,
    password: String,
}

/// Log in against the backend.
///
/// POST /auth/login
#[instrument(skip_all)]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let retry = |email: &str, message: String| {
        (
            StatusCode::UNAUTHORIZED,
            Html(render(&LoginPageTemplate {
                email: email.to_string(),
                error: Some(message),
                notice: None,
            })),
        )
            .into_response()
    };

    let Ok(email) = Email::parse(&form.email) else {
        return Ok(retry(&form.email, "Enter a valid email address".to_string()));
    };
    if form.password.is_empty() {
        return Ok(retry(email.as_str(), "Password is required".to_string()));
    }

    let login = match state
        .backend()
        .login(email.as_str(), &form.password)
        .await
    {
        Ok(login) => login,
        Err(e @ (BackendError::Unauthorized(_) | BackendError::Forbidden(_) | BackendError::Api { .. })) => {
            tracing::info!(error = %e, "Admin login rejected");
            return Ok(retry(email.as_str(), e.user_message()));
        }
        Err(e) => return Err(e.into()),
    };

    if login.user.status != AdminStatus::Active {
        tracing::info!(admin_id = %login.user.id, status = %login.user.status, "Inactive admin refused");
        return Ok(retry(
            email.as_str(),
            format!("Your account is {}", login.user.status.label().to_lowercase()),
        ));
    }

    let admin = CurrentAdmin {
        id: login.user.id,
        email: Email::parse(&login.user.email)
            .map_err(|e| AppError::Internal(format!("backend returned invalid email: {e}")))?,
        name: login.user.display_name(),
        role: login.user.admin_type,
    };
    let token = BackendToken::new(
        login.access.expose_secret().to_string(),
        login.refresh.as_ref().map(|r| r.expose_secret().to_string()),
    );
    set_current_admin(&session, &admin, &token).await?;

    tracing::info!(admin_id = %admin.id, role = %admin.role, "Admin logged in");
    Ok(Redirect::to("/").into_response())
}

/// Logout and clear session.
///
/// POST /auth/logout
async fn logout(session: Session) -> impl IntoResponse {
    if let Err(e) = clear_current_admin(&session).await {
        tracing::warn!(error = %e, "Failed to clear session on logout");
    }
    Redirect::to("/auth/login")
}
