//! Accident claim form.
//!
//! A valid claim is forwarded to the backend and the visitor is redirected
//! back to an empty form with a success notice. Anything else re-renders
//! the form with what they typed.

use aaa_core::ClaimSubmission;
use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequestId;
use crate::models::Flash;
use crate::routes::{Layout, set_flash, submission_failed, validation_notice};
use crate::services::whatsapp::HandoffMessage;
use crate::state::AppState;

pub const CLAIM_PATH: &str = "/make-claim";

/// Claim form template.
#[derive(Template, WebTemplate)]
#[template(path = "forms/claim.html")]
pub struct ClaimTemplate {
    pub layout: Layout,
    pub form: ClaimSubmission,
    /// Field to highlight, empty when none.
    pub error_field: &'static str,
    /// Latest selectable accident date.
    pub today: String,
}

impl ClaimTemplate {
    fn new(layout: Layout, form: ClaimSubmission, error_field: &'static str) -> Self {
        Self {
            layout,
            form,
            error_field,
            today: chrono::Local::now().date_naive().to_string(),
        }
    }
}

/// Display the empty claim form.
#[instrument(skip_all)]
pub async fn show(layout: Layout) -> impl IntoResponse {
    ClaimTemplate::new(layout, ClaimSubmission::default(), "")
}

/// Submit a claim to the backend.
///
/// # Errors
///
/// Returns `AppError::Session` if the success notice cannot be stored.
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    request_id: RequestId,
    layout: Layout,
    Form(form): Form<ClaimSubmission>,
) -> Result<Response> {
    let claim = match form.clone().validated() {
        Ok(claim) => claim,
        Err(e) => {
            let error_field = e.field();
            let page = ClaimTemplate::new(layout.with_notice(validation_notice(&e)), form, error_field);
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    match state.leads().submit_claim(&claim).await {
        Ok(()) => {
            add_breadcrumb("forms", "Claim submitted");
            set_flash(
                &session,
                Flash::success(
                    "Claim submitted successfully",
                    "Our team will contact you shortly to arrange your replacement vehicle.",
                ),
            )
            .await?;
            Ok(Redirect::to(CLAIM_PATH).into_response())
        }
        Err(e) => {
            let err = AppError::from(e);
            let notice = submission_failed("Claim could not be submitted", &err, &request_id);
            let page = ClaimTemplate::new(layout.with_notice(notice), form, "");
            Ok((err.status(), page).into_response())
        }
    }
}

/// Hand the claim to WhatsApp instead of the backend.
///
/// Nothing is validated or stored; the visitor continues the conversation
/// with a person.
#[instrument(skip_all)]
pub async fn whatsapp(
    State(state): State<AppState>,
    Form(form): Form<ClaimSubmission>,
) -> Redirect {
    let name = form.full_name();
    let message = HandoffMessage::from_claim(&form).with_name(&name);
    Redirect::to(&message.url(&state.config().contact.whatsapp_number))
}

/// Create the claim routes router. The rate-limited POST is added by
/// [`super::routes`].
pub fn router() -> Router<AppState> {
    Router::new()
        .route(CLAIM_PATH, get(show))
        .route("/make-claim/whatsapp", post(whatsapp))
}
