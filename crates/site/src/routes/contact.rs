//! Contact form.

use aaa_core::ContactInquiry;
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

pub const CONTACT_PATH: &str = "/contact";

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "forms/contact.html")]
pub struct ContactTemplate {
    pub layout: Layout,
    pub form: ContactInquiry,
    pub error_field: &'static str,
}

/// Display the contact page.
#[instrument(skip_all)]
pub async fn show(layout: Layout) -> impl IntoResponse {
    ContactTemplate {
        layout,
        form: ContactInquiry::default(),
        error_field: "",
    }
}

/// Submit an inquiry to the backend.
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
    Form(form): Form<ContactInquiry>,
) -> Result<Response> {
    let inquiry = match form.clone().validated() {
        Ok(inquiry) => inquiry,
        Err(e) => {
            let page = ContactTemplate {
                layout: layout.with_notice(validation_notice(&e)),
                form,
                error_field: e.field(),
            };
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    match state.leads().submit_inquiry(&inquiry).await {
        Ok(()) => {
            add_breadcrumb("forms", "Inquiry submitted");
            set_flash(
                &session,
                Flash::success(
                    "Message sent successfully",
                    "Thank you for contacting us. We'll get back to you as soon as possible.",
                ),
            )
            .await?;
            Ok(Redirect::to(CONTACT_PATH).into_response())
        }
        Err(e) => {
            let err = AppError::from(e);
            let page = ContactTemplate {
                layout: layout.with_notice(submission_failed(
                    "Message could not be sent",
                    &err,
                    &request_id,
                )),
                form,
                error_field: "",
            };
            Ok((err.status(), page).into_response())
        }
    }
}

/// Hand the inquiry to WhatsApp instead of the backend.
#[instrument(skip_all)]
pub async fn whatsapp(
    State(state): State<AppState>,
    Form(form): Form<ContactInquiry>,
) -> Redirect {
    let message = HandoffMessage::from_inquiry(&form);
    Redirect::to(&message.url(&state.config().contact.whatsapp_number))
}

/// Create the contact routes router. The rate-limited POST is added by
/// [`super::routes`].
pub fn router() -> Router<AppState> {
    Router::new()
        .route(CONTACT_PATH, get(show))
        .route("/contact/whatsapp", post(whatsapp))
}
