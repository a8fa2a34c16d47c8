//! Testimonials: the published list and the submission form.
//!
//! New testimonials go to the backend for approval; the list only shows
//! what the backend already publishes.

use aaa_core::{Testimonial, TestimonialSubmission};
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
use crate::routes::{Layout, SelectOption, set_flash, submission_failed, validation_notice};
use crate::services::whatsapp::HandoffMessage;
use crate::state::AppState;

pub const TESTIMONIALS_PATH: &str = "/testimonials";

/// Service types the backend accepts, with their labels.
pub const SERVICE_TYPES: [(&str, &str); 4] = [
    ("car_hire", "Car Hire"),
    ("car_rental", "Car Rental"),
    ("claims_management", "Claims Management"),
    ("car_purchase_sale", "Car Purchase/Sale"),
];

const RATINGS: [(&str, &str); 5] = [
    ("5", "5 stars - Excellent"),
    ("4", "4 stars - Good"),
    ("3", "3 stars - Average"),
    ("2", "2 stars - Poor"),
    ("1", "1 star - Very poor"),
];

/// A published testimonial.
#[derive(Debug, Clone)]
pub struct TestimonialView {
    pub name: String,
    pub feedback: String,
    pub stars: u8,
    pub service: String,
}

impl From<&Testimonial> for TestimonialView {
    fn from(t: &Testimonial) -> Self {
        let service = t.service_type.as_deref().unwrap_or_default();
        Self {
            name: t.name.clone(),
            feedback: t.feedback.clone(),
            stars: t.stars(),
            service: SERVICE_TYPES
                .iter()
                .find(|(value, _)| *value == service)
                .map_or_else(|| service.to_string(), |(_, label)| (*label).to_string()),
        }
    }
}

/// Testimonials page template.
#[derive(Template, WebTemplate)]
#[template(path = "testimonials.html")]
pub struct TestimonialsTemplate {
    pub layout: Layout,
    pub testimonials: Vec<TestimonialView>,
    pub form: TestimonialSubmission,
    pub ratings: Vec<SelectOption>,
    pub service_types: Vec<SelectOption>,
    pub error_field: &'static str,
}

impl TestimonialsTemplate {
    async fn new(
        state: &AppState,
        layout: Layout,
        form: TestimonialSubmission,
        error_field: &'static str,
    ) -> Self {
        let testimonials = state.leads().testimonials().await;
        let rating = if form.rating == 0 { 5 } else { form.rating };
        Self {
            layout,
            testimonials: testimonials.iter().map(TestimonialView::from).collect(),
            ratings: SelectOption::list(&RATINGS, &rating.to_string()),
            service_types: SelectOption::list(&SERVICE_TYPES, &form.service_type),
            form,
            error_field,
        }
    }
}

/// Display published testimonials and the form.
#[instrument(skip_all)]
pub async fn show(State(state): State<AppState>, layout: Layout) -> impl IntoResponse {
    TestimonialsTemplate::new(&state, layout, TestimonialSubmission::default(), "").await
}

/// Submit a testimonial to the backend.
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
    Form(form): Form<TestimonialSubmission>,
) -> Result<Response> {
    let testimonial = match form.clone().validated() {
        Ok(testimonial) => testimonial,
        Err(e) => {
            let layout = layout.with_notice(validation_notice(&e));
            let page = TestimonialsTemplate::new(&state, layout, form, e.field()).await;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    match state.leads().submit_testimonial(&testimonial).await {
        Ok(()) => {
            add_breadcrumb("forms", "Testimonial submitted");
            set_flash(
                &session,
                Flash::success(
                    "Thank you for your feedback!",
                    "Your testimonial has been submitted and will appear once approved.",
                ),
            )
            .await?;
            Ok(Redirect::to(TESTIMONIALS_PATH).into_response())
        }
        Err(e) => {
            let err = AppError::from(e);
            let notice =
                submission_failed("Testimonial could not be submitted", &err, &request_id);
            let page = TestimonialsTemplate::new(&state, layout.with_notice(notice), form, "").await;
            Ok((err.status(), page).into_response())
        }
    }
}

/// Hand the testimonial to WhatsApp instead of the backend.
#[instrument(skip_all)]
pub async fn whatsapp(
    State(state): State<AppState>,
    Form(form): Form<TestimonialSubmission>,
) -> Redirect {
    let message = HandoffMessage::from_testimonial(&form);
    Redirect::to(&message.url(&state.config().contact.whatsapp_number))
}

/// Create the testimonial routes router. The rate-limited POST is added by
/// [`super::routes`].
pub fn router() -> Router<AppState> {
    Router::new()
        .route(TESTIMONIALS_PATH, get(show))
        .route("/testimonials/whatsapp", post(whatsapp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_labels_known_service_types() {
        let t = Testimonial {
            id: None,
            name: "Priya".to_string(),
            feedback: "Great".to_string(),
            rating: 9,
            service_type: Some("claims_management".to_string()),
        };
        let view = TestimonialView::from(&t);
        assert_eq!(view.service, "Claims Management");
        assert_eq!(view.stars, 5);
    }
}
