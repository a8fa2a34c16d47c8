//! HTTP route handlers for the site.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home page
//! GET  /health                    - Health check
//! GET  /health/ready              - Readiness check (session database)
//!
//! # Content
//! GET  /about                     - About page
//! GET  /terms-of-service          - Legal pages
//! GET  /privacy-policy
//! GET  /cookie-policy
//! GET  /services                  - Service listing
//! GET  /services/{slug}           - Service detail
//! GET  /faqs                      - FAQ page
//! GET  /blog                      - Blog index (?tag= filters)
//! GET  /blog/{slug}               - Blog post
//!
//! # Lead forms (POST is rate limited)
//! GET  /make-claim                - Accident claim form
//! POST /make-claim                - Submit claim
//! POST /make-claim/whatsapp       - Hand the claim to WhatsApp
//! GET  /contact                   - Contact form
//! POST /contact                   - Submit inquiry
//! POST /contact/whatsapp          - Hand the inquiry to WhatsApp
//! GET  /testimonials              - Published testimonials and form
//! POST /testimonials              - Submit testimonial
//! POST /testimonials/whatsapp     - Hand the testimonial to WhatsApp
//!
//! # Legacy paths (301)
//! GET  /claim, /claims            -> /make-claim
//! GET  /contact-us                -> /contact
//! GET  /faq                       -> /faqs
//! GET  /terms                     -> /terms-of-service
//! GET  /privacy                   -> /privacy-policy
//! ```

pub mod blog;
pub mod claim;
pub mod contact;
pub mod faqs;
pub mod home;
pub mod pages;
pub mod services;
pub mod testimonials;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{FromRef, FromRequestParts, OriginalUri},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Serialize;
use tower_sessions::Session;

use aaa_core::LeadError;

use crate::error::AppError;
use crate::filters;
use crate::middleware::{CspNonce, RequestId, form_rate_limiter};
use crate::models::{Flash, session_keys};
use crate::services::whatsapp::HandoffMessage;
use crate::state::AppState;

/// Build the full route table.
pub fn routes() -> Router<AppState> {
    // One limiter shared by every submission endpoint
    let submissions = Router::new()
        .route("/make-claim", post(claim::submit))
        .route("/contact", post(contact::submit))
        .route("/testimonials", post(testimonials::submit))
        .route_layer(form_rate_limiter());

    Router::new()
        .merge(home::router())
        .merge(pages::router())
        .merge(services::router())
        .merge(faqs::router())
        .nest("/blog", blog::router())
        .merge(claim::router())
        .merge(contact::router())
        .merge(testimonials::router())
        .merge(submissions)
        .merge(legacy_redirects())
}

/// Old URLs that still appear in search results and printed material.
fn legacy_redirects() -> Router<AppState> {
    fn to(target: &'static str) -> axum::routing::MethodRouter<AppState> {
        get(move || async move { Redirect::permanent(target) })
    }

    Router::new()
        .route("/claim", to("/make-claim"))
        .route("/claims", to("/make-claim"))
        .route("/contact-us", to("/contact"))
        .route("/faq", to("/faqs"))
        .route("/terms", to("/terms-of-service"))
        .route("/privacy", to("/privacy-policy"))
}

/// A navigation link.
#[derive(Debug, Clone)]
pub struct NavLink {
    pub href: String,
    pub label: String,
}

/// Flash notice ready for display.
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

/// Everything `base.html` needs: nonce, contact details, navigation, and
/// the pending flash notice.
///
/// Extracting it consumes the flash, so take it once per page render.
#[derive(Debug, Clone)]
pub struct Layout {
    pub nonce: String,
    pub base_url: String,
    pub current_path: String,
    pub phone: String,
    pub phone_href: String,
    pub email: String,
    pub whatsapp_url: String,
    pub nav_services: Vec<NavLink>,
    pub flash: Option<FlashView>,
}

impl Layout {
    /// Whether a nav link should be marked as the current page.
    #[must_use]
    pub fn is_current(&self, href: &str) -> bool {
        if href == "/" {
            self.current_path == "/"
        } else {
            self.current_path.starts_with(href)
        }
    }

    /// Absolute URL for canonical links and structured data.
    #[must_use]
    pub fn absolute(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Canonical URL of the current page.
    #[must_use]
    pub fn canonical_url(&self) -> String {
        self.absolute(&self.current_path)
    }

    /// Replace the flash with a notice raised while handling this request.
    #[must_use]
    pub fn with_notice(mut self, flash: Flash) -> Self {
        self.flash = Some(flash.into());
        self
    }
}

impl<S> FromRequestParts<S> for Layout
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = AppState::from_ref(state);
        let CspNonce(nonce) = CspNonce::from_request_parts(parts, state).await?;
        let current_path = parts
            .extensions
            .get::<OriginalUri>()
            .map_or_else(|| parts.uri.path().to_string(), |uri| uri.path().to_string());

        let flash = match Session::from_request_parts(parts, state).await {
            Ok(session) => take_flash(&session).await,
            Err(_) => None,
        };

        let config = app.config();
        Ok(Self {
            nonce,
            base_url: config.base_url.clone(),
            current_path,
            phone: config.contact.phone.clone(),
            phone_href: config.contact.phone_href(),
            email: config.contact.email.clone(),
            whatsapp_url: HandoffMessage::general().url(&config.contact.whatsapp_number),
            nav_services: app
                .content()
                .services()
                .iter()
                .map(|s| NavLink {
                    href: format!("/services/{}", s.slug),
                    label: s.meta.title.clone(),
                })
                .collect(),
            flash,
        })
    }
}

/// Queue a notice for the page the visitor is redirected to.
///
/// # Errors
///
/// Returns the session error; a lost confirmation is worth a 500.
pub(crate) async fn set_flash(
    session: &Session,
    flash: Flash,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::FLASH, flash).await
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

/// An `<option>` in a form select.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    fn list(choices: &[(&str, &str)], current: &str) -> Vec<Self> {
        choices
            .iter()
            .map(|(value, label)| Self {
                value: (*value).to_string(),
                label: (*label).to_string(),
                selected: *value == current,
            })
            .collect()
    }
}

/// Label shown to visitors for a form field.
fn field_label(field: &str) -> &str {
    match field {
        "first_name" => "First name",
        "last_name" => "Last name",
        "email" => "Email",
        "phone" => "Phone number",
        "address" => "Address",
        "accident_date" => "Accident date",
        "vehicle_registration" => "Vehicle registration",
        "insurance_company" => "Insurance company",
        "policy_number" => "Policy number",
        "name" => "Name",
        "subject" => "Subject",
        "message" => "Message",
        "feedback" => "Feedback",
        "rating" => "Rating",
        _ => field,
    }
}

/// Notice for a form that failed local validation.
pub(crate) fn validation_notice(err: &LeadError) -> Flash {
    let body = match err {
        LeadError::MissingField(field) => format!("{} is required.", field_label(field)),
        LeadError::InvalidEmail(_) => "Please enter a valid email address.".to_string(),
        LeadError::InvalidDate => "Please enter the accident date as YYYY-MM-DD.".to_string(),
        LeadError::InvalidRating => "Please choose a rating from 1 to 5 stars.".to_string(),
    };
    Flash::error("Please check the form", Some(body))
}

/// Notice for a submission the backend refused or never answered.
///
/// Reports the error and quotes the request id so the visitor can read it
/// out over the phone.
pub(crate) fn submission_failed(title: &str, err: &AppError, request_id: &RequestId) -> Flash {
    err.report();
    Flash::error(
        title,
        Some(format!(
            "{} (Reference: {})",
            err.user_message(),
            request_id.short()
        )),
    )
}

/// Serialize structured data for an inline `application/ld+json` script.
///
/// `<` is escaped so content can never close the script element.
pub(crate) fn json_ld<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "{}".to_string())
        .replace('<', "\\u003c")
}

/// 404 page template.
#[derive(Template, WebTemplate)]
#[template(path = "errors/not_found.html")]
pub struct NotFoundTemplate {
    pub layout: Layout,
}

/// Render the 404 page.
pub(crate) fn not_found_page(layout: Layout) -> Response {
    (StatusCode::NOT_FOUND, NotFoundTemplate { layout }).into_response()
}

/// Fallback for unmatched paths.
pub async fn not_found(layout: Layout) -> Response {
    not_found_page(layout)
}
