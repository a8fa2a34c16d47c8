//! Static content page route handlers.
//!
//! Serves the Markdown pages: about and the three legal documents.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use tracing::instrument;

use crate::filters;
use crate::routes::{Layout, not_found_page};
use crate::state::AppState;

/// Content page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/content.html")]
pub struct ContentPageTemplate {
    pub layout: Layout,
    pub title: String,
    pub description: String,
    pub updated_at: Option<NaiveDate>,
    pub content_html: String,
}

/// Serve a content page by slug, or the 404 page.
fn serve_content_page(state: &AppState, layout: Layout, slug: &str) -> Response {
    let Some(page) = state.content().get_page(slug) else {
        tracing::warn!(slug, "Content page missing");
        return not_found_page(layout);
    };

    ContentPageTemplate {
        layout,
        title: page.meta.title.clone(),
        description: page.meta.description.clone().unwrap_or_default(),
        updated_at: page.meta.updated_at,
        content_html: page.content_html.clone(),
    }
    .into_response()
}

/// Display the About page.
#[instrument(skip_all)]
pub async fn about(State(state): State<AppState>, layout: Layout) -> Response {
    serve_content_page(&state, layout, "about")
}

/// Display the Terms of Service page.
#[instrument(skip_all)]
pub async fn terms(State(state): State<AppState>, layout: Layout) -> Response {
    serve_content_page(&state, layout, "terms-of-service")
}

/// Display the Privacy Policy page.
#[instrument(skip_all)]
pub async fn privacy(State(state): State<AppState>, layout: Layout) -> Response {
    serve_content_page(&state, layout, "privacy-policy")
}

/// Display the Cookie Policy page.
#[instrument(skip_all)]
pub async fn cookies(State(state): State<AppState>, layout: Layout) -> Response {
    serve_content_page(&state, layout, "cookie-policy")
}

/// Create the pages routes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/about", get(about))
        .route("/terms-of-service", get(terms))
        .route("/privacy-policy", get(privacy))
        .route("/cookie-policy", get(cookies))
}
