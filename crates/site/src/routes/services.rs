//! Service pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::instrument;

use crate::content::Service;
use crate::filters;
use crate::routes::{Layout, not_found_page};
use crate::state::AppState;

/// Service card or detail view.
#[derive(Debug, Clone)]
pub struct ServiceView {
    pub slug: String,
    pub title: String,
    pub summary: String,
    pub highlights: Vec<String>,
    pub content_html: String,
}

impl ServiceView {
    #[must_use]
    pub fn href(&self) -> String {
        format!("/services/{}", self.slug)
    }
}

impl From<&Service> for ServiceView {
    fn from(service: &Service) -> Self {
        Self {
            slug: service.slug.clone(),
            title: service.meta.title.clone(),
            summary: service.meta.summary.clone(),
            highlights: service.meta.highlights.clone(),
            content_html: service.content_html.clone(),
        }
    }
}

/// Service listing template.
#[derive(Template, WebTemplate)]
#[template(path = "services/index.html")]
pub struct ServicesIndexTemplate {
    pub layout: Layout,
    pub services: Vec<ServiceView>,
}

/// Service detail template.
#[derive(Template, WebTemplate)]
#[template(path = "services/show.html")]
pub struct ServiceShowTemplate {
    pub layout: Layout,
    pub service: ServiceView,
    /// The other services, for the sidebar.
    pub others: Vec<ServiceView>,
}

/// List every service.
#[instrument(skip_all)]
pub async fn index(State(state): State<AppState>, layout: Layout) -> impl IntoResponse {
    ServicesIndexTemplate {
        layout,
        services: state.content().services().iter().map(ServiceView::from).collect(),
    }
}

/// Display one service, or 404.
#[instrument(skip(state, layout))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    layout: Layout,
) -> Response {
    let Some(service) = state.content().get_service(&slug) else {
        return not_found_page(layout);
    };

    ServiceShowTemplate {
        layout,
        service: ServiceView::from(service),
        others: state
            .content()
            .services()
            .iter()
            .filter(|s| s.slug != slug)
            .map(ServiceView::from)
            .collect(),
    }
    .into_response()
}

/// Create the service routes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/services", get(index))
        .route("/services/{slug}", get(show))
}
