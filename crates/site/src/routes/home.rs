//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, extract::State, response::IntoResponse, routing::get};
use serde_json::json;
use tracing::instrument;

use crate::filters;
use crate::routes::blog::PostView;
use crate::routes::services::ServiceView;
use crate::routes::testimonials::TestimonialView;
use crate::routes::{Layout, json_ld};
use crate::state::AppState;

const RECENT_POSTS_COUNT: usize = 3;
const TESTIMONIAL_COUNT: usize = 3;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub services: Vec<ServiceView>,
    pub testimonials: Vec<TestimonialView>,
    pub recent_posts: Vec<PostView>,
    /// `AutomotiveBusiness` JSON-LD.
    pub structured_data: String,
}

fn business_structured_data(layout: &Layout) -> String {
    json_ld(&json!({
        "@context": "https://schema.org",
        "@type": "AutomotiveBusiness",
        "name": "AAA Accident Solutions",
        "url": layout.absolute("/"),
        "telephone": layout.phone,
        "email": layout.email,
        "areaServed": "GB",
        "description": "Non-fault accident management: replacement vehicles, recovery, storage and repairs at no cost to you.",
    }))
}

/// Display the home page.
#[instrument(skip_all)]
pub async fn home(State(state): State<AppState>, layout: Layout) -> impl IntoResponse {
    let testimonials = state.leads().testimonials().await;
    let content = state.content();

    HomeTemplate {
        structured_data: business_structured_data(&layout),
        layout,
        services: content.services().iter().map(ServiceView::from).collect(),
        testimonials: testimonials
            .iter()
            .take(TESTIMONIAL_COUNT)
            .map(TestimonialView::from)
            .collect(),
        recent_posts: content
            .get_recent_posts(RECENT_POSTS_COUNT, None)
            .into_iter()
            .map(PostView::from)
            .collect(),
    }
}

/// Create the home routes router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(home))
}
