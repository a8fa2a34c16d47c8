//! FAQ page, with `FAQPage` structured data.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, extract::State, response::IntoResponse, routing::get};
use serde_json::json;
use tracing::instrument;

use crate::content::FaqPage;
use crate::filters;
use crate::routes::{Layout, json_ld};
use crate::state::AppState;

/// One question on the page.
#[derive(Debug, Clone)]
pub struct FaqView {
    pub id: String,
    pub question: String,
    pub answer_html: String,
    pub open: bool,
}

/// FAQ page template.
#[derive(Template, WebTemplate)]
#[template(path = "faqs.html")]
pub struct FaqsTemplate {
    pub layout: Layout,
    pub title: String,
    pub description: String,
    pub intro_html: String,
    pub items: Vec<FaqView>,
    /// `FAQPage` JSON-LD.
    pub structured_data: String,
}

fn structured_data(page: &FaqPage) -> String {
    json_ld(&json!({
        "@context": "https://schema.org",
        "@type": "FAQPage",
        "mainEntity": page.items.iter().map(|faq| json!({
            "@type": "Question",
            "name": faq.question,
            "acceptedAnswer": { "@type": "Answer", "text": faq.answer_text },
        })).collect::<Vec<_>>(),
    }))
}

/// Display the FAQ page.
#[instrument(skip_all)]
pub async fn index(State(state): State<AppState>, layout: Layout) -> impl IntoResponse {
    let page = state.content().faqs();
    FaqsTemplate {
        layout,
        title: if page.title.is_empty() {
            "Frequently Asked Questions".to_string()
        } else {
            page.title.clone()
        },
        description: page.description.clone().unwrap_or_default(),
        intro_html: page.intro_html.clone(),
        items: page
            .items
            .iter()
            .enumerate()
            .map(|(i, faq)| FaqView {
                id: format!("faq-{}", i + 1),
                question: faq.question.clone(),
                answer_html: faq.answer_html.clone(),
                open: faq.open,
            })
            .collect(),
        structured_data: structured_data(page),
    }
}

/// Create the FAQ routes router.
pub fn router() -> Router<AppState> {
    Router::new().route("/faqs", get(index))
}
