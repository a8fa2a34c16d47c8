//! Blog route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::content::Post;
use crate::filters;
use crate::routes::{Layout, json_ld, not_found_page};
use crate::state::AppState;

/// Number of recent posts to show in sidebar.
const RECENT_POSTS_COUNT: usize = 3;

/// Post view for templates.
#[derive(Clone)]
pub struct PostView {
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub published_at: NaiveDate,
    pub featured_image: Option<String>,
    pub tags: Vec<String>,
    pub content_html: String,
    pub reading_time_minutes: u32,
}

impl From<&Post> for PostView {
    fn from(post: &Post) -> Self {
        Self {
            slug: post.slug.clone(),
            title: post.meta.title.clone(),
            description: post.meta.description.clone(),
            author: post.meta.author.clone(),
            published_at: post.meta.published_at,
            featured_image: post.meta.featured_image.clone(),
            tags: post.meta.tags.clone(),
            content_html: post.content_html.clone(),
            reading_time_minutes: post.reading_time_minutes,
        }
    }
}

impl PostView {
    /// Date as shown on cards, e.g. `3 March 2026`.
    #[must_use]
    pub fn published_label(&self) -> String {
        self.published_at.format("%-d %B %Y").to_string()
    }
}

/// Blog index page template.
#[derive(Template, WebTemplate)]
#[template(path = "blog/index.html")]
pub struct BlogIndexTemplate {
    pub layout: Layout,
    pub posts: Vec<PostView>,
    pub tags: Vec<String>,
    pub active_tag: Option<String>,
}

/// Blog post detail template.
#[derive(Template, WebTemplate)]
#[template(path = "blog/show.html")]
pub struct BlogShowTemplate {
    pub layout: Layout,
    pub post: PostView,
    pub recent_posts: Vec<PostView>,
    /// `BlogPosting` JSON-LD.
    pub structured_data: String,
}

#[derive(Debug, Deserialize)]
pub struct BlogQuery {
    pub tag: Option<String>,
}

/// Display the blog index, optionally filtered by tag.
#[instrument(skip(state, layout))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<BlogQuery>,
    layout: Layout,
) -> impl IntoResponse {
    let content = state.content();
    let active_tag = query.tag.filter(|t| !t.trim().is_empty());
    let posts: Vec<PostView> = match &active_tag {
        Some(tag) => content.get_posts_by_tag(tag).map(PostView::from).collect(),
        None => content.get_published_posts().map(PostView::from).collect(),
    };

    BlogIndexTemplate {
        layout,
        posts,
        tags: content.get_all_tags(),
        active_tag,
    }
}

/// Display a single blog post by slug.
///
/// Drafts and unknown slugs get the 404 page.
#[instrument(skip(state, layout))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    layout: Layout,
) -> Response {
    let Some(post) = state.content().get_post(&slug) else {
        return not_found_page(layout);
    };

    let recent_posts: Vec<PostView> = state
        .content()
        .get_recent_posts(RECENT_POSTS_COUNT, Some(&slug))
        .into_iter()
        .map(PostView::from)
        .collect();

    let post = PostView::from(post);
    let structured_data = json_ld(&json!({
        "@context": "https://schema.org",
        "@type": "BlogPosting",
        "headline": post.title,
        "description": post.description,
        "datePublished": post.published_at.to_string(),
        "author": { "@type": "Organization", "name": post.author.as_deref().unwrap_or("AAA Accident Solutions") },
        "mainEntityOfPage": layout.absolute(&format!("/blog/{}", post.slug)),
    }));

    BlogShowTemplate {
        layout,
        post,
        recent_posts,
        structured_data,
    }
    .into_response()
}

/// Create the blog routes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/{slug}", get(show))
}
