//! Markdown content for the marketing pages.
//!
//! Everything under the content directory is loaded once at startup:
//!
//! ```text
//! content/
//!   pages/      legal and about pages (terms-of-service.md, ...)
//!   services/   one file per service, ordered by `order`
//!   blog/       posts, optionally prefixed with YYYY-MM-DD-
//!   faqs.md     questions in the frontmatter, intro text in the body
//! ```
//!
//! Frontmatter is YAML. Bodies are GitHub Flavored Markdown.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use comrak::{Options, markdown_to_html};
use gray_matter::{Matter, ParsedEntity, engine::YAML};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Average reading speed used for the "N min read" badge.
const WORDS_PER_MINUTE: usize = 200;

/// Metadata for static pages (terms, privacy, etc.)
#[derive(Debug, Clone, Deserialize)]
pub struct PageMeta {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub updated_at: Option<NaiveDate>,
}

/// Metadata for a service page.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceMeta {
    pub title: String,
    /// One-line pitch for cards and the meta description.
    pub summary: String,
    /// Position in navigation and on the home page.
    #[serde(default)]
    pub order: u32,
    /// Bullet points shown beside the body.
    #[serde(default)]
    pub highlights: Vec<String>,
}

/// Metadata for blog posts
#[derive(Debug, Clone, Deserialize)]
pub struct PostMeta {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    pub published_at: NaiveDate,
    #[serde(default)]
    pub updated_at: Option<NaiveDate>,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub draft: bool,
}

/// One question on the FAQ page.
#[derive(Debug, Clone, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    /// Markdown.
    pub answer: String,
    #[serde(default)]
    pub open: bool,
}

#[derive(Debug, Deserialize)]
struct FaqMeta {
    title: String,
    #[serde(default)]
    description: Option<String>,
    items: Vec<FaqEntry>,
}

/// A rendered page with metadata and HTML content
#[derive(Debug, Clone)]
pub struct Page {
    pub slug: String,
    pub meta: PageMeta,
    pub content_html: String,
}

/// A rendered service page.
#[derive(Debug, Clone)]
pub struct Service {
    pub slug: String,
    pub meta: ServiceMeta,
    pub content_html: String,
}

/// A rendered blog post with metadata and HTML content
#[derive(Debug, Clone)]
pub struct Post {
    pub slug: String,
    pub meta: PostMeta,
    pub content_html: String,
    pub reading_time_minutes: u32,
}

/// A rendered FAQ entry.
#[derive(Debug, Clone)]
pub struct Faq {
    pub question: String,
    pub answer_html: String,
    /// Source text for structured data.
    pub answer_text: String,
    pub open: bool,
}

/// The FAQ page.
#[derive(Debug, Clone, Default)]
pub struct FaqPage {
    pub title: String,
    pub description: Option<String>,
    pub intro_html: String,
    pub items: Vec<Faq>,
}

/// Content store that holds all loaded content in memory
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    pages: Arc<HashMap<String, Page>>,
    services: Arc<Vec<Service>>,
    posts: Arc<Vec<Post>>,
    faqs: Arc<FaqPage>,
}

struct Parsed<M> {
    slug: String,
    meta: M,
    body: String,
}

impl ContentStore {
    /// Load all content from the filesystem.
    ///
    /// Missing directories are logged and treated as empty. Files that fail
    /// to parse are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if a content directory exists but cannot be read.
    pub fn load(content_dir: &Path) -> Result<Self, ContentError> {
        let pages: HashMap<String, Page> = load_dir::<PageMeta>(&content_dir.join("pages"))?
            .into_iter()
            .map(|p| {
                let page = Page {
                    content_html: render_markdown(&p.body),
                    slug: p.slug,
                    meta: p.meta,
                };
                (page.slug.clone(), page)
            })
            .collect();

        let mut services: Vec<Service> = load_dir::<ServiceMeta>(&content_dir.join("services"))?
            .into_iter()
            .map(|p| Service {
                content_html: render_markdown(&p.body),
                slug: p.slug,
                meta: p.meta,
            })
            .collect();
        services.sort_by(|a, b| a.meta.order.cmp(&b.meta.order).then_with(|| a.slug.cmp(&b.slug)));

        let mut posts: Vec<Post> = load_dir::<PostMeta>(&content_dir.join("blog"))?
            .into_iter()
            .map(|p| Post {
                content_html: render_markdown(&p.body),
                reading_time_minutes: reading_time(&p.body),
                slug: post_slug(&p.slug).to_string(),
                meta: p.meta,
            })
            .collect();
        // Newest first
        posts.sort_by(|a, b| b.meta.published_at.cmp(&a.meta.published_at));

        let faqs = load_faqs(&content_dir.join("faqs.md"));

        tracing::info!(
            pages = pages.len(),
            services = services.len(),
            posts = posts.len(),
            faqs = faqs.items.len(),
            "Content loaded"
        );

        Ok(Self {
            pages: Arc::new(pages),
            services: Arc::new(services),
            posts: Arc::new(posts),
            faqs: Arc::new(faqs),
        })
    }

    /// Get a page by slug
    #[must_use]
    pub fn get_page(&self, slug: &str) -> Option<&Page> {
        self.pages.get(slug)
    }

    /// Services in display order.
    #[must_use]
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    #[must_use]
    pub fn get_service(&self, slug: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.slug == slug)
    }

    #[must_use]
    pub fn faqs(&self) -> &FaqPage {
        &self.faqs
    }

    /// Get a published blog post by slug. Drafts are never returned.
    #[must_use]
    pub fn get_post(&self, slug: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.slug == slug && !p.meta.draft)
    }

    /// Get all published blog posts (excludes drafts)
    pub fn get_published_posts(&self) -> impl Iterator<Item = &Post> {
        self.posts.iter().filter(|p| !p.meta.draft)
    }

    /// Get posts by tag
    pub fn get_posts_by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Post> {
        let tag_lower = tag.to_lowercase();
        self.get_published_posts()
            .filter(move |p| p.meta.tags.iter().any(|t| t.to_lowercase() == tag_lower))
    }

    /// Get all unique tags from published posts
    #[must_use]
    pub fn get_all_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self
            .get_published_posts()
            .flat_map(|p| p.meta.tags.clone())
            .collect();
        tags.sort();
        tags.dedup();
        tags
    }

    /// Get recent published posts, optionally excluding a specific slug
    #[must_use]
    pub fn get_recent_posts(&self, limit: usize, exclude_slug: Option<&str>) -> Vec<&Post> {
        self.get_published_posts()
            .filter(|p| exclude_slug.is_none_or(|s| p.slug != s))
            .take(limit)
            .collect()
    }
}

/// Load every `.md` file in `dir` with frontmatter of type `M`.
fn load_dir<M: DeserializeOwned>(dir: &Path) -> Result<Vec<Parsed<M>>, ContentError> {
    if !dir.exists() {
        tracing::warn!("Content directory does not exist: {:?}", dir);
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(dir).map_err(|e| ContentError::Io(e.to_string()))?;
    let mut loaded = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().is_none_or(|ext| ext != "md") {
            continue;
        }
        match load_file::<M>(&path) {
            Ok(parsed) => {
                tracing::debug!("Loaded {}", parsed.slug);
                loaded.push(parsed);
            }
            Err(e) => tracing::error!("Failed to load {:?}: {}", path, e),
        }
    }
    Ok(loaded)
}

fn load_file<M: DeserializeOwned>(path: &Path) -> Result<Parsed<M>, ContentError> {
    let content = std::fs::read_to_string(path).map_err(|e| ContentError::Io(e.to_string()))?;

    let slug = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ContentError::Parse("Invalid filename".to_string()))?
        .to_string();

    let (meta, body) = parse_frontmatter::<M>(&content)?;
    Ok(Parsed { slug, meta, body })
}

fn parse_frontmatter<M: DeserializeOwned>(content: &str) -> Result<(M, String), ContentError> {
    let matter = Matter::<YAML>::new();
    let parsed: ParsedEntity<M> = matter
        .parse(content)
        .map_err(|e| ContentError::Parse(format!("Failed to parse frontmatter: {e}")))?;
    let meta = parsed
        .data
        .ok_or_else(|| ContentError::Parse("Missing frontmatter".to_string()))?;
    Ok((meta, parsed.content))
}

fn load_faqs(path: &Path) -> FaqPage {
    let parsed = std::fs::read_to_string(path)
        .map_err(|e| ContentError::Io(e.to_string()))
        .and_then(|content| parse_frontmatter::<FaqMeta>(&content));
    match parsed {
        Ok((meta, body)) => FaqPage {
            title: meta.title,
            description: meta.description,
            intro_html: render_markdown(&body),
            items: meta
                .items
                .into_iter()
                .map(|item| Faq {
                    answer_html: render_markdown(&item.answer),
                    answer_text: item.answer.trim().to_string(),
                    question: item.question,
                    open: item.open,
                })
                .collect(),
        },
        Err(e) => {
            tracing::warn!("FAQ content unavailable ({:?}): {}", path, e);
            FaqPage::default()
        }
    }
}

/// Strip a `YYYY-MM-DD-` prefix from a post filename.
fn post_slug(filename: &str) -> &str {
    let dated = filename.len() > 11
        && filename
            .get(..10)
            .is_some_and(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").is_ok())
        && filename.as_bytes().get(10) == Some(&b'-');
    if dated {
        filename.get(11..).unwrap_or(filename)
    } else {
        filename
    }
}

/// Whole minutes at 200 words per minute, at least one.
fn reading_time(markdown: &str) -> u32 {
    let words = markdown.split_whitespace().count();
    u32::try_from(words.div_ceil(WORDS_PER_MINUTE).max(1)).unwrap_or(u32::MAX)
}

/// Render markdown to HTML with GitHub Flavored Markdown support.
fn render_markdown(content: &str) -> String {
    let mut options = Options::default();

    // Enable GFM extensions
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.header_ids = Some(String::new());
    options.extension.footnotes = true;

    // Content is ours; allow the odd inline <div class="callout">
    options.render.r#unsafe = true;

    markdown_to_html(content, &options)
}

/// Content loading errors
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
}
