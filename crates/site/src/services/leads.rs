//! Backend client for the lead-capture forms.
//!
//! Submissions are posted form-encoded, exactly as the browser would post
//! them, honeypot included. Published testimonials are cached for 5 minutes.

use std::sync::Arc;
use std::time::Duration;

use aaa_core::api::error_message;
use aaa_core::{ClaimSubmission, ContactInquiry, LeadKind, Page, Testimonial, TestimonialSubmission};
use moka::future::Cache;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;
use url::Url;

const CLAIMS_PATH: &str = "api/claims/";
const INQUIRIES_PATH: &str = "api/inquiries/";
const TESTIMONIALS_PATH: &str = "api/testimonials/";

const TESTIMONIALS_TTL: Duration = Duration::from_secs(300);

/// Errors that can occur when submitting a lead.
#[derive(Debug, Error)]
pub enum LeadsError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend refused the submission.
    #[error("API error: {status} - {message}")]
    Rejected { status: u16, message: String },

    /// A request URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Response body did not have the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl LeadsError {
    /// Message suitable for the form's error notice.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { status, message } if *status < 500 => message.clone(),
            Self::Http(e) if e.is_timeout() => {
                "Our server took too long to respond. Please try again.".to_string()
            }
            Self::Rejected { .. } | Self::Http(_) | Self::InvalidUrl(_) | Self::Parse(_) => {
                "We could not send your details right now. Please try again or call us.".to_string()
            }
        }
    }

    /// Whether the backend, rather than the network, said no.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { status, .. } if *status < 500)
    }
}

/// Client for the lead endpoints of the backend.
#[derive(Clone)]
pub struct LeadsClient {
    inner: Arc<LeadsClientInner>,
}

struct LeadsClientInner {
    client: reqwest::Client,
    base_url: Url,
    testimonials: Cache<(), Arc<Vec<Testimonial>>>,
}

impl LeadsClient {
    /// Create a new leads client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, LeadsError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .user_agent(concat!("aaa-site/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let testimonials = Cache::builder()
            .max_capacity(1)
            .time_to_live(TESTIMONIALS_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(LeadsClientInner {
                client,
                base_url,
                testimonials,
            }),
        })
    }

    /// Submit an accident claim.
    ///
    /// # Errors
    ///
    /// Returns `LeadsError::Rejected` when the backend refuses the claim.
    #[instrument(skip_all)]
    pub async fn submit_claim(&self, claim: &ClaimSubmission) -> Result<(), LeadsError> {
        self.submit(LeadKind::Claim, CLAIMS_PATH, claim).await
    }

    /// Submit a contact inquiry.
    ///
    /// # Errors
    ///
    /// Returns `LeadsError::Rejected` when the backend refuses the inquiry.
    #[instrument(skip_all)]
    pub async fn submit_inquiry(&self, inquiry: &ContactInquiry) -> Result<(), LeadsError> {
        self.submit(LeadKind::Contact, INQUIRIES_PATH, inquiry).await
    }

    /// Submit a testimonial for moderation.
    ///
    /// # Errors
    ///
    /// Returns `LeadsError::Rejected` when the backend refuses the testimonial.
    #[instrument(skip_all)]
    pub async fn submit_testimonial(
        &self,
        testimonial: &TestimonialSubmission,
    ) -> Result<(), LeadsError> {
        self.submit(LeadKind::Testimonial, TESTIMONIALS_PATH, testimonial)
            .await?;
        self.inner.testimonials.invalidate_all();
        Ok(())
    }

    /// Published testimonials, newest as the backend orders them.
    ///
    /// Failures are logged and yield an empty list.
    pub async fn testimonials(&self) -> Arc<Vec<Testimonial>> {
        if let Some(cached) = self.inner.testimonials.get(&()).await {
            return cached;
        }
        match self.fetch_testimonials().await {
            Ok(list) => {
                let list = Arc::new(list);
                self.inner.testimonials.insert((), Arc::clone(&list)).await;
                list
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load testimonials");
                Arc::new(Vec::new())
            }
        }
    }

    async fn fetch_testimonials(&self) -> Result<Vec<Testimonial>, LeadsError> {
        let response = self
            .inner
            .client
            .get(self.url(TESTIMONIALS_PATH)?)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LeadsError::Rejected {
                status: status.as_u16(),
                message: error_message(status.as_u16(), &body),
            });
        }
        serde_json::from_str::<Page<Testimonial>>(&body)
            .map(|page| page.results)
            .map_err(|e| LeadsError::Parse(e.to_string()))
    }

    async fn submit<T: Serialize + Sync>(
        &self,
        kind: LeadKind,
        path: &str,
        form: &T,
    ) -> Result<(), LeadsError> {
        let response = self
            .inner
            .client
            .post(self.url(path)?)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(?kind, status = status.as_u16(), "Lead submitted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(status.as_u16(), &body);
        tracing::info!(?kind, status = status.as_u16(), %message, "Lead rejected by backend");
        Err(LeadsError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    fn url(&self, path: &str) -> Result<Url, LeadsError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| LeadsError::InvalidUrl(format!("{path}: {e}")))
    }
}
