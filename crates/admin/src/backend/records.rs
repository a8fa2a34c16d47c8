//! Inquiry, claim, and activity feeds for the dashboard.

use std::future::Future;

use aaa_core::{ActivityItem, ClaimRecord, InquiryRecord, Page};
use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::instrument;

use super::BackendError;
use super::client::{AuthorizedBackend, read_json};

/// Newest-first record lists. Each returns at most `limit` entries.
pub trait RecordsApi: Send + Sync {
    fn latest_inquiries(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<InquiryRecord>, BackendError>> + Send;

    fn latest_claims(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<ClaimRecord>, BackendError>> + Send;

    fn recent_activity(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<ActivityItem>, BackendError>> + Send;
}

impl AuthorizedBackend {
    /// First page of a list endpoint, in whatever shape it arrives.
    async fn first_page<T: DeserializeOwned>(
        &self,
        path: &str,
        limit: usize,
    ) -> Result<Vec<T>, BackendError> {
        let response = self.request(Method::GET, path)?.send().await?;
        let page: Page<T> = read_json(response).await?;
        let mut results = page.results;
        results.truncate(limit);
        Ok(results)
    }
}

impl RecordsApi for AuthorizedBackend {
    #[instrument(skip(self))]
    async fn latest_inquiries(&self, limit: usize) -> Result<Vec<InquiryRecord>, BackendError> {
        self.first_page("api/inquiries/", limit).await
    }

    #[instrument(skip(self))]
    async fn latest_claims(&self, limit: usize) -> Result<Vec<ClaimRecord>, BackendError> {
        self.first_page("api/claims/", limit).await
    }

    #[instrument(skip(self))]
    async fn recent_activity(&self, limit: usize) -> Result<Vec<ActivityItem>, BackendError> {
        self.first_page("api/analytics/dashboard/recent-activity/", limit)
            .await
    }
}
