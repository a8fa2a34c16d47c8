//! Dashboard analytics endpoint.

use std::future::Future;

use aaa_core::SummaryStats;
use aaa_core::api::Enveloped;
use reqwest::Method;
use tracing::instrument;

use super::BackendError;
use super::client::{AuthorizedBackend, read_json};

/// Source of the dashboard summary counts.
pub trait AnalyticsApi: Send + Sync {
    fn summary_stats(&self) -> impl Future<Output = Result<SummaryStats, BackendError>> + Send;
}

impl AnalyticsApi for AuthorizedBackend {
    #[instrument(skip(self))]
    async fn summary_stats(&self) -> Result<SummaryStats, BackendError> {
        let response = self
            .request(Method::GET, "api/analytics/dashboard/summary/")?
            .send()
            .await?;
        let stats: Enveloped<SummaryStats> = read_json(response).await?;
        Ok(stats.into_inner())
    }
}
