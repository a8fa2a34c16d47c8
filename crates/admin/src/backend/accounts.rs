//! Admin account endpoints (super-admin only).

use std::future::Future;

use aaa_core::api::Enveloped;
use aaa_core::{AdminId, AdminStatus, AdminSummary};
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use super::BackendError;
use super::client::{AuthorizedBackend, read_empty, read_json};

#[derive(Serialize)]
struct StatusBody {
    status: AdminStatus,
}

/// Admin account operations used by the super-admin panel.
pub trait AccountApi: Send + Sync {
    /// List admin accounts.
    ///
    /// The status is sent as a filter but the backend may ignore it, so
    /// callers must not assume every returned account has that status.
    fn list_admins(
        &self,
        status: Option<AdminStatus>,
    ) -> impl Future<Output = Result<Vec<AdminSummary>, BackendError>> + Send;

    /// Move an admin account to a new status.
    fn update_admin_status(
        &self,
        id: AdminId,
        status: AdminStatus,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Permanently delete an admin account.
    fn delete_admin(&self, id: AdminId) -> impl Future<Output = Result<(), BackendError>> + Send;
}

impl AccountApi for AuthorizedBackend {
    #[instrument(skip(self))]
    async fn list_admins(
        &self,
        status: Option<AdminStatus>,
    ) -> Result<Vec<AdminSummary>, BackendError> {
        let query: Vec<(&str, String)> = status
            .map(|s| ("status", s.as_str().to_string()))
            .into_iter()
            .collect();
        let response = self
            .request_with_query(Method::GET, "api/auth/admins/", &query)?
            .send()
            .await?;
        let admins: Enveloped<Vec<AdminSummary>> = read_json(response).await?;
        Ok(admins.into_inner())
    }

    #[instrument(skip_all, fields(admin_id = %id, status = %status))]
    async fn update_admin_status(&self, id: AdminId, status: AdminStatus) -> Result<(), BackendError> {
        let response = self
            .request(Method::PATCH, &format!("api/auth/admins/{id}/status/"))?
            .json(&StatusBody { status })
            .send()
            .await?;
        read_empty(response).await
    }

    #[instrument(skip(self), fields(admin_id = %id))]
    async fn delete_admin(&self, id: AdminId) -> Result<(), BackendError> {
        let response = self
            .request(Method::DELETE, &format!("api/auth/users/{id}/"))?
            .send()
            .await?;
        read_empty(response).await
    }
}
