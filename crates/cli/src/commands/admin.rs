//! Admin account commands.
//!
//! # Usage
//!
//! ```bash
//! aaa-cli admin list
//! aaa-cli admin list --status suspended
//! aaa-cli admin approve 42
//! aaa-cli admin suspend 42
//! aaa-cli admin reinstate 42
//! aaa-cli admin delete 42 --yes
//! ```
//!
//! # Environment Variables
//!
//! - `BACKEND_API_URL` - Base URL of the backend REST API
//! - `BACKEND_API_TOKEN` - Access token of a super admin

use aaa_admin::services::{AccountError, AdminAccountService};
use aaa_core::{AdminAction, AdminId, AdminStatus, AdminSummary};
use thiserror::Error;

use super::{CommandError, backend_from_env};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Account(#[from] AccountError),

    /// No bucket contains the account.
    #[error("No admin account with id {0}")]
    NotFound(AdminId),

    /// Delete was not confirmed with `--yes`.
    #[error("Refusing to delete admin {0} without --yes")]
    Unconfirmed(AdminId),
}

impl From<aaa_admin::backend::BackendError> for AdminError {
    fn from(e: aaa_admin::backend::BackendError) -> Self {
        Self::Account(AccountError::Backend(e))
    }
}

fn describe(admin: &AdminSummary) -> String {
    let role = admin
        .admin_type
        .map_or_else(|| "-".to_string(), |role| role.to_string());
    format!(
        "{:>6}  {:<28} {:<36} {:<12} {}",
        admin.id,
        admin.display_name(),
        admin.email,
        role,
        admin.created_at.format("%Y-%m-%d"),
    )
}

/// List admin accounts bucket by bucket.
pub async fn list(status: Option<AdminStatus>) -> Result<(), AdminError> {
    let api = backend_from_env()?;
    let buckets = AdminAccountService::default().buckets(&api).await?;

    let statuses = status.map_or(AdminStatus::ALL.to_vec(), |s| vec![s]);
    for status in statuses {
        let admins = buckets.get(status);
        tracing::info!("{} ({})", status.label(), admins.len());
        for admin in admins {
            tracing::info!("  {}", describe(admin));
        }
    }

    let kpis = buckets.kpis();
    if status.is_none() && kpis.pending_is_high_load() {
        tracing::warn!("{} accounts are waiting for approval", kpis.pending);
    }
    Ok(())
}

/// Apply a status action after checking it against the account's current
/// status.
pub async fn change_status(id: AdminId, action: AdminAction) -> Result<(), AdminError> {
    let api = backend_from_env()?;
    let service = AdminAccountService::default();

    let buckets = service.buckets(&api).await?;
    let current = buckets.find(id).ok_or(AdminError::NotFound(id))?.status;

    let notice = service.apply(&api, id, current, action).await?;
    tracing::info!("{notice}");
    Ok(())
}

/// Delete an account. Requires `--yes`.
pub async fn delete(id: AdminId, confirmed: bool) -> Result<(), AdminError> {
    if !confirmed {
        return Err(AdminError::Unconfirmed(id));
    }

    let api = backend_from_env()?;
    AdminAccountService::default().delete(&api, id, true).await?;
    tracing::info!("Admin {id} deleted");
    Ok(())
}
