//! Super-admin account management.
//!
//! Accounts are shown in three status buckets. Status changes and deletes
//! are plain form posts that redirect back with a flash notice.

use aaa_core::{AdminAction, AdminId, AdminKpis, AdminStatus, AdminSummary};
use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::{AdminBackend, RequireSuperAdmin};
use crate::models::Flash;
use crate::routes::{AdminUserView, FlashView, render, set_flash, take_flash};
use crate::routes::dashboard::StatCard;
use crate::services::AccountError;
use crate::state::AppState;

const DASHBOARD_PATH: &str = "/super-admin/dashboard";

/// Build the super-admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(DASHBOARD_PATH, get(dashboard))
        .route("/super-admin/admins/{id}/status", post(change_status))
        .route("/super-admin/admins/{id}/delete", post(delete_admin))
}

/// A bucket tab with its count.
#[derive(Debug, Clone)]
pub struct BucketTab {
    pub status: &'static str,
    pub label: &'static str,
    pub count: usize,
    pub href: String,
    pub active: bool,
}

/// A status-change button.
#[derive(Debug, Clone)]
pub struct ActionView {
    pub value: &'static str,
    pub label: &'static str,
    pub destructive: bool,
}

/// One account row.
#[derive(Debug, Clone)]
pub struct AdminRowView {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: &'static str,
    pub status: &'static str,
    pub created_at: String,
    pub actions: Vec<ActionView>,
    pub can_delete: bool,
    /// Another request is already changing this account.
    pub busy: bool,
}

impl AdminRowView {
    fn new(admin: &AdminSummary, busy: bool) -> Self {
        let available = admin.status.available_actions();
        Self {
            id: admin.id.as_i64(),
            name: admin.display_name(),
            email: admin.email.clone(),
            phone: admin.phone.clone().unwrap_or_default(),
            role: match admin.admin_type {
                Some(aaa_core::AdminRole::SuperAdmin) => "Super admin",
                _ => "Admin",
            },
            status: admin.status.as_str(),
            created_at: admin.created_at.format("%d %b %Y").to_string(),
            actions: available
                .iter()
                .filter(|action| action.target_status().is_some())
                .map(|action| ActionView {
                    value: action.as_str(),
                    label: action.label(),
                    destructive: action.is_destructive(),
                })
                .collect(),
            can_delete: available.contains(&AdminAction::Delete),
            busy,
        }
    }
}

#[derive(Template)]
#[template(path = "super_admin/index.html")]
struct SuperAdminTemplate {
    admin_user: AdminUserView,
    current_path: String,
    flash: Option<FlashView>,
    tabs: Vec<BucketTab>,
    status: &'static str,
    status_label: &'static str,
    search: String,
    rows: Vec<AdminRowView>,
    kpis: AdminKpis,
    high_load: bool,
    cards: Vec<StatCard>,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DashboardParams {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    q: Option<String>,
}

fn dashboard_href(status: AdminStatus, search: &str) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query.append_pair("status", status.as_str());
    if !search.is_empty() {
        query.append_pair("q", search);
    }
    format!("{DASHBOARD_PATH}?{}", query.finish())
}

fn parse_status(raw: Option<&str>) -> AdminStatus {
    raw.and_then(|s| s.parse().ok())
        .unwrap_or(AdminStatus::PendingApproval)
}

/// Admin accounts by status.
///
/// GET /super-admin/dashboard
#[instrument(skip_all)]
async fn dashboard(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    AdminBackend(api): AdminBackend,
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<DashboardParams>,
) -> Result<Response, AppError> {
    let status = parse_status(params.status.as_deref());
    let search = params.q.as_deref().unwrap_or_default().trim().to_string();
    let accounts = state.accounts();

    let (summary, buckets) = tokio::join!(accounts.summary(&api), accounts.buckets(&api));
    let mut error = None;

    let buckets = match buckets {
        Ok(buckets) => buckets,
        Err(e) if e.is_unauthorized() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load admin accounts");
            error = Some(e.user_message());
            aaa_core::AdminBuckets::default()
        }
    };
    let cards = match summary {
        Ok(stats) => stats
            .cards()
            .into_iter()
            .map(|(label, value)| StatCard { label, value })
            .collect(),
        Err(e) if e.is_unauthorized() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load summary counts");
            Vec::new()
        }
    };

    let busy = accounts.busy_ids();
    let rows = buckets
        .search(status, &search)
        .into_iter()
        .map(|a| AdminRowView::new(a, busy.contains(&a.id)))
        .collect();
    let tabs = AdminStatus::ALL
        .into_iter()
        .map(|s| BucketTab {
            status: s.as_str(),
            label: s.label(),
            count: buckets.get(s).len(),
            href: dashboard_href(s, &search),
            active: s == status,
        })
        .collect();
    let kpis = buckets.kpis();

    let template = SuperAdminTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: DASHBOARD_PATH.to_string(),
        flash: take_flash(&session).await,
        tabs,
        status: status.as_str(),
        status_label: status.label(),
        search,
        rows,
        kpis,
        high_load: kpis.pending_is_high_load(),
        cards,
        error,
    };
    Ok(Html(render(&template)).into_response())
}

#[derive(Debug, Deserialize)]
struct StatusForm {
    action: String,
}

/// Approve, suspend or reinstate an account.
///
/// POST /super-admin/admins/{id}/status
#[instrument(skip_all)]
async fn change_status(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    AdminBackend(api): AdminBackend,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<StatusForm>,
) -> Result<Response, AppError> {
    let id = AdminId::new(id);
    let Ok(action) = form.action.parse::<AdminAction>() else {
        set_flash(&session, Flash::error("Unknown action", Some(form.action))).await;
        return Ok(Redirect::to(DASHBOARD_PATH).into_response());
    };

    let accounts = state.accounts();
    let Some(current) = accounts.current_status(&api, id).await? else {
        set_flash(&session, Flash::error("Admin not found", None)).await;
        return Ok(Redirect::to(DASHBOARD_PATH).into_response());
    };

    let back = dashboard_href(current, "");
    match accounts.apply(&api, id, current, action).await {
        Ok(notice) => {
            tracing::info!(super_admin_id = %admin.id, admin_id = %id, %action, "Admin status updated");
            set_flash(&session, Flash::success(notice, None)).await;
        }
        Err(AccountError::Backend(e)) if e.is_unauthorized() => return Err(e.into()),
        Err(e) => {
            tracing::info!(admin_id = %id, %action, error = %e, "Admin status change refused");
            set_flash(&session, Flash::error("Update failed", Some(AppError::from(e).user_message()))).await;
        }
    }
    Ok(Redirect::to(&back).into_response())
}

#[derive(Debug, Deserialize)]
struct DeleteForm {
    #[serde(default)]
    confirm: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Delete an account.
///
/// POST /super-admin/admins/{id}/delete
#[instrument(skip_all)]
async fn delete_admin(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    AdminBackend(api): AdminBackend,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<DeleteForm>,
) -> Result<Response, AppError> {
    let id = AdminId::new(id);
    let back = dashboard_href(parse_status(form.status.as_deref()), "");
    let confirmed = form.confirm.as_deref() == Some("yes");

    match state.accounts().delete(&api, id, confirmed).await {
        Ok(true) => {
            tracing::info!(super_admin_id = %admin.id, admin_id = %id, "Admin account deleted");
            set_flash(&session, Flash::success("Admin deleted", None)).await;
        }
        Ok(false) => {
            set_flash(
                &session,
                Flash::error("Delete not confirmed", Some("Confirm the deletion to continue".to_string())),
            )
            .await;
        }
        Err(AccountError::Backend(e)) if e.is_unauthorized() => return Err(e.into()),
        Err(e) => {
            set_flash(&session, Flash::error("Delete failed", Some(AppError::from(e).user_message()))).await;
        }
    }
    Ok(Redirect::to(&back).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn summary(status: &str) -> AdminSummary {
        serde_json::from_value(json!({
            "id": 9,
            "email": "ops@aaa-as.co.uk",
            "first_name": "Sam",
            "last_name": null,
            "status": status,
            "created_at": "2026-03-04T09:00:00Z",
        }))
        .unwrap()
    }

    #[test]
    fn test_row_actions_follow_status() {
        let row = AdminRowView::new(&summary("pending_approval"), false);
        let values: Vec<_> = row.actions.iter().map(|a| a.value).collect();
        assert_eq!(values, ["approve", "suspend"]);
        assert!(row.can_delete);
        assert_eq!(row.name, "Sam");

        let row = AdminRowView::new(&summary("suspended"), true);
        let values: Vec<_> = row.actions.iter().map(|a| a.value).collect();
        assert_eq!(values, ["reinstate"]);
        assert!(row.busy);
    }

    #[test]
    fn test_parse_status_defaults_to_pending() {
        assert_eq!(parse_status(None), AdminStatus::PendingApproval);
        assert_eq!(parse_status(Some("bogus")), AdminStatus::PendingApproval);
        assert_eq!(parse_status(Some("suspended")), AdminStatus::Suspended);
    }

    #[test]
    fn test_dashboard_href_encodes_search() {
        assert_eq!(
            dashboard_href(AdminStatus::Active, "a b"),
            "/super-admin/dashboard?status=active&q=a+b"
        );
    }
}
