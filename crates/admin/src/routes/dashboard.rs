//! Dashboard route handler.

use aaa_core::records::latest_notifications;
use aaa_core::{ActivityItem, ClaimRecord, InquiryRecord, Notification};
use askama::Template;
use axum::{
    Router,
    extract::State,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use tower_sessions::Session;
use tracing::instrument;

use crate::{
    backend::{BackendError, RecordsApi},
    error::AppError,
    filters,
    middleware::{AdminBackend, RequireAdminAuth},
    routes::{AdminUserView, FlashView, render, take_flash},
    state::AppState,
};

const LATEST_LIMIT: usize = 5;
const NOTIFICATION_LIMIT: usize = 3;
const TIMESTAMP_FORMAT: &str = "%d %b %Y %H:%M";

/// One summary card.
#[derive(Debug, Clone)]
pub struct StatCard {
    pub label: &'static str,
    pub value: u64,
}

/// One line of a dashboard list.
#[derive(Debug, Clone)]
pub struct FeedItemView {
    pub badge: &'static str,
    pub title: String,
    pub subtitle: String,
    pub when: String,
}

impl From<&Notification> for FeedItemView {
    fn from(notification: &Notification) -> Self {
        Self {
            badge: notification.kind.label(),
            title: notification.title.clone(),
            subtitle: notification.subtitle.clone(),
            when: notification.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

impl From<&InquiryRecord> for FeedItemView {
    fn from(inquiry: &InquiryRecord) -> Self {
        Self {
            badge: "Inquiry",
            title: inquiry.name.clone(),
            subtitle: if inquiry.subject.is_empty() {
                inquiry.email.clone()
            } else {
                format!("{} • {}", inquiry.subject, inquiry.email)
            },
            when: inquiry.created_at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

impl From<&ClaimRecord> for FeedItemView {
    fn from(claim: &ClaimRecord) -> Self {
        Self {
            badge: "Claim",
            title: claim.claimant(),
            subtitle: format!("{} • {}", claim.vehicle_registration, claim.status),
            when: claim.created_at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

impl From<&ActivityItem> for FeedItemView {
    fn from(item: &ActivityItem) -> Self {
        Self {
            badge: "Activity",
            title: item.summary().to_string(),
            subtitle: item
                .activity_label
                .clone()
                .or_else(|| item.user_name.clone())
                .unwrap_or_default(),
            when: item
                .timestamp
                .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_default(),
        }
    }
}

/// A titled list that loads on its own and fails on its own.
#[derive(Debug, Clone)]
pub struct PanelView {
    pub title: &'static str,
    pub empty: &'static str,
    pub items: Vec<FeedItemView>,
    pub error: Option<String>,
}

impl PanelView {
    fn new(title: &'static str, empty: &'static str, items: Vec<FeedItemView>) -> Self {
        Self {
            title,
            empty,
            items,
            error: None,
        }
    }

    fn failed(title: &'static str, error: &BackendError) -> Self {
        tracing::warn!(panel = title, error = %error, "Failed to load dashboard panel");
        Self {
            title,
            empty: "",
            items: Vec::new(),
            error: Some(error.user_message()),
        }
    }
}

/// Dashboard template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<FlashView>,
    pub cards: Vec<StatCard>,
    pub error: Option<String>,
    pub panels: Vec<PanelView>,
}

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}

fn list_panel<T>(
    title: &'static str,
    empty: &'static str,
    result: &Result<Vec<T>, BackendError>,
) -> PanelView
where
    for<'a> FeedItemView: From<&'a T>,
{
    match result {
        Ok(records) => PanelView::new(title, empty, records.iter().map(FeedItemView::from).collect()),
        Err(e) => PanelView::failed(title, e),
    }
}

/// Summary counts and the latest records for every admin.
///
/// GET /
#[instrument(skip_all)]
async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    AdminBackend(api): AdminBackend,
    State(state): State<AppState>,
    session: Session,
) -> Response {
    let (summary, inquiries, claims, activity) = tokio::join!(
        state.accounts().summary(&api),
        api.latest_inquiries(LATEST_LIMIT),
        api.latest_claims(LATEST_LIMIT),
        api.recent_activity(LATEST_LIMIT),
    );

    let expired = [
        summary.as_ref().err(),
        inquiries.as_ref().err(),
        claims.as_ref().err(),
        activity.as_ref().err(),
    ]
    .into_iter()
    .flatten()
    .find(|e| e.is_unauthorized());
    if let Some(e) = expired {
        return AppError::from(BackendError::Unauthorized(e.user_message())).into_response();
    }

    let (cards, error) = match summary {
        Ok(stats) => (
            stats
                .cards()
                .into_iter()
                .map(|(label, value)| StatCard { label, value })
                .collect(),
            None,
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load dashboard summary");
            (Vec::new(), Some(e.user_message()))
        }
    };

    let notifications = match (&inquiries, &claims) {
        (Ok(inquiries), Ok(claims)) => PanelView::new(
            "Latest notifications",
            "Nothing new.",
            latest_notifications(inquiries, claims, NOTIFICATION_LIMIT)
                .iter()
                .map(FeedItemView::from)
                .collect(),
        ),
        (Err(e), _) | (_, Err(e)) => PanelView::failed("Latest notifications", e),
    };

    let panels = vec![
        notifications,
        list_panel("Latest inquiries", "No inquiries yet.", &inquiries),
        list_panel("Latest claims", "No claims yet.", &claims),
        list_panel("Recent activity", "No recent activity.", &activity),
    ];

    let template = DashboardTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/".to_string(),
        flash: take_flash(&session).await,
        cards,
        error,
        panels,
    };
    Html(render(&template)).into_response()
}
