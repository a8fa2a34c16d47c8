//! Chatbot conversation screens.
//!
//! Every request builds a short-lived [`SessionViewer`] over the admin's
//! backend token. Live updates for an open, active conversation come from
//! the `/events` stream, which owns a polling viewer for as long as the
//! browser keeps the connection open.

use std::convert::Infallible;

use aaa_core::conversation::CONVERSATION_PAGE_SIZE;
use aaa_core::{Conversation, ConversationId, ConversationStatus, Message};
use askama::Template;
use async_stream::stream;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{
        Html, IntoResponse, Redirect, Response, Sse,
        sse::{Event, KeepAlive},
    },
    routing::{get, post},
};
use futures::Stream;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::{AuthorizedBackend, ConversationQuery};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{AdminBackend, RequireAdminAuth};
use crate::models::{Flash, FlashKind};
use crate::routes::{
    AdminUserView, FlashView, fragment_error, is_htmx, render, see_other, set_flash, take_flash,
    toast_trigger,
};
use crate::services::{SendOutcome, SessionViewer};
use crate::state::AppState;

const LIST_PATH: &str = "/admin/dashboard/chatbot";
const PREVIEW_CHARS: usize = 80;
const TIMESTAMP_FORMAT: &str = "%d %b %Y %H:%M";

/// Build the chatbot router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(LIST_PATH, get(index))
        .route("/admin/dashboard/chatbot/{id}", get(detail))
        .route("/admin/dashboard/chatbot/{id}/body", get(detail_body))
        .route("/admin/dashboard/chatbot/{id}/events", get(events))
        .route(
            "/admin/dashboard/chatbot/{id}/toggle-manual",
            post(toggle_manual),
        )
        .route("/admin/dashboard/chatbot/{id}/reply", post(reply))
        .route("/admin/dashboard/chatbot/{id}/close", post(close))
        .route("/admin/dashboard/chatbot/{id}/delete", post(delete))
}

// =============================================================================
// View models
// =============================================================================

/// One row of the conversation table.
#[derive(Debug, Clone)]
pub struct ConversationRowView {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub status: &'static str,
    pub status_label: &'static str,
    pub manual_reply_active: bool,
    pub is_lead: bool,
    pub message_count: usize,
    pub preview: String,
    pub started_at: String,
    pub selected: bool,
    /// Rendered as an out-of-band swap.
    pub oob: bool,
}

impl ConversationRowView {
    fn new(conversation: &Conversation, selected: bool) -> Self {
        Self {
            id: conversation.id.as_i64(),
            name: conversation.display_name().to_string(),
            email: conversation.user_email.clone().unwrap_or_default(),
            status: conversation.status.as_str(),
            status_label: conversation.status.label(),
            manual_reply_active: conversation.manual_reply_active,
            is_lead: conversation.is_lead,
            message_count: conversation.total_messages(),
            preview: conversation
                .last_message()
                .map(|m| preview(&m.content))
                .unwrap_or_default(),
            started_at: conversation.started_at.format(TIMESTAMP_FORMAT).to_string(),
            selected,
            oob: false,
        }
    }

    fn out_of_band(conversation: &Conversation) -> Self {
        Self {
            oob: true,
            ..Self::new(conversation, true)
        }
    }
}

/// One chat bubble.
#[derive(Debug, Clone)]
pub struct MessageView {
    pub sender: &'static str,
    pub from_admin: bool,
    pub from_visitor: bool,
    pub content: String,
    pub timestamp: String,
    pub response_time_ms: Option<u64>,
}

impl From<&Message> for MessageView {
    fn from(message: &Message) -> Self {
        let sender = message.sender_label();
        Self {
            sender,
            from_admin: message.is_from_admin(),
            from_visitor: sender == "Visitor",
            content: message.content.clone(),
            timestamp: message.timestamp.format("%H:%M:%S").to_string(),
            response_time_ms: message.response_time_ms,
        }
    }
}

/// The detail panel for an open conversation.
#[derive(Debug, Clone)]
pub struct ConversationDetailView {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: &'static str,
    pub status_label: &'static str,
    pub is_active: bool,
    pub manual_reply_active: bool,
    pub accepts_manual_reply: bool,
    pub is_lead: bool,
    pub started_at: String,
    pub ended_at: Option<String>,
    pub last_activity: Option<String>,
    pub ip_address: Option<String>,
    pub collected: Vec<(String, String)>,
    pub messages: Vec<MessageView>,
}

impl From<&Conversation> for ConversationDetailView {
    fn from(c: &Conversation) -> Self {
        Self {
            id: c.id.as_i64(),
            name: c.display_name().to_string(),
            email: c.user_email.clone(),
            phone: c.user_phone.clone(),
            status: c.status.as_str(),
            status_label: c.status.label(),
            is_active: c.is_active(),
            manual_reply_active: c.manual_reply_active,
            accepts_manual_reply: c.accepts_manual_reply(),
            is_lead: c.is_lead,
            started_at: c.started_at.format(TIMESTAMP_FORMAT).to_string(),
            ended_at: c.ended_at.map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
            last_activity: c.last_activity.map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
            ip_address: c.ip_address.clone(),
            collected: c
                .collected_data
                .iter()
                .filter_map(|(key, value)| {
                    value
                        .as_ref()
                        .filter(|v| !v.trim().is_empty())
                        .map(|v| (key.replace('_', " "), v.clone()))
                })
                .collect(),
            messages: c.messages.iter().map(MessageView::from).collect(),
        }
    }
}

/// A status filter tab.
#[derive(Debug, Clone)]
pub struct FilterTab {
    pub label: &'static str,
    pub href: String,
    pub active: bool,
}

fn preview(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}

/// Link back to the list with the given filters.
fn list_href(
    status: Option<ConversationStatus>,
    page: u32,
    search: &str,
    open: Option<ConversationId>,
) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    if let Some(status) = status {
        query.append_pair("status", status.as_str());
    }
    if page > 1 {
        query.append_pair("page", &page.to_string());
    }
    if !search.is_empty() {
        query.append_pair("q", search);
    }
    if let Some(id) = open {
        query.append_pair("open", &id.to_string());
    }
    let query = query.finish();
    if query.is_empty() {
        LIST_PATH.to_string()
    } else {
        format!("{LIST_PATH}?{query}")
    }
}

/// The list view an admin came from, carried through the detail panel so
/// a delete lands back on the same tab, page and search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilters {
    pub status: Option<ConversationStatus>,
    pub page: u32,
    pub search: String,
}

impl ListFilters {
    fn new(status: Option<ConversationStatus>, page: Option<u32>, search: Option<&str>) -> Self {
        Self {
            status,
            page: page.unwrap_or(1).max(1),
            search: search.map(str::trim).unwrap_or_default().to_string(),
        }
    }

    /// Filters from the page HTMX reports in `HX-Current-URL`.
    fn from_current_url(headers: &HeaderMap) -> Self {
        let Some(url) = headers
            .get("hx-current-url")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| url::Url::parse(v).ok())
        else {
            return Self::new(None, None, None);
        };
        let mut params = ListParams::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "status" => params.status = Some(value.into_owned()),
                "page" => params.page = value.parse().ok(),
                "q" => params.q = Some(value.into_owned()),
                _ => {}
            }
        }
        Self::new(params.status(), params.page, params.q.as_deref())
    }

    pub fn status_param(&self) -> &'static str {
        self.status.map_or("", ConversationStatus::as_str)
    }

    fn href(&self) -> String {
        list_href(self.status, self.page, &self.search, None)
    }
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template)]
#[template(path = "chatbot/index.html")]
struct ChatbotIndexTemplate {
    admin_user: AdminUserView,
    current_path: String,
    flash: Option<FlashView>,
    tabs: Vec<FilterTab>,
    status: String,
    search: String,
    rows: Vec<ConversationRowView>,
    total_count: u64,
    page: u32,
    total_pages: u32,
    prev_href: Option<String>,
    next_href: Option<String>,
    refresh_href: String,
    list_error: Option<String>,
    detail: Option<ConversationDetailView>,
    detail_error: Option<String>,
    /// Unused on a full page; the detail partial expects them.
    row: Option<ConversationRowView>,
    refetch_delay_ms: Option<u128>,
    back: ListFilters,
}

#[derive(Template)]
#[template(path = "chatbot/_detail.html")]
struct DetailTemplate {
    detail: ConversationDetailView,
    row: Option<ConversationRowView>,
    refetch_delay_ms: Option<u128>,
    back: ListFilters,
}

#[derive(Template)]
#[template(path = "chatbot/_detail_body.html")]
struct DetailBodyTemplate {
    detail: ConversationDetailView,
    refetch_delay_ms: Option<u128>,
}

#[derive(Template)]
#[template(path = "chatbot/_row.html")]
struct RowTemplate {
    row: ConversationRowView,
}

fn detail_fragment(
    conversation: &Conversation,
    headers: &HeaderMap,
    refetch_delay_ms: Option<u128>,
) -> String {
    render(&DetailTemplate {
        detail: conversation.into(),
        row: Some(ConversationRowView::out_of_band(conversation)),
        refetch_delay_ms,
        back: ListFilters::from_current_url(headers),
    })
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    q: Option<String>,
    #[serde(default)]
    open: Option<i64>,
}

impl ListParams {
    fn status(&self) -> Option<ConversationStatus> {
        self.status
            .as_deref()
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse().ok())
    }
}

/// Conversation list with an optional open conversation.
///
/// GET /admin/dashboard/chatbot
#[instrument(skip_all)]
async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    AdminBackend(api): AdminBackend,
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<ListParams>,
) -> Result<Response, AppError> {
    let status = params.status();
    let search = params.q.clone().unwrap_or_default();
    let search = search.trim();

    let mut viewer = SessionViewer::new(api, state.viewer_config());
    viewer.set_query(ConversationQuery {
        status,
        page: params.page.unwrap_or(1),
        is_lead: None,
    });
    viewer.set_search(search);
    if let Err(e) = viewer.load().await
        && e.is_unauthorized()
    {
        return Err(e.into());
    }

    let mut detail_error = None;
    if let Some(id) = params.open.map(ConversationId::new) {
        match viewer.open(id).await {
            Ok(_) => {}
            Err(e) if e.is_unauthorized() => return Err(e.into()),
            Err(e) => detail_error = Some(e.user_message()),
        }
    }

    let query = viewer.query();
    let open_id = viewer.selected().map(|c| c.id);
    let rows = viewer
        .visible()
        .into_iter()
        .map(|c| ConversationRowView::new(c, Some(c.id) == open_id))
        .collect();
    let tabs = std::iter::once((None, "All"))
        .chain(ConversationStatus::ALL.into_iter().map(|s| (Some(s), s.label())))
        .map(|(tab, label)| FilterTab {
            label,
            href: list_href(tab, 1, search, None),
            active: tab == status,
        })
        .collect();

    let (total_count, total_pages, prev_href, next_href) = viewer.list().map_or(
        (0, 1, None, None),
        |page| {
            (
                page.count,
                page.total_pages(CONVERSATION_PAGE_SIZE),
                page.previous_page().map(|p| list_href(status, p, search, None)),
                page.next_page().map(|p| list_href(status, p, search, None)),
            )
        },
    );

    let template = ChatbotIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: LIST_PATH.to_string(),
        flash: take_flash(&session).await,
        tabs,
        status: status.map(|s| s.as_str().to_string()).unwrap_or_default(),
        search: search.to_string(),
        rows,
        total_count,
        page: query.page,
        total_pages,
        prev_href,
        next_href,
        refresh_href: list_href(status, query.page, search, None),
        list_error: viewer.list_error().map(str::to_string),
        detail: viewer.selected().map(ConversationDetailView::from),
        detail_error,
        row: None,
        refetch_delay_ms: None,
        back: ListFilters::new(status, Some(query.page), Some(search)),
    };
    Ok(Html(render(&template)).into_response())
}

/// Detail panel for one conversation.
///
/// GET /admin/dashboard/chatbot/{id}
#[instrument(skip_all)]
async fn detail(
    RequireAdminAuth(_admin): RequireAdminAuth,
    AdminBackend(api): AdminBackend,
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if !is_htmx(&headers) {
        return Redirect::to(&list_href(None, 1, "", Some(ConversationId::new(id)))).into_response();
    }

    let mut viewer = SessionViewer::new(api, state.viewer_config());
    match viewer.open(ConversationId::new(id)).await {
        Ok(conversation) => Html(detail_fragment(conversation, &headers, None)).into_response(),
        Err(e) => fragment_error(e.into()),
    }
}

/// Message history and metadata only, for the delayed re-fetch after a reply.
///
/// GET /admin/dashboard/chatbot/{id}/body
#[instrument(skip_all)]
async fn detail_body(
    RequireAdminAuth(_admin): RequireAdminAuth,
    AdminBackend(api): AdminBackend,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Response {
    let mut viewer = SessionViewer::new(api, state.viewer_config());
    match viewer.open(ConversationId::new(id)).await {
        Ok(conversation) => Html(render(&DetailBodyTemplate {
            detail: conversation.into(),
            refetch_delay_ms: None,
        }))
        .into_response(),
        Err(e) => fragment_error(e.into()),
    }
}

fn sse_html(name: &'static str, html: &str) -> Event {
    Event::default().event(name).data(html.replace('\r', ""))
}

fn conversation_events(
    api: AuthorizedBackend,
    state: &AppState,
    id: ConversationId,
) -> impl Stream<Item = Result<Event, Infallible>> + use<> {
    let config = state.viewer_config();
    stream! {
        let mut viewer = SessionViewer::live(api, config);
        match viewer.open(id).await {
            Ok(conversation) if conversation.is_active() => {}
            Ok(_) => {
                yield Ok(Event::default().event("closed").data("completed"));
                return;
            }
            Err(e) => {
                tracing::info!(conversation_id = %id, error = %e, "Live updates unavailable");
                yield Ok(Event::default().event("closed").data("unavailable"));
                return;
            }
        }

        while let Some(update) = viewer.next_update().await {
            let body = render(&DetailBodyTemplate {
                detail: (&update.conversation).into(),
                refetch_delay_ms: None,
            });
            yield Ok(sse_html("conversation", &body));

            let row = render(&RowTemplate {
                row: ConversationRowView::out_of_band(&update.conversation),
            });
            yield Ok(sse_html("row", &row));

            if !update.conversation.is_active() {
                break;
            }
        }

        tracing::debug!(conversation_id = %id, "Live updates finished");
        yield Ok(Event::default().event("closed").data("stopped"));
    }
}

/// Live updates for an open conversation.
///
/// GET /admin/dashboard/chatbot/{id}/events
///
/// Polls the backend while the conversation is active and pushes the
/// re-rendered detail body and list row. Ends with a `closed` event once
/// the conversation is no longer active.
async fn events(
    RequireAdminAuth(_admin): RequireAdminAuth,
    AdminBackend(api): AdminBackend,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    Sse::new(conversation_events(api, &state, ConversationId::new(id)))
        .keep_alive(KeepAlive::default())
}

/// Flip manual/auto reply.
///
/// POST /admin/dashboard/chatbot/{id}/toggle-manual
#[instrument(skip_all)]
async fn toggle_manual(
    RequireAdminAuth(_admin): RequireAdminAuth,
    AdminBackend(api): AdminBackend,
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let mut viewer = SessionViewer::new(api, state.viewer_config());
    if let Err(e) = viewer.open(ConversationId::new(id)).await {
        return fragment_error(e.into());
    }

    let toggled = match viewer.toggle_manual_reply().await {
        Ok(Some(toggled)) => toggled,
        Ok(None) => return fragment_error(AppError::NotFound(format!("conversation {id}"))),
        Err(e) => return fragment_error(e.into()),
    };

    let Some(conversation) = viewer.selected() else {
        return fragment_error(AppError::NotFound(format!("conversation {id}")));
    };
    let body = (!toggled.message.is_empty()).then_some(toggled.message.as_str());
    (
        [(
            "HX-Trigger",
            toast_trigger(FlashKind::Success, toggled.headline(), body),
        )],
        Html(detail_fragment(conversation, &headers, None)),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
struct ReplyForm {
    #[serde(default)]
    message: String,
}

/// Send a manual reply.
///
/// POST /admin/dashboard/chatbot/{id}/reply
///
/// The panel is re-rendered straight away and asks for one more re-fetch
/// after the configured delay, so the stored copy of the reply shows up.
#[instrument(skip_all)]
async fn reply(
    RequireAdminAuth(admin): RequireAdminAuth,
    AdminBackend(api): AdminBackend,
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Form(form): Form<ReplyForm>,
) -> Response {
    let delay = state.viewer_config().reply_refetch_delay;
    let mut viewer = SessionViewer::new(api, state.viewer_config());
    if let Err(e) = viewer.open(ConversationId::new(id)).await {
        return fragment_error(e.into());
    }

    match viewer.send_reply(&form.message).await {
        Ok(SendOutcome::Sent(_)) => {}
        Ok(SendOutcome::Skipped(reason)) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                [(
                    "HX-Trigger",
                    toast_trigger(FlashKind::Error, "Reply not sent", Some(reason.message())),
                )],
                reason.message(),
            )
                .into_response();
        }
        Err(e) => return fragment_error(e.into()),
    }
    tracing::info!(admin_id = %admin.id, conversation_id = id, "Admin replied to visitor");

    let Some(conversation) = viewer.selected() else {
        return fragment_error(AppError::NotFound(format!("conversation {id}")));
    };
    (
        [(
            "HX-Trigger",
            toast_trigger(FlashKind::Success, "Reply sent", None),
        )],
        Html(detail_fragment(conversation, &headers, Some(delay.as_millis()))),
    )
        .into_response()
}

/// Close the detail panel.
///
/// POST /admin/dashboard/chatbot/{id}/close
///
/// A conversation left in manual mode is handed back to the bot.
#[instrument(skip_all)]
async fn close(
    RequireAdminAuth(_admin): RequireAdminAuth,
    AdminBackend(api): AdminBackend,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Response {
    let mut viewer = SessionViewer::new(api, state.viewer_config());
    match viewer.open(ConversationId::new(id)).await {
        Ok(_) => {
            viewer.close().await;
        }
        Err(e) if e.is_unauthorized() => return AppError::from(e).into_response(),
        Err(e) => tracing::debug!(error = %e, "Closing a conversation that could not be loaded"),
    }
    (
        [("HX-Trigger-After-Settle", "conversationsChanged")],
        Html(r#"<p class="empty-state">Select a conversation to view it.</p>"#),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
struct DeleteForm {
    #[serde(default)]
    confirm: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    q: Option<String>,
}

impl DeleteForm {
    fn back(&self) -> ListFilters {
        let status = self.status.as_deref().and_then(|s| s.parse().ok());
        ListFilters::new(status, self.page, self.q.as_deref())
    }
}

/// Delete a conversation.
///
/// POST /admin/dashboard/chatbot/{id}/delete
#[instrument(skip_all)]
async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    AdminBackend(api): AdminBackend,
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Form(form): Form<DeleteForm>,
) -> Response {
    let confirmed = form.confirm.as_deref() == Some("yes");
    let back = form.back().href();
    let mut viewer = SessionViewer::new(api, state.viewer_config());
    match viewer.delete(ConversationId::new(id), confirmed).await {
        Ok(true) => {
            tracing::info!(admin_id = %admin.id, conversation_id = id, "Admin deleted conversation");
            set_flash(&session, Flash::success("Conversation deleted", None)).await;
            see_other(&headers, &back)
        }
        Ok(false) => fragment_error(AppError::BadRequest(
            "Confirm the deletion to continue".to_string(),
        )),
        Err(e) if is_htmx(&headers) => fragment_error(e.into()),
        Err(e) => {
            set_flash(&session, Flash::error("Delete failed", Some(e.user_message()))).await;
            Redirect::to(&back).into_response()
        }
    }
}
