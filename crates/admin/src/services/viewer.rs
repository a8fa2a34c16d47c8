//! Chatbot session viewer.
//!
//! Holds the state behind the conversation screen: the fetched list page,
//! the status filter and search box, and the conversation open in the
//! detail view.
//!
//! A viewer is either request-scoped (built per HTTP request, never polls)
//! or *live* (owned by an SSE stream or the CLI `watch` command). A live
//! viewer re-fetches an open, active conversation on a fixed interval and
//! delivers the delayed re-fetch that follows a manual reply. Both arrive
//! through [`SessionViewer::next_update`]; the viewer is the only owner of
//! its state, so nothing here is locked.
//!
//! Dropping a viewer aborts its background tasks.

use std::future::pending;
use std::time::Duration;

use aaa_core::conversation::{filter_conversations, patch_conversation};
use aaa_core::{Conversation, ConversationId, ConversationPage, ConversationStatus};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::instrument;

use crate::backend::{BackendError, ConversationApi, ConversationQuery, ReplyResponse, ToggleResponse};
use crate::config::ViewerConfig;

/// Buffered poll results; the poller waits when the viewer falls behind.
const POLL_CHANNEL_CAPACITY: usize = 4;

// =============================================================================
// Polling
// =============================================================================

/// A running poll task for one conversation.
///
/// The task re-fetches the conversation every interval and forwards each
/// result. It ends on its own after forwarding a conversation that is no
/// longer active. [`PollHandle::cancel`] and `Drop` abort it.
#[derive(Debug)]
pub struct PollHandle {
    conversation_id: ConversationId,
    task: JoinHandle<()>,
    updates: mpsc::Receiver<Conversation>,
}

impl PollHandle {
    /// Start polling. The first fetch happens one interval from now.
    pub fn spawn<A: ConversationApi>(api: A, conversation_id: ConversationId, every: Duration) -> Self {
        let (tx, updates) = mpsc::channel(POLL_CHANNEL_CAPACITY);

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                match api.get_conversation(conversation_id).await {
                    Ok(conversation) => {
                        let still_active = conversation.is_active();
                        if tx.send(conversation).await.is_err() || !still_active {
                            break;
                        }
                    }
                    Err(e) if e.is_unauthorized() => {
                        tracing::warn!(%conversation_id, error = %e, "Poll rejected, stopping");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(%conversation_id, error = %e, "Poll tick failed, skipping");
                    }
                }
            }
        });

        Self {
            conversation_id,
            task,
            updates,
        }
    }

    #[must_use]
    pub const fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    /// Stop polling. Safe to call more than once.
    pub fn cancel(&self) {
        self.task.abort();
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// =============================================================================
// Viewer
// =============================================================================

/// Why a reply was not sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NothingOpen,
    ManualReplyOff,
    EmptyMessage,
}

impl SkipReason {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NothingOpen => "No conversation is open",
            Self::ManualReplyOff => "Enable manual reply before sending a message",
            Self::EmptyMessage => "Message is required",
        }
    }
}

/// Result of [`SessionViewer::send_reply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The backend accepted the reply.
    Sent(ReplyResponse),
    /// Nothing was sent and no request was made.
    Skipped(SkipReason),
}

/// Where a background update came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateSource {
    Poll,
    ReplyFollowup,
}

/// A fresh copy of the open conversation, already applied to the viewer.
#[derive(Debug, Clone)]
pub struct ViewerUpdate {
    pub conversation: Conversation,
    /// Whether the matching list row was replaced too.
    pub row_patched: bool,
    pub source: UpdateSource,
}

enum Pending {
    Poll(Option<Conversation>),
    Followup(Result<Result<Conversation, BackendError>, JoinError>),
}

/// State machine behind the chatbot conversations screen.
pub struct SessionViewer<A: ConversationApi> {
    api: A,
    config: ViewerConfig,
    live: bool,
    query: ConversationQuery,
    search: String,
    list: Option<ConversationPage>,
    list_error: Option<String>,
    selected: Option<Conversation>,
    poll: Option<PollHandle>,
    followup: Option<JoinHandle<Result<Conversation, BackendError>>>,
}

impl<A: ConversationApi> std::fmt::Debug for SessionViewer<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionViewer")
            .field("live", &self.live)
            .field("query", &self.query)
            .field("search", &self.search)
            .field("selected", &self.selected.as_ref().map(|c| c.id))
            .field("polling", &self.is_polling())
            .finish_non_exhaustive()
    }
}

impl<A: ConversationApi> SessionViewer<A> {
    /// Request-scoped viewer. Never starts background tasks.
    pub fn new(api: A, config: ViewerConfig) -> Self {
        Self::build(api, config, false)
    }

    /// Long-lived viewer that polls the open conversation.
    pub fn live(api: A, config: ViewerConfig) -> Self {
        Self::build(api, config, true)
    }

    fn build(api: A, config: ViewerConfig, live: bool) -> Self {
        Self {
            api,
            config,
            live,
            query: ConversationQuery {
                status: None,
                page: 1,
                is_lead: None,
            },
            search: String::new(),
            list: None,
            list_error: None,
            selected: None,
            poll: None,
            followup: None,
        }
    }

    // -------------------------------------------------------------------------
    // List
    // -------------------------------------------------------------------------

    /// Fetch the current list page.
    ///
    /// On failure the previous page (if any) is kept and the error is
    /// recorded for the retry banner.
    ///
    /// # Errors
    ///
    /// Returns the backend error after recording it.
    #[instrument(skip(self), fields(status = ?self.query.status, page = self.query.page))]
    pub async fn load(&mut self) -> Result<&ConversationPage, BackendError> {
        match self.api.list_conversations(self.query).await {
            Ok(page) => {
                self.list_error = None;
                Ok(&*self.list.insert(page))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load conversations");
                self.list_error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Re-issue the last list query.
    ///
    /// # Errors
    ///
    /// Returns the backend error after recording it.
    pub async fn retry(&mut self) -> Result<&ConversationPage, BackendError> {
        self.load().await
    }

    /// Change the status filter and go back to page 1.
    ///
    /// # Errors
    ///
    /// Returns the backend error after recording it.
    pub async fn set_status_filter(
        &mut self,
        status: Option<ConversationStatus>,
    ) -> Result<&ConversationPage, BackendError> {
        self.query.status = status;
        self.query.page = 1;
        self.load().await
    }

    /// Move to another page of the current filter.
    ///
    /// # Errors
    ///
    /// Returns the backend error after recording it.
    pub async fn set_page(&mut self, page: u32) -> Result<&ConversationPage, BackendError> {
        self.query.page = page.max(1);
        self.load().await
    }

    /// Replace the filter and page without fetching.
    pub fn set_query(&mut self, query: ConversationQuery) {
        self.query = ConversationQuery {
            page: query.page.max(1),
            ..query
        };
    }

    /// Set the search text. Filters the fetched page only.
    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
    }

    /// Conversations on the current page matching the search text.
    #[must_use]
    pub fn visible(&self) -> Vec<&Conversation> {
        self.list
            .as_ref()
            .map(|page| filter_conversations(&page.results, &self.search))
            .unwrap_or_default()
    }

    #[must_use]
    pub const fn list(&self) -> Option<&ConversationPage> {
        self.list.as_ref()
    }

    #[must_use]
    pub fn list_error(&self) -> Option<&str> {
        self.list_error.as_deref()
    }

    #[must_use]
    pub const fn query(&self) -> ConversationQuery {
        self.query
    }

    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    // -------------------------------------------------------------------------
    // Detail
    // -------------------------------------------------------------------------

    #[must_use]
    pub const fn selected(&self) -> Option<&Conversation> {
        self.selected.as_ref()
    }

    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.poll.as_ref().is_some_and(|p| !p.is_finished())
    }

    /// Open a conversation in the detail view.
    ///
    /// The view is seeded from the list row, then replaced by a full fetch.
    /// If the fetch fails the seed is kept; without a seed the error is
    /// returned and nothing is open.
    ///
    /// # Errors
    ///
    /// Returns the backend error when there was no list row to fall back to.
    #[instrument(skip(self), fields(conversation_id = %id))]
    pub async fn open(&mut self, id: ConversationId) -> Result<&Conversation, BackendError> {
        if self.selected.as_ref().is_some_and(|c| c.id != id) {
            self.close().await;
        }
        self.cancel_followup();

        self.selected = self
            .list
            .as_ref()
            .and_then(|page| page.results.iter().find(|c| c.id == id))
            .cloned();

        match self.api.get_conversation(id).await {
            Ok(full) => {
                self.apply(full);
            }
            Err(e) if self.selected.is_some() => {
                tracing::warn!(error = %e, "Full fetch failed, showing list data");
            }
            Err(e) => return Err(e),
        }

        self.sync_polling();
        self.selected
            .as_ref()
            .ok_or_else(|| BackendError::NotFound(format!("conversation {id}")))
    }

    /// Close the detail view.
    ///
    /// Stops polling. If the conversation was left in manual mode while
    /// active, asks the backend to switch back to auto; a failure there is
    /// ignored.
    #[instrument(skip(self))]
    pub async fn close(&mut self) -> Option<Conversation> {
        self.stop_polling();
        self.cancel_followup();

        let closed = self.selected.take()?;
        if closed.manual_reply_active && closed.is_active() {
            match self.api.toggle_manual_reply(closed.id).await {
                Ok(response) => tracing::debug!(
                    conversation_id = %closed.id,
                    manual_reply_active = response.manual_reply_active,
                    "Restored auto reply on close"
                ),
                Err(e) => tracing::debug!(
                    conversation_id = %closed.id,
                    error = %e,
                    "Could not restore auto reply on close"
                ),
            }
        }
        Some(closed)
    }

    /// Re-fetch the open conversation and apply it.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the view keeps its previous data.
    pub async fn refresh(&mut self) -> Result<Option<&Conversation>, BackendError> {
        let Some(id) = self.selected.as_ref().map(|c| c.id) else {
            return Ok(None);
        };
        let fresh = self.api.get_conversation(id).await?;
        self.apply(fresh);
        self.sync_polling();
        Ok(self.selected.as_ref())
    }

    /// Flip manual-reply mode for the open conversation.
    ///
    /// Local state is not flipped; the conversation is re-fetched and the
    /// list reloaded so both show what the backend now holds.
    ///
    /// # Errors
    ///
    /// Returns the backend error from the toggle call.
    #[instrument(skip(self))]
    pub async fn toggle_manual_reply(&mut self) -> Result<Option<ToggleResponse>, BackendError> {
        let Some(id) = self.selected.as_ref().map(|c| c.id) else {
            return Ok(None);
        };

        let response = self.api.toggle_manual_reply(id).await?;
        tracing::info!(
            conversation_id = %id,
            manual_reply_active = response.manual_reply_active,
            "Toggled manual reply"
        );

        if let Err(e) = self.refresh().await {
            tracing::warn!(conversation_id = %id, error = %e, "Re-fetch after toggle failed");
        }
        if self.list.is_some() {
            // Failure is recorded on the viewer for the banner.
            let _ = self.load().await;
        }
        Ok(Some(response))
    }

    /// Send an admin reply on the open conversation.
    ///
    /// Skipped without a request unless manual mode is on and the trimmed
    /// text is non-empty. After sending, the conversation is re-fetched at
    /// once and, on a live viewer, again after the configured delay.
    ///
    /// # Errors
    ///
    /// Returns the backend error from the send call.
    #[instrument(skip(self, text))]
    pub async fn send_reply(&mut self, text: &str) -> Result<SendOutcome, BackendError> {
        let Some(open) = self.selected.as_ref() else {
            return Ok(SendOutcome::Skipped(SkipReason::NothingOpen));
        };
        if !open.manual_reply_active {
            return Ok(SendOutcome::Skipped(SkipReason::ManualReplyOff));
        }
        let body = text.trim();
        if body.is_empty() {
            return Ok(SendOutcome::Skipped(SkipReason::EmptyMessage));
        }

        let id = open.id;
        let response = self.api.send_manual_reply(id, body).await?;
        tracing::info!(conversation_id = %id, "Manual reply sent");

        if let Err(e) = self.refresh().await {
            tracing::warn!(conversation_id = %id, error = %e, "Re-fetch after reply failed");
        }
        if self.live {
            self.schedule_followup(id);
        }
        Ok(SendOutcome::Sent(response))
    }

    /// Delete a conversation. Does nothing unless `confirmed`.
    ///
    /// Returns whether a delete was issued. The list page is reloaded
    /// afterwards; a reload failure is recorded, not returned.
    ///
    /// # Errors
    ///
    /// Returns the backend error from the delete call.
    #[instrument(skip(self), fields(conversation_id = %id))]
    pub async fn delete(&mut self, id: ConversationId, confirmed: bool) -> Result<bool, BackendError> {
        if !confirmed {
            return Ok(false);
        }

        self.api.delete_conversation(id).await?;
        tracing::info!(conversation_id = %id, "Conversation deleted");

        if self.selected.as_ref().is_some_and(|c| c.id == id) {
            self.stop_polling();
            self.cancel_followup();
            self.selected = None;
        }
        // Failure is recorded on the viewer for the banner.
        let _ = self.load().await;
        Ok(true)
    }

    /// Wait for the next background update on a live viewer.
    ///
    /// Returns `None` once there is nothing left to wait for: no poll is
    /// running and no follow-up re-fetch is scheduled.
    pub async fn next_update(&mut self) -> Option<ViewerUpdate> {
        loop {
            if self.poll.is_none() && self.followup.is_none() {
                return None;
            }

            let event = tokio::select! {
                update = recv_poll(self.poll.as_mut()) => Pending::Poll(update),
                joined = join_followup(self.followup.as_mut()) => Pending::Followup(joined),
            };

            match event {
                Pending::Poll(Some(conversation)) => {
                    if let Some(update) = self.deliver(conversation, UpdateSource::Poll) {
                        return Some(update);
                    }
                }
                Pending::Poll(None) => self.poll = None,
                Pending::Followup(joined) => {
                    self.followup = None;
                    match joined {
                        Ok(Ok(conversation)) => {
                            if let Some(update) =
                                self.deliver(conversation, UpdateSource::ReplyFollowup)
                            {
                                return Some(update);
                            }
                        }
                        Ok(Err(e)) => {
                            tracing::warn!(error = %e, "Follow-up re-fetch failed");
                        }
                        Err(e) => tracing::debug!(error = %e, "Follow-up task ended"),
                    }
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn deliver(&mut self, conversation: Conversation, source: UpdateSource) -> Option<ViewerUpdate> {
        if self.selected.as_ref().map(|c| c.id) != Some(conversation.id) {
            return None;
        }
        let row_patched = self.apply(conversation.clone());
        self.sync_polling();
        Some(ViewerUpdate {
            conversation,
            row_patched,
            source,
        })
    }

    /// Replace the open conversation and its list row. Returns whether a row matched.
    fn apply(&mut self, conversation: Conversation) -> bool {
        let row_patched = self
            .list
            .as_mut()
            .is_some_and(|page| patch_conversation(&mut page.results, &conversation));
        self.selected = Some(conversation);
        row_patched
    }

    /// Poll exactly when a live viewer has an active conversation open.
    fn sync_polling(&mut self) {
        let wanted = if self.live {
            self.selected.as_ref().filter(|c| c.is_active()).map(|c| c.id)
        } else {
            None
        };

        match (wanted, self.poll.as_ref()) {
            (Some(id), Some(poll)) if poll.conversation_id() == id && !poll.is_finished() => {}
            (Some(id), _) => {
                self.stop_polling();
                tracing::debug!(conversation_id = %id, "Starting poll");
                self.poll = Some(PollHandle::spawn(self.api.clone(), id, self.config.poll_interval));
            }
            (None, Some(_)) => self.stop_polling(),
            (None, None) => {}
        }
    }

    fn stop_polling(&mut self) {
        if let Some(poll) = self.poll.take() {
            tracing::debug!(conversation_id = %poll.conversation_id(), "Stopping poll");
            poll.cancel();
        }
    }

    fn schedule_followup(&mut self, id: ConversationId) {
        self.cancel_followup();
        let api = self.api.clone();
        let delay = self.config.reply_refetch_delay;
        self.followup = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            api.get_conversation(id).await
        }));
    }

    fn cancel_followup(&mut self) {
        if let Some(task) = self.followup.take() {
            task.abort();
        }
    }
}

impl<A: ConversationApi> Drop for SessionViewer<A> {
    fn drop(&mut self) {
        self.cancel_followup();
    }
}

async fn recv_poll(poll: Option<&mut PollHandle>) -> Option<Conversation> {
    match poll {
        Some(poll) => poll.updates.recv().await,
        None => pending().await,
    }
}

async fn join_followup(
    task: Option<&mut JoinHandle<Result<Conversation, BackendError>>>,
) -> Result<Result<Conversation, BackendError>, JoinError> {
    match task {
        Some(task) => task.await,
        None => pending().await,
    }
}
