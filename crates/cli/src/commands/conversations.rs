//! Chatbot conversation commands.
//!
//! # Usage
//!
//! ```bash
//! aaa-cli conversations list --status active --page 2
//! aaa-cli conversations list --search "@gmail.com"
//! aaa-cli conversations watch 118
//! ```
//!
//! `watch` opens a live session viewer: the conversation is re-fetched on
//! the admin poll interval and new messages are printed until it leaves
//! `active` or the command is interrupted.
//!
//! # Environment Variables
//!
//! - `BACKEND_API_URL` - Base URL of the backend REST API
//! - `BACKEND_API_TOKEN` - Admin access token
//! - `ADMIN_POLL_INTERVAL_MS` - Poll interval for `watch` (default: 2000)

use std::time::Duration;

use aaa_admin::backend::ConversationQuery;
use aaa_admin::config::ViewerConfig;
use aaa_admin::services::SessionViewer;
use aaa_core::conversation::CONVERSATION_PAGE_SIZE;
use aaa_core::{Conversation, ConversationId, ConversationStatus, Message};

use super::{CommandError, backend_from_env};

fn viewer_config() -> ViewerConfig {
    let mut config = ViewerConfig::default();
    if let Some(ms) = std::env::var("ADMIN_POLL_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|ms| *ms > 0)
    {
        config.poll_interval = Duration::from_millis(ms);
    }
    config
}

fn describe(conversation: &Conversation) -> String {
    let contact = conversation
        .user_email
        .as_deref()
        .or(conversation.user_phone.as_deref())
        .unwrap_or("-");
    format!(
        "{:>6}  {:<10} {:<24} {:<32} {:>4} msgs  {}{}",
        conversation.id,
        conversation.status.label(),
        conversation.display_name(),
        contact,
        conversation.total_messages(),
        conversation.started_at.format("%Y-%m-%d %H:%M"),
        if conversation.is_lead { "  lead" } else { "" },
    )
}

fn print_message(message: &Message) {
    tracing::info!(
        "[{}] {}: {}",
        message.timestamp.format("%H:%M:%S"),
        message.sender_label(),
        message.content
    );
}

/// Print one page of conversations, optionally narrowed by a search.
pub async fn list(
    status: Option<ConversationStatus>,
    page: u32,
    search: Option<&str>,
) -> Result<(), CommandError> {
    let mut viewer = SessionViewer::new(backend_from_env()?, viewer_config());
    viewer.set_query(ConversationQuery {
        status,
        page: page.max(1),
        is_lead: None,
    });
    if let Some(search) = search {
        viewer.set_search(search);
    }

    let (count, total_pages) = {
        let page = viewer.load().await?;
        (page.count, page.total_pages(CONVERSATION_PAGE_SIZE))
    };

    let visible = viewer.visible();
    tracing::info!(
        "Page {} of {} ({} conversations, {} shown)",
        viewer.query().page,
        total_pages.max(1),
        count,
        visible.len()
    );
    for conversation in visible {
        tracing::info!("  {}", describe(conversation));
    }
    Ok(())
}

/// Follow a conversation, printing messages as they arrive.
pub async fn watch(id: ConversationId) -> Result<(), CommandError> {
    let mut viewer = SessionViewer::live(backend_from_env()?, viewer_config());

    let mut printed = {
        let conversation = viewer.open(id).await?;
        tracing::info!("{}", describe(conversation));
        for message in &conversation.messages {
            print_message(message);
        }
        conversation.messages.len()
    };

    if !viewer.is_polling() {
        tracing::info!("Conversation is not active; nothing to watch");
        return Ok(());
    }

    loop {
        tokio::select! {
            update = viewer.next_update() => {
                let Some(update) = update else {
                    break;
                };
                let messages = &update.conversation.messages;
                for message in messages.iter().skip(printed) {
                    print_message(message);
                }
                printed = printed.max(messages.len());
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    let status = viewer
        .selected()
        .map_or(ConversationStatus::Completed, |c| c.status);
    viewer.close().await;
    tracing::info!("Stopped watching ({})", status.label());
    Ok(())
}

