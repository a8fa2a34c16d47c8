//! Chatbot conversations as returned by the backend.
//!
//! The list endpoint is not consistent about its response shape, so
//! [`Page`] accepts every form it has been seen to produce:
//!
//! - a paginated envelope `{count, next, previous, results}`
//! - a bare array
//! - either of the above wrapped in `{data: ...}`
//!
//! Every [`Conversation`] also normalizes a missing or `null` `messages`
//! field to an empty list, so callers never need to distinguish "not
//! loaded" from "no messages".

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{ConversationId, ConversationStatus, MessageId, MessageType};

/// Page size used by the backend's conversation list.
pub const CONVERSATION_PAGE_SIZE: u32 = 10;

/// A chatbot session with its metadata and message history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub session_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub user_phone: Option<String>,
    /// No default: a row without a status is rejected.
    pub status: ConversationStatus,
    #[serde(default)]
    pub manual_reply_active: bool,
    #[serde(default)]
    pub is_lead: bool,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_activity: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub message_count: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub collected_data: BTreeMap<String, Option<String>>,
    /// Ordered as returned by the server. Never re-sorted.
    #[serde(default, deserialize_with = "null_as_default")]
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Visitor name, falling back to a neutral label.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.user_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or("Anonymous visitor")
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Whether an admin-authored reply may be sent right now.
    #[must_use]
    pub const fn accepts_manual_reply(&self) -> bool {
        self.manual_reply_active && self.status.is_active()
    }

    /// Number of messages, preferring the server's count when the list row
    /// was returned without its history.
    #[must_use]
    pub fn total_messages(&self) -> usize {
        match self.message_count {
            Some(count) if self.messages.is_empty() => count as usize,
            _ => self.messages.len(),
        }
    }

    #[must_use]
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Case-insensitive substring match on session id, visitor name, or email.
    ///
    /// An empty (or whitespace-only) query matches everything.
    #[must_use]
    pub fn matches_search(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        let contains = |field: &str| field.to_lowercase().contains(&needle);
        contains(&self.session_id)
            || self.user_name.as_deref().is_some_and(contains)
            || self.user_email.as_deref().is_some_and(contains)
    }
}

/// A single chatbot message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub message_type: MessageType,
    #[serde(default)]
    pub is_admin_reply: bool,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub response_time_ms: Option<u64>,
}

impl Message {
    /// True for anything a human admin wrote.
    #[must_use]
    pub fn is_from_admin(&self) -> bool {
        self.is_admin_reply || self.message_type == MessageType::Admin
    }

    #[must_use]
    pub fn sender_label(&self) -> &'static str {
        if self.is_from_admin() {
            "Admin"
        } else if self.message_type == MessageType::User {
            "Visitor"
        } else {
            "Assistant"
        }
    }
}

/// Filter a fetched page by a search query without touching the page itself.
#[must_use]
pub fn filter_conversations<'a>(items: &'a [Conversation], query: &str) -> Vec<&'a Conversation> {
    items.iter().filter(|c| c.matches_search(query)).collect()
}

/// Replace the entry with the same id in a list, returning whether one was found.
pub fn patch_conversation(items: &mut [Conversation], updated: &Conversation) -> bool {
    items
        .iter_mut()
        .find(|c| c.id == updated.id)
        .map(|slot| *slot = updated.clone())
        .is_some()
}

/// A normalized list response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawPage<T>", bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// A normalized conversation list page.
pub type ConversationPage = Page<Conversation>;

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            count: 0,
            next: None,
            previous: None,
            results: Vec::new(),
        }
    }
}

impl<T> Page<T> {
    /// Page number behind the `next` link.
    #[must_use]
    pub fn next_page(&self) -> Option<u32> {
        self.next.as_deref().and_then(page_number)
    }

    /// Page number behind the `previous` link.
    #[must_use]
    pub fn previous_page(&self) -> Option<u32> {
        self.previous.as_deref().and_then(page_number)
    }

    /// Total number of pages for the given page size, at least one.
    #[must_use]
    pub fn total_pages(&self, page_size: u32) -> u32 {
        let size = u64::from(page_size.max(1));
        u32::try_from(self.count.div_ceil(size).max(1)).unwrap_or(u32::MAX)
    }
}

#[derive(Deserialize)]
#[serde(untagged, bound(deserialize = "T: Deserialize<'de>"))]
enum RawPage<T> {
    Bare(Vec<T>),
    Wrapped {
        data: Box<RawPage<T>>,
    },
    Envelope {
        #[serde(default)]
        count: Option<u64>,
        #[serde(default)]
        next: Option<String>,
        #[serde(default)]
        previous: Option<String>,
        #[serde(deserialize_with = "null_as_default")]
        results: Vec<T>,
    },
}

impl<T> From<RawPage<T>> for Page<T> {
    fn from(raw: RawPage<T>) -> Self {
        match raw {
            RawPage::Envelope {
                count,
                next,
                previous,
                results,
            } => Self {
                count: count.unwrap_or(results.len() as u64),
                next,
                previous,
                results,
            },
            RawPage::Bare(results) => Self {
                count: results.len() as u64,
                next: None,
                previous: None,
                results,
            },
            RawPage::Wrapped { data } => Self::from(*data),
        }
    }
}

/// Extract the `page` query parameter from a pagination link.
///
/// Links without a `page` parameter point at the first page (the backend
/// drops `page=1` from its `previous` links). Relative links are accepted.
#[must_use]
pub fn page_number(link: &str) -> Option<u32> {
    let parsed = url::Url::parse(link).or_else(|_| {
        url::Url::parse("http://backend.invalid/").and_then(|base| base.join(link))
    });
    let parsed = parsed.ok()?;
    let page = parsed
        .query_pairs()
        .find(|(key, _)| key == "page")
        .map(|(_, value)| value.into_owned());
    match page {
        Some(value) => value.parse().ok(),
        None => Some(1),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
