//! Chatbot conversation endpoints.

use std::future::Future;

use aaa_core::{Conversation, ConversationId, ConversationPage, ConversationStatus};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::BackendError;
use super::client::{AuthorizedBackend, read_empty, read_json};

/// Filters for a conversation list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversationQuery {
    pub status: Option<ConversationStatus>,
    /// 1-based page number.
    pub page: u32,
    pub is_lead: Option<bool>,
}

impl Default for ConversationQuery {
    fn default() -> Self {
        Self {
            status: None,
            page: 1,
            is_lead: None,
        }
    }
}

impl ConversationQuery {
    fn to_params(self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        if self.page > 1 {
            params.push(("page", self.page.to_string()));
        }
        if let Some(is_lead) = self.is_lead {
            params.push(("is_lead", is_lead.to_string()));
        }
        params
    }
}

/// Result of flipping manual-reply mode.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ToggleResponse {
    pub manual_reply_active: bool,
    #[serde(default)]
    pub message: String,
}

impl ToggleResponse {
    /// Short notice for the flash toast.
    #[must_use]
    pub const fn headline(&self) -> &'static str {
        if self.manual_reply_active {
            "Manual reply enabled"
        } else {
            "Auto reply restored"
        }
    }
}

/// Result of sending an admin-authored reply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReplyResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub manual_reply_active: Option<bool>,
    #[serde(default)]
    pub status: Option<ConversationStatus>,
}

#[derive(Serialize)]
struct ReplyBody<'a> {
    message: &'a str,
}

/// The conversation operations the session viewer needs.
///
/// Implemented by [`AuthorizedBackend`]; tests supply in-memory fakes.
pub trait ConversationApi: Clone + Send + Sync + 'static {
    /// Fetch one page of conversations.
    fn list_conversations(
        &self,
        query: ConversationQuery,
    ) -> impl Future<Output = Result<ConversationPage, BackendError>> + Send;

    /// Fetch a single conversation including its messages.
    fn get_conversation(
        &self,
        id: ConversationId,
    ) -> impl Future<Output = Result<Conversation, BackendError>> + Send;

    /// Flip manual-reply mode for an active conversation.
    fn toggle_manual_reply(
        &self,
        id: ConversationId,
    ) -> impl Future<Output = Result<ToggleResponse, BackendError>> + Send;

    /// Post an admin reply. The backend requires manual mode to be on.
    fn send_manual_reply(
        &self,
        id: ConversationId,
        content: &str,
    ) -> impl Future<Output = Result<ReplyResponse, BackendError>> + Send;

    /// Delete a conversation and its messages.
    fn delete_conversation(
        &self,
        id: ConversationId,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;
}

impl ConversationApi for AuthorizedBackend {
    #[instrument(skip(self), fields(status = ?query.status, page = query.page))]
    async fn list_conversations(&self, query: ConversationQuery) -> Result<ConversationPage, BackendError> {
        let response = self
            .request_with_query(Method::GET, "api/chatbot/conversations/", &query.to_params())?
            .send()
            .await?;
        read_json(response).await
    }

    #[instrument(skip(self), fields(conversation_id = %id))]
    async fn get_conversation(&self, id: ConversationId) -> Result<Conversation, BackendError> {
        let response = self
            .request(Method::GET, &format!("api/chatbot/conversations/{id}/"))?
            .send()
            .await?;
        read_json(response).await
    }

    #[instrument(skip(self), fields(conversation_id = %id))]
    async fn toggle_manual_reply(&self, id: ConversationId) -> Result<ToggleResponse, BackendError> {
        let response = self
            .request(
                Method::POST,
                &format!("api/chatbot/conversations/{id}/toggle_manual_reply/"),
            )?
            .send()
            .await?;
        read_json(response).await
    }

    #[instrument(skip(self, content), fields(conversation_id = %id, len = content.len()))]
    async fn send_manual_reply(
        &self,
        id: ConversationId,
        content: &str,
    ) -> Result<ReplyResponse, BackendError> {
        let response = self
            .request(
                Method::POST,
                &format!("api/chatbot/conversations/{id}/send_manual_reply/"),
            )?
            .json(&ReplyBody { message: content })
            .send()
            .await?;
        read_json(response).await
    }

    #[instrument(skip(self), fields(conversation_id = %id))]
    async fn delete_conversation(&self, id: ConversationId) -> Result<(), BackendError> {
        let response = self
            .request(Method::DELETE, &format!("api/chatbot/conversations/{id}/"))?
            .send()
            .await?;
        read_empty(response).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params_skip_defaults() {
        assert!(ConversationQuery::default().to_params().is_empty());

        let query = ConversationQuery {
            status: Some(ConversationStatus::Active),
            page: 3,
            is_lead: Some(true),
        };
        assert_eq!(
            query.to_params(),
            vec![
                ("status", "active".to_string()),
                ("page", "3".to_string()),
                ("is_lead", "true".to_string()),
            ]
        );
    }

    #[test]
    fn test_toggle_response_headline() {
        let on: ToggleResponse = serde_json::from_str(
            r#"{"manual_reply_active": true, "message": "Switched to Manual mode"}"#,
        )
        .unwrap();
        assert_eq!(on.headline(), "Manual reply enabled");

        let off: ToggleResponse = serde_json::from_str(r#"{"manual_reply_active": false}"#).unwrap();
        assert_eq!(off.headline(), "Auto reply restored");
        assert!(off.message.is_empty());
    }

    #[test]
    fn test_reply_response_accepts_minimal_body() {
        let reply: ReplyResponse =
            serde_json::from_str(r#"{"message": "Manual reply sent successfully"}"#).unwrap();
        assert_eq!(reply.message, "Manual reply sent successfully");
        assert_eq!(reply.status, None);
    }
}
