// src/conversation/mod.rs
// Per-user chat sessions with an append-only message log.

mod query;
mod store;

pub use store::ConversationStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{AuthUser, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Bot,
    System,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Bot => "bot",
            MessageRole::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<MessageRole> {
        match s {
            "user" => Some(MessageRole::User),
            "bot" => Some(MessageRole::Bot),
            "system" => Some(MessageRole::System),
            _ => None,
        }
    }
}

/// One message in a session. Immutable once appended.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Suggested follow-ups; populated on bot messages only.
    #[serde(rename = "quickReplies")]
    pub quick_replies: Vec<String>,
    pub intent: Option<String>,
    #[serde(rename = "length")]
    pub content_length: i64,
    #[serde(rename = "responseTime")]
    pub response_time_ms: Option<i64>,
    #[serde(rename = "knowledgeSources")]
    pub knowledge_sources: Vec<String>,
}

impl ChatMessage {
    pub fn user(content: &str, intent: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: MessageRole::User,
            content: content.to_string(),
            timestamp: Utc::now(),
            quick_replies: Vec::new(),
            intent: Some(intent.to_string()),
            content_length: content.chars().count() as i64,
            response_time_ms: None,
            knowledge_sources: Vec::new(),
        }
    }

    pub fn bot(
        content: &str,
        quick_replies: Vec<String>,
        knowledge_sources: Vec<String>,
        response_time_ms: i64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: MessageRole::Bot,
            content: content.to_string(),
            timestamp: Utc::now(),
            quick_replies,
            intent: None,
            content_length: content.chars().count() as i64,
            response_time_ms: Some(response_time_ms),
            knowledge_sources,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeviceMetadata {
    pub device_type: String,
    pub browser: String,
    pub ip_address: String,
}

/// A caller-scoped conversation. `id` is the stable conversation id used by
/// feedback linkage; `session_id` is the opaque token the client holds.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    pub id: String,
    pub session_id: String,
    pub user_id: String,
    pub user_email: String,
    pub user_name: String,
    pub user_role: Role,
    pub feedback_rating: Option<i64>,
    pub feedback_comment: Option<String>,
    pub feedback_at: Option<DateTime<Utc>>,
    pub device: DeviceMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<ChatMessage>,
}

impl ConversationSession {
    pub fn new(user: &AuthUser, device: DeviceMetadata) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: uuid::Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            user_email: user.email.clone(),
            user_name: user.name.clone(),
            user_role: user.role,
            feedback_rating: None,
            feedback_comment: None,
            feedback_at: None,
            device,
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
        }
    }

    /// Last user message content, if any. Used to denormalize feedback.
    pub fn last_user_message(&self) -> Option<&ChatMessage> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
    }

    pub fn last_bot_message(&self) -> Option<&ChatMessage> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Bot)
    }
}

/// Listing row for GET /chat/history.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(rename = "messageCount")]
    pub message_count: i64,
    #[serde(rename = "lastMessage")]
    pub last_message: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "userRole")]
    pub user_role: Role,
}
