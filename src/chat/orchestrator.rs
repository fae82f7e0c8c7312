// src/chat/orchestrator.rs
// Per-turn coordination: resolve session, retrieve knowledge, generate a
// reply, persist both sides of the exchange.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info};

use super::intent::{classify_intent, derive_quick_replies};
use crate::conversation::{
    ChatMessage, ConversationSession, ConversationStore, DeviceMetadata, SessionSummary,
};
use crate::feedback::{FeedbackRecord, FeedbackStore, UserFeedbackStats};
use crate::identity::AuthUser;
use crate::knowledge::KnowledgeStore;
use crate::llm::prompt::context_block;
use crate::llm::ReplyGateway;

/// Hard cap on an inbound chat message.
pub const MAX_MESSAGE_CHARS: usize = 1000;
/// At most this many knowledge entries feed one reply.
pub const KNOWLEDGE_RESULT_CAP: u32 = 7;

pub const POPULAR_QUESTIONS: [&str; 6] = [
    "What are the working hours?",
    "How do I set up my email?",
    "What benefits do I get?",
    "Who do I contact for IT help?",
    "How do I request vacation days?",
    "Where can I find the employee handbook?",
];

/// Failure taxonomy for chat operations. Upstream (model) failures never
/// appear here; the gateway absorbs them into fallback text.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Caller input rejected; no state was mutated.
    #[error("{0}")]
    Validation(String),
    /// Session/conversation missing or not owned by the caller. One variant
    /// for both so responses never confirm another user's session exists.
    #[error("conversation not found")]
    NotFound,
    /// Storage failed mid-operation.
    #[error("storage failure: {0}")]
    Persistence(#[from] sqlx::Error),
}

#[derive(Debug, Serialize)]
pub struct ChatTurnResult {
    pub reply: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(rename = "conversationId")]
    pub conversation_id: String,
    #[serde(rename = "quickReplies")]
    pub quick_replies: Vec<String>,
    #[serde(rename = "sourcesCount")]
    pub sources_count: usize,
    #[serde(rename = "responseTime")]
    pub response_time_ms: i64,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    #[serde(rename = "conversationId")]
    pub conversation_id: String,
    pub rating: i64,
    pub comment: Option<String>,
    #[serde(rename = "isHelpful")]
    pub is_helpful: Option<bool>,
    pub question: Option<String>,
    #[serde(rename = "botResponse")]
    pub bot_response: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CallerStats {
    #[serde(rename = "sessionCount")]
    pub session_count: i64,
    #[serde(rename = "messageCount")]
    pub message_count: i64,
    #[serde(flatten)]
    pub feedback: UserFeedbackStats,
}

#[derive(Clone)]
pub struct ChatOrchestrator {
    conversations: ConversationStore,
    knowledge: KnowledgeStore,
    feedback: FeedbackStore,
    gateway: Arc<ReplyGateway>,
}

impl ChatOrchestrator {
    pub fn new(
        conversations: ConversationStore,
        knowledge: KnowledgeStore,
        feedback: FeedbackStore,
        gateway: Arc<ReplyGateway>,
    ) -> Self {
        Self {
            conversations,
            knowledge,
            feedback,
            gateway,
        }
    }

    /// One chat turn. Appends exactly one user message and one bot message
    /// to the resolved session, even when the model gateway degrades.
    pub async fn handle_turn(
        &self,
        user: &AuthUser,
        message: &str,
        client_session_id: Option<&str>,
        device: DeviceMetadata,
    ) -> Result<ChatTurnResult, ChatError> {
        // Validation first; a rejected message must not touch any store.
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::Validation("Message must not be empty".into()));
        }
        if message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(ChatError::Validation(format!(
                "Message exceeds the {} character limit",
                MAX_MESSAGE_CHARS
            )));
        }

        // Resolve the session: an unknown or foreign token gets a fresh
        // session rather than an error, so a stale client recovers silently.
        let session = match client_session_id {
            Some(token) => match self.conversations.find_session(token, &user.id).await? {
                Some(existing) => existing,
                None => self.conversations.create_session(user, device).await?,
            },
            None => self.conversations.create_session(user, device).await?,
        };

        let intent = classify_intent(message);
        let user_message = ChatMessage::user(message, intent.as_str());

        let results = self
            .knowledge
            .search_by_role(message, user.role, KNOWLEDGE_RESULT_CAP)
            .await?;
        let context = context_block(&results);
        let source_ids: Vec<String> = results.iter().map(|e| e.id.clone()).collect();

        let started = Instant::now();
        let reply = self
            .gateway
            .generate_reply(message, &context, user.role, &user.name)
            .await;
        let latency_ms = started.elapsed().as_millis() as i64;

        let quick_replies = derive_quick_replies(&results, user.role);
        let bot_message =
            ChatMessage::bot(&reply, quick_replies.clone(), source_ids.clone(), latency_ms);

        // Persist the whole turn. A failure here loses the generated reply
        // and is surfaced as a server error rather than silently dropped.
        self.conversations
            .append_turn(&session.session_id, &user_message, &bot_message)
            .await
            .map_err(|e| {
                error!(
                    "Failed to persist chat turn for session {}: {}",
                    session.session_id, e
                );
                ChatError::Persistence(e)
            })?;

        // View counters are commutative side effects; run them off the
        // response path and never let them affect the result.
        let knowledge = self.knowledge.clone();
        let ids = source_ids.clone();
        tokio::spawn(async move {
            for id in ids {
                knowledge.increment_view(&id).await;
            }
        });

        info!(
            "Chat turn complete: session={} intent={} sources={} latency_ms={}",
            session.session_id,
            intent.as_str(),
            source_ids.len(),
            latency_ms
        );

        Ok(ChatTurnResult {
            reply,
            session_id: session.session_id,
            conversation_id: session.id,
            quick_replies,
            sources_count: source_ids.len(),
            response_time_ms: latency_ms,
        })
    }

    pub async fn get_history(
        &self,
        user: &AuthUser,
        limit: u32,
    ) -> Result<Vec<SessionSummary>, ChatError> {
        Ok(self.conversations.find_by_user(&user.id, limit).await?)
    }

    pub async fn get_transcript(
        &self,
        user: &AuthUser,
        session_id: &str,
    ) -> Result<ConversationSession, ChatError> {
        self.conversations
            .find_session(session_id, &user.id)
            .await?
            .ok_or(ChatError::NotFound)
    }

    /// Plain-text transcript for download.
    pub async fn export_transcript(
        &self,
        user: &AuthUser,
        session_id: &str,
    ) -> Result<String, ChatError> {
        let session = self.get_transcript(user, session_id).await?;
        let mut out = format!(
            "Conversation transcript\nSession: {}\nStarted: {}\nParticipant: {} <{}>\n\n",
            session.session_id,
            session.created_at.format("%Y-%m-%d %H:%M UTC"),
            session.user_name,
            session.user_email,
        );
        for message in &session.messages {
            out.push_str(&format!(
                "[{}] {}: {}\n",
                message.timestamp.format("%Y-%m-%d %H:%M"),
                match message.role {
                    crate::conversation::MessageRole::User => &session.user_name,
                    _ => "Assistant",
                },
                message.content
            ));
        }
        Ok(out)
    }

    /// Record feedback for a conversation the caller owns. Ratings must be
    /// whole numbers in 1..=5; `is_helpful` defaults to rating >= 4.
    pub async fn submit_feedback(
        &self,
        user: &AuthUser,
        request: &FeedbackRequest,
    ) -> Result<FeedbackRecord, ChatError> {
        if !(1..=5).contains(&request.rating) {
            return Err(ChatError::Validation(
                "Rating must be an integer between 1 and 5".into(),
            ));
        }

        let session = self
            .conversations
            .find_by_conversation_id(&request.conversation_id, &user.id)
            .await?
            .ok_or(ChatError::NotFound)?;

        let is_helpful = request.is_helpful.unwrap_or(request.rating >= 4);
        let mut record = FeedbackRecord::new(user, &session.id, request.rating, is_helpful);
        record.comment = request.comment.clone();

        // Denormalize the last exchange unless the caller supplied one.
        record.question = request
            .question
            .clone()
            .or_else(|| session.last_user_message().map(|m| m.content.clone()))
            .unwrap_or_default();
        if let Some(bot) = session.last_bot_message() {
            record.bot_response = request
                .bot_response
                .clone()
                .unwrap_or_else(|| bot.content.clone());
            record.response_time_ms = bot.response_time_ms;
            record.source_count = bot.knowledge_sources.len() as i64;
        } else if let Some(explicit) = &request.bot_response {
            record.bot_response = explicit.clone();
        }

        self.feedback.insert(&record).await?;
        self.conversations
            .stamp_feedback(&session.id, record.rating, record.comment.as_deref())
            .await?;
        Ok(record)
    }

    pub async fn caller_stats(&self, user: &AuthUser) -> Result<CallerStats, ChatError> {
        let sessions = self
            .conversations
            .find_by_user(&user.id, u32::MAX)
            .await?;
        let session_count = sessions.len() as i64;
        let message_count = sessions.iter().map(|s| s.message_count).sum();
        let feedback = self.feedback.user_stats(&user.id).await?;
        Ok(CallerStats {
            session_count,
            message_count,
            feedback,
        })
    }

    pub async fn delete_session(
        &self,
        user: &AuthUser,
        session_id: &str,
    ) -> Result<(), ChatError> {
        if self
            .conversations
            .delete_session(session_id, &user.id)
            .await?
        {
            Ok(())
        } else {
            Err(ChatError::NotFound)
        }
    }

    pub async fn delete_all(&self, user: &AuthUser) -> Result<u64, ChatError> {
        Ok(self.conversations.delete_all_for_user(&user.id).await?)
    }
}
