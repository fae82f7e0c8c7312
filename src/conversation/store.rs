// src/conversation/store.rs

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use super::query;
use super::{
    ChatMessage, ConversationSession, DeviceMetadata, MessageRole, SessionSummary,
};
use crate::identity::{AuthUser, Role};

#[derive(Clone)]
pub struct ConversationStore {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: String,
    session_id: String,
    user_id: String,
    user_email: String,
    user_name: String,
    user_role: String,
    feedback_rating: Option<i64>,
    feedback_comment: Option<String>,
    feedback_at: Option<DateTime<Utc>>,
    device_type: String,
    browser: String,
    ip_address: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: String,
    role: String,
    content: String,
    intent: Option<String>,
    content_length: i64,
    response_time_ms: Option<i64>,
    quick_replies: String,
    knowledge_sources: String,
    created_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self, messages: Vec<ChatMessage>) -> ConversationSession {
        ConversationSession {
            id: self.id,
            session_id: self.session_id,
            user_id: self.user_id,
            user_email: self.user_email,
            user_name: self.user_name,
            user_role: Role::parse(&self.user_role).unwrap_or(Role::Employee),
            feedback_rating: self.feedback_rating,
            feedback_comment: self.feedback_comment,
            feedback_at: self.feedback_at,
            device: DeviceMetadata {
                device_type: self.device_type,
                browser: self.browser,
                ip_address: self.ip_address,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
            messages,
        }
    }
}

impl MessageRow {
    fn into_message(self) -> ChatMessage {
        ChatMessage {
            id: self.id,
            role: MessageRole::parse(&self.role).unwrap_or(MessageRole::System),
            content: self.content,
            timestamp: self.created_at,
            quick_replies: serde_json::from_str(&self.quick_replies).unwrap_or_default(),
            intent: self.intent,
            content_length: self.content_length,
            response_time_ms: self.response_time_ms,
            knowledge_sources: serde_json::from_str(&self.knowledge_sources).unwrap_or_default(),
        }
    }
}

impl ConversationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a session owned by `user` with a fresh opaque token.
    pub async fn create_session(
        &self,
        user: &AuthUser,
        device: DeviceMetadata,
    ) -> Result<ConversationSession, sqlx::Error> {
        let session = ConversationSession::new(user, device);
        sqlx::query(query::INSERT_SESSION)
            .bind(&session.id)
            .bind(&session.session_id)
            .bind(&session.user_id)
            .bind(&session.user_email)
            .bind(&session.user_name)
            .bind(session.user_role.as_str())
            .bind(&session.device.device_type)
            .bind(&session.device.browser)
            .bind(&session.device.ip_address)
            .bind(session.created_at)
            .bind(session.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(session)
    }

    /// Find a session by token, scoped to its owner. Messages are loaded
    /// in seq order.
    pub async fn find_session(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> Result<Option<ConversationSession>, sqlx::Error> {
        let row: Option<SessionRow> = sqlx::query_as(query::FIND_SESSION)
            .bind(session_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else { return Ok(None) };
        let messages = self.load_messages(&row.session_id).await?;
        Ok(Some(row.into_session(messages)))
    }

    /// Find by conversation id (the stable id feedback references).
    pub async fn find_by_conversation_id(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<Option<ConversationSession>, sqlx::Error> {
        let row: Option<SessionRow> = sqlx::query_as(query::FIND_BY_CONVERSATION_ID)
            .bind(conversation_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else { return Ok(None) };
        let messages = self.load_messages(&row.session_id).await?;
        Ok(Some(row.into_session(messages)))
    }

    async fn load_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>, sqlx::Error> {
        let rows: Vec<MessageRow> = sqlx::query_as(query::LOAD_MESSAGES)
            .bind(session_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(MessageRow::into_message).collect())
    }

    /// Append one turn (user message then bot message) atomically and bump
    /// the session's updated stamp. The message log is append-only; rows
    /// are never rewritten.
    pub async fn append_turn(
        &self,
        session_id: &str,
        user_message: &ChatMessage,
        bot_message: &ChatMessage,
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let next_seq: i64 = sqlx::query_scalar(query::NEXT_SEQ)
            .bind(session_id)
            .fetch_one(&mut *tx)
            .await?;

        for (offset, message) in [user_message, bot_message].into_iter().enumerate() {
            sqlx::query(query::INSERT_MESSAGE)
                .bind(&message.id)
                .bind(session_id)
                .bind(next_seq + offset as i64)
                .bind(message.role.as_str())
                .bind(&message.content)
                .bind(&message.intent)
                .bind(message.content_length)
                .bind(message.response_time_ms)
                .bind(serde_json::to_string(&message.quick_replies).unwrap_or_else(|_| "[]".into()))
                .bind(
                    serde_json::to_string(&message.knowledge_sources)
                        .unwrap_or_else(|_| "[]".into()),
                )
                .bind(message.timestamp)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(query::TOUCH_SESSION)
            .bind(Utc::now())
            .bind(session_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await
    }

    /// Session listing for a user, most recently updated first.
    pub async fn find_by_user(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<SessionSummary>, sqlx::Error> {
        let rows = sqlx::query(query::LIST_FOR_USER)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| SessionSummary {
                session_id: row.get("session_id"),
                message_count: row.get("message_count"),
                last_message: row.get("last_message"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
                user_role: Role::parse(&row.get::<String, _>("user_role"))
                    .unwrap_or(Role::Employee),
            })
            .collect())
    }

    /// Stamp feedback onto the session row (denormalized for listing).
    pub async fn stamp_feedback(
        &self,
        conversation_id: &str,
        rating: i64,
        comment: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        let now = Utc::now();
        sqlx::query(query::STAMP_FEEDBACK)
            .bind(rating)
            .bind(comment)
            .bind(now)
            .bind(now)
            .bind(conversation_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete one owned session, cascading to its messages and feedback.
    /// Returns false when the token does not exist or is not owned.
    pub async fn delete_session(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let Some(session) = self.find_session_row(session_id, user_id).await? else {
            return Ok(false);
        };

        let mut tx = self.pool.begin().await?;
        sqlx::query(query::DELETE_FEEDBACK_FOR_SESSION)
            .bind(&session.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(query::DELETE_MESSAGES_FOR_SESSION)
            .bind(session_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(query::DELETE_SESSION)
            .bind(session_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(true)
    }

    /// Delete every session owned by the user. Returns how many existed.
    pub async fn delete_all_for_user(&self, user_id: &str) -> Result<u64, sqlx::Error> {
        let rows = sqlx::query(query::LIST_SESSION_IDS_FOR_USER)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        let mut tx = self.pool.begin().await?;
        let mut deleted = 0u64;
        for row in rows {
            let session_id: String = row.get("session_id");
            let conversation_id: String = row.get("id");
            sqlx::query(query::DELETE_FEEDBACK_FOR_SESSION)
                .bind(&conversation_id)
                .execute(&mut *tx)
                .await?;
            sqlx::query(query::DELETE_MESSAGES_FOR_SESSION)
                .bind(&session_id)
                .execute(&mut *tx)
                .await?;
            sqlx::query(query::DELETE_SESSION)
                .bind(&session_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
            deleted += 1;
        }
        tx.commit().await?;
        Ok(deleted)
    }

    async fn find_session_row(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> Result<Option<SessionRow>, sqlx::Error> {
        sqlx::query_as(query::FIND_SESSION)
            .bind(session_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }
}
