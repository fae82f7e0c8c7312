// src/feedback/mod.rs
// Per-response quality ratings linked to conversations.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::identity::{AuthUser, Role};

#[derive(Debug, Clone, Serialize)]
pub struct FeedbackRecord {
    pub id: String,
    pub conversation_id: String,
    pub user_id: String,
    pub user_email: String,
    pub user_role: Role,
    pub question: String,
    pub bot_response: String,
    /// Whole number in 1..=5, validated before construction.
    pub rating: i64,
    pub comment: Option<String>,
    pub is_helpful: bool,
    pub category: String,
    pub response_time_ms: Option<i64>,
    pub source_count: i64,
    pub created_at: DateTime<Utc>,
}

impl FeedbackRecord {
    pub fn new(user: &AuthUser, conversation_id: &str, rating: i64, is_helpful: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            conversation_id: conversation_id.to_string(),
            user_id: user.id.clone(),
            user_email: user.email.clone(),
            user_role: user.role,
            question: String::new(),
            bot_response: String::new(),
            rating,
            comment: None,
            is_helpful,
            category: "general".to_string(),
            response_time_ms: None,
            source_count: 0,
            created_at: Utc::now(),
        }
    }
}

/// Caller-scoped aggregates for GET /chat/stats.
#[derive(Debug, Clone, Serialize)]
pub struct UserFeedbackStats {
    #[serde(rename = "feedbackCount")]
    pub feedback_count: i64,
    #[serde(rename = "averageRating")]
    pub average_rating: Option<f64>,
    #[serde(rename = "helpfulCount")]
    pub helpful_count: i64,
}

const INSERT_FEEDBACK: &str = r#"
    INSERT INTO feedback (
        id, conversation_id, user_id, user_email, user_role, question,
        bot_response, rating, comment, is_helpful, category,
        response_time_ms, source_count, created_at
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const USER_STATS: &str = r#"
    SELECT
        COUNT(*) AS feedback_count,
        AVG(rating) AS average_rating,
        COALESCE(SUM(is_helpful), 0) AS helpful_count
    FROM feedback
    WHERE user_id = ?
"#;

const COUNT_FOR_CONVERSATION: &str = r#"
    SELECT COUNT(*) FROM feedback WHERE conversation_id = ?
"#;

#[derive(Clone)]
pub struct FeedbackStore {
    pool: SqlitePool,
}

impl FeedbackStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, record: &FeedbackRecord) -> Result<(), sqlx::Error> {
        sqlx::query(INSERT_FEEDBACK)
            .bind(&record.id)
            .bind(&record.conversation_id)
            .bind(&record.user_id)
            .bind(&record.user_email)
            .bind(record.user_role.as_str())
            .bind(&record.question)
            .bind(&record.bot_response)
            .bind(record.rating)
            .bind(&record.comment)
            .bind(record.is_helpful)
            .bind(&record.category)
            .bind(record.response_time_ms)
            .bind(record.source_count)
            .bind(record.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn user_stats(&self, user_id: &str) -> Result<UserFeedbackStats, sqlx::Error> {
        let row: (i64, Option<f64>, i64) = sqlx::query_as(USER_STATS)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(UserFeedbackStats {
            feedback_count: row.0,
            average_rating: row.1,
            helpful_count: row.2,
        })
    }

    pub async fn count_for_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(COUNT_FOR_CONVERSATION)
            .bind(conversation_id)
            .fetch_one(&self.pool)
            .await
    }
}
