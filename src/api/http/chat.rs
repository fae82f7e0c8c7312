// src/api/http/chat.rs

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::chat::orchestrator::POPULAR_QUESTIONS;
use crate::chat::{ChatTurnResult, FeedbackRequest};
use crate::config::CONFIG;
use crate::conversation::{ChatMessage, DeviceMetadata, SessionSummary};
use crate::identity::{AuthUser, ClientIp, Role};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub reply: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(rename = "conversationId")]
    pub conversation_id: String,
    #[serde(rename = "quickReplies")]
    pub quick_replies: Vec<String>,
    pub metadata: ChatResponseMetadata,
}

#[derive(Serialize)]
pub struct ChatResponseMetadata {
    #[serde(rename = "sourcesCount")]
    pub sources_count: usize,
    #[serde(rename = "userRole")]
    pub user_role: Role,
    #[serde(rename = "responseTime")]
    pub response_time_ms: i64,
}

impl ChatResponse {
    fn from_turn(turn: ChatTurnResult, role: Role) -> Self {
        Self {
            reply: turn.reply,
            session_id: turn.session_id,
            conversation_id: turn.conversation_id,
            quick_replies: turn.quick_replies,
            metadata: ChatResponseMetadata {
                sources_count: turn.sources_count,
                user_role: role,
                response_time_ms: turn.response_time_ms,
            },
        }
    }
}

/// Coarse device metadata from the user agent; enough for session context,
/// not a fingerprint.
fn device_metadata(headers: &HeaderMap, ip: &str) -> DeviceMetadata {
    let ua = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let device_type = if ua.contains("Mobile") { "mobile" } else { "desktop" };
    let browser = if ua.contains("Firefox") {
        "firefox"
    } else if ua.contains("Edg") {
        "edge"
    } else if ua.contains("Chrome") {
        "chrome"
    } else if ua.contains("Safari") {
        "safari"
    } else {
        "unknown"
    };
    DeviceMetadata {
        device_type: device_type.to_string(),
        browser: browser.to_string(),
        ip_address: ip.to_string(),
    }
}

pub async fn post_chat(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ClientIp(ip): ClientIp,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    if !state.chat_limiter.check(&ip) {
        return Err(ApiError::too_many_requests(
            "You're sending messages too quickly. Give it a moment and try again.",
        ));
    }

    let device = device_metadata(&headers, &ip);
    let turn = state
        .orchestrator
        .handle_turn(&user, &request.message, request.session_id.as_deref(), device)
        .await?;

    Ok(Json(ChatResponse::from_turn(turn, user.role)))
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

pub async fn get_history(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(params): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<SessionSummary>>> {
    let limit = params
        .limit
        .unwrap_or(CONFIG.history_default_limit as u32)
        .min(CONFIG.history_max_limit as u32);
    let sessions = state.orchestrator.get_history(&user, limit).await?;
    Ok(Json(sessions))
}

#[derive(Serialize)]
pub struct TranscriptResponse {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub messages: Vec<ChatMessage>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "userRole")]
    pub user_role: Role,
}

pub async fn get_transcript(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(session_id): Path<String>,
) -> ApiResult<Json<TranscriptResponse>> {
    let session = state.orchestrator.get_transcript(&user, &session_id).await?;
    Ok(Json(TranscriptResponse {
        session_id: session.session_id,
        messages: session.messages,
        created_at: session.created_at,
        updated_at: session.updated_at,
        user_role: session.user_role,
    }))
}

pub async fn post_feedback(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(request): Json<FeedbackRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let record = state.orchestrator.submit_feedback(&user, &request).await?;
    info!(
        "Feedback recorded: conversation={} rating={}",
        record.conversation_id, record.rating
    );
    Ok(Json(json!({ "feedbackId": record.id })))
}

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<crate::chat::orchestrator::CallerStats>> {
    let stats = state.orchestrator.caller_stats(&user).await?;
    Ok(Json(stats))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(session_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    state.orchestrator.delete_session(&user, &session_id).await?;
    Ok(Json(json!({ "deletedCount": 1 })))
}

pub async fn delete_all_sessions(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<serde_json::Value>> {
    let deleted = state.orchestrator.delete_all(&user).await?;
    Ok(Json(json!({ "deletedCount": deleted })))
}

pub async fn export_transcript(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(session_id): Path<String>,
) -> ApiResult<Response> {
    let transcript = state
        .orchestrator
        .export_transcript(&user, &session_id)
        .await?;
    let filename = format!("conversation-{}.txt", session_id);
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        transcript,
    )
        .into_response())
}

pub async fn popular_questions(_user: AuthUser) -> Json<Vec<&'static str>> {
    Json(POPULAR_QUESTIONS.to_vec())
}
