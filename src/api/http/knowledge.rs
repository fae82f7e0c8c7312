// src/api/http/knowledge.rs
// Admin surface over the knowledge base. Entry creation/ingestion lives in
// the document pipeline; this covers curation of what already exists.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::identity::{AuthUser, Role};
use crate::knowledge::{KnowledgeEntry, KnowledgeUpdate};
use crate::state::AppState;

fn require_admin(user: &AuthUser) -> Result<(), ApiError> {
    if user.role == Role::Admin {
        Ok(())
    } else {
        Err(ApiError::forbidden("Administrator access required"))
    }
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
}

pub async fn list_entries(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(params): Query<ListQuery>,
) -> ApiResult<Json<Vec<KnowledgeEntry>>> {
    require_admin(&user)?;
    let entries = state
        .knowledge
        .list(params.limit.unwrap_or(100).min(500))
        .await?;
    Ok(Json(entries))
}

pub async fn update_entry(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(patch): Json<KnowledgeUpdate>,
) -> ApiResult<Json<KnowledgeEntry>> {
    require_admin(&user)?;
    if !state.knowledge.update(&id, &patch).await? {
        return Err(ApiError::not_found("Knowledge entry not found"));
    }
    let entry = state
        .knowledge
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Knowledge entry not found"))?;
    Ok(Json(entry))
}

pub async fn activate_entry(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&user)?;
    set_active(&state, &id, true).await
}

pub async fn deactivate_entry(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&user)?;
    set_active(&state, &id, false).await
}

async fn set_active(
    state: &AppState,
    id: &str,
    active: bool,
) -> ApiResult<Json<serde_json::Value>> {
    if !state.knowledge.set_active(id, active).await? {
        return Err(ApiError::not_found("Knowledge entry not found"));
    }
    Ok(Json(json!({ "id": id, "isActive": active })))
}
