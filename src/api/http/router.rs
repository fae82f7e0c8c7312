// src/api/http/router.rs
// Route composition. Everything under /api runs behind bearer auth.

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::chat::{
    delete_all_sessions, delete_session, export_transcript, get_history, get_stats,
    get_transcript, popular_questions, post_chat, post_feedback,
};
use super::handlers::health_handler;
use super::knowledge::{activate_entry, deactivate_entry, list_entries, update_entry};
use crate::config::CONFIG;
use crate::identity::require_auth;
use crate::state::AppState;

fn cors_layer() -> CorsLayer {
    match CONFIG.cors_origin.parse::<axum::http::HeaderValue>() {
        Ok(origin) if CONFIG.cors_origin != "*" => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        _ => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    }
}

pub fn api_router(state: Arc<AppState>) -> Router {
    let authed = Router::new()
        // Chat
        .route("/chat", post(post_chat))
        .route("/chat", delete(delete_all_sessions))
        .route("/chat/history", get(get_history))
        .route("/chat/history/{session_id}", get(get_transcript))
        .route("/chat/feedback", post(post_feedback))
        .route("/chat/stats", get(get_stats))
        .route("/chat/export/{session_id}", get(export_transcript))
        .route("/chat/popular-questions", get(popular_questions))
        .route("/chat/{session_id}", delete(delete_session))
        // Knowledge admin
        .route("/knowledge", get(list_entries))
        .route("/knowledge/{id}", put(update_entry))
        .route("/knowledge/{id}/activate", post(activate_entry))
        .route("/knowledge/{id}/deactivate", post(deactivate_entry))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", authed)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}
