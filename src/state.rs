// src/state.rs

use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

use crate::chat::ChatOrchestrator;
use crate::config::OnboardConfig;
use crate::conversation::ConversationStore;
use crate::feedback::FeedbackStore;
use crate::identity::TokenVerifier;
use crate::knowledge::KnowledgeStore;
use crate::llm::{CompletionBackend, ReplyGateway};
use crate::rate_limit::FixedWindowLimiter;

/// Shared application state: the stores, the chat coordinator, and the
/// injected boundary components (token verifier, rate limiter).
pub struct AppState {
    pub db: SqlitePool,
    pub knowledge: KnowledgeStore,
    pub conversations: ConversationStore,
    pub feedback: FeedbackStore,
    pub orchestrator: ChatOrchestrator,
    pub verifier: Arc<dyn TokenVerifier>,
    pub chat_limiter: FixedWindowLimiter,
}

/// Wire up the state from a connected pool and the two injectable
/// boundaries. The completion backend is a trait object so tests can
/// script it.
pub fn build_app_state(
    pool: SqlitePool,
    backend: Arc<dyn CompletionBackend>,
    verifier: Arc<dyn TokenVerifier>,
    config: &OnboardConfig,
) -> AppState {
    let knowledge = KnowledgeStore::new(pool.clone());
    let conversations = ConversationStore::new(pool.clone());
    let feedback = FeedbackStore::new(pool.clone());
    let gateway = Arc::new(ReplyGateway::new(
        backend,
        Duration::from_secs(config.llm_timeout_secs),
    ));
    let orchestrator = ChatOrchestrator::new(
        conversations.clone(),
        knowledge.clone(),
        feedback.clone(),
        gateway,
    );

    AppState {
        db: pool,
        knowledge,
        conversations,
        feedback,
        orchestrator,
        verifier,
        chat_limiter: FixedWindowLimiter::new(
            config.rate_limit_chat,
            Duration::from_secs(config.rate_limit_window_secs),
        ),
    }
}
