// tests/common/mod.rs
// Shared harness: in-memory database, scripted completion backend, signed
// test tokens.
#![allow(dead_code)]

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;

use onboard::config::OnboardConfig;
use onboard::identity::{AuthUser, HmacTokenVerifier, Role};
use onboard::knowledge::{Category, KnowledgeEntry, KnowledgeSource};
use onboard::llm::{CompletionBackend, UpstreamError};
use onboard::state::{build_app_state, AppState};

pub const TEST_SECRET: &str = "test-secret";

/// Completion double: either a canned reply or a scripted failure.
pub struct ScriptedBackend {
    pub reply: Option<String>,
}

impl ScriptedBackend {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(text.to_string()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self { reply: None })
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, UpstreamError> {
        match &self.reply {
            Some(text) => Ok(text.clone()),
            None => Err(UpstreamError::InvalidCredentials),
        }
    }
}

pub fn test_config() -> OnboardConfig {
    OnboardConfig {
        host: "127.0.0.1".into(),
        port: 0,
        cors_origin: "*".into(),
        database_url: "sqlite::memory:".into(),
        sqlite_max_connections: 1,
        llm_base_url: "http://localhost:0".into(),
        llm_api_key: String::new(),
        llm_model: "test".into(),
        llm_timeout_secs: 5,
        llm_max_tokens: 256,
        token_secret: TEST_SECRET.into(),
        rate_limit_chat: 1000,
        rate_limit_window_secs: 60,
        history_default_limit: 20,
        history_max_limit: 100,
        log_level: "warn".into(),
    }
}

pub async fn test_pool() -> SqlitePool {
    let pool = onboard::db::create_pool("sqlite::memory:", 1)
        .await
        .expect("in-memory pool");
    onboard::db::init_schema(&pool).await.expect("schema");
    pool
}

pub async fn test_state(backend: Arc<dyn CompletionBackend>) -> Arc<AppState> {
    test_state_with_config(backend, &test_config()).await
}

pub async fn test_state_with_config(
    backend: Arc<dyn CompletionBackend>,
    config: &OnboardConfig,
) -> Arc<AppState> {
    let pool = test_pool().await;
    let verifier = Arc::new(HmacTokenVerifier::new(TEST_SECRET));
    Arc::new(build_app_state(pool, backend, verifier, config))
}

pub fn employee(id: &str) -> AuthUser {
    AuthUser {
        id: id.to_string(),
        email: format!("{}@example.com", id),
        name: "Dana".into(),
        role: Role::Employee,
    }
}

pub fn admin(id: &str) -> AuthUser {
    AuthUser {
        id: id.to_string(),
        email: format!("{}@example.com", id),
        name: "Alex".into(),
        role: Role::Admin,
    }
}

pub fn bearer_token(user: &AuthUser) -> String {
    HmacTokenVerifier::new(TEST_SECRET).issue(user)
}

/// Seed a knowledge entry visible to everyone.
pub async fn seed_entry(state: &AppState, title: &str, content: &str, category: Category) -> String {
    let mut entry = KnowledgeEntry::new(title, content, category, KnowledgeSource::Manual);
    entry.summary = title.to_string();
    state.knowledge.insert(&entry).await.expect("seed entry");
    entry.id
}

/// Seed an entry restricted to the given roles.
pub async fn seed_restricted_entry(
    state: &AppState,
    title: &str,
    content: &str,
    category: Category,
    roles: Vec<Role>,
) -> String {
    let mut entry = KnowledgeEntry::new(title, content, category, KnowledgeSource::Manual);
    entry.access_roles = roles;
    state.knowledge.insert(&entry).await.expect("seed entry");
    entry.id
}
