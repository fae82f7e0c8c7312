// src/llm/gateway.rs
// Boundary around the hosted completion service. Internally every call is
// a Result so failures stay visible in logs; externally generate_reply
// always produces user-presentable text.

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::client::{CompletionBackend, UpstreamError};
use super::prompt;
use crate::identity::Role;

/// Degraded-service text shown when the model is unreachable.
pub const FALLBACK_REPLY: &str =
    "Sorry, I'm having trouble reaching our knowledge service right now. \
     Please try again in a moment, or contact your onboarding buddy if it's urgent.";

static MD_EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\*\*|__|\*|_)").unwrap());
static MD_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}\s*").unwrap());
static MD_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```[a-zA-Z]*\n?").unwrap());

/// Strip markdown the model emits despite instructions: emphasis markers,
/// header prefixes, code fences. Keeps the fenced content itself.
pub fn sanitize_reply(raw: &str) -> String {
    let text = MD_FENCE.replace_all(raw, "");
    let text = MD_HEADER.replace_all(&text, "");
    let text = MD_EMPHASIS.replace_all(&text, "");
    text.trim().to_string()
}

pub struct ReplyGateway {
    backend: Arc<dyn CompletionBackend>,
    timeout: Duration,
}

impl ReplyGateway {
    pub fn new(backend: Arc<dyn CompletionBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    async fn call(&self, system: &str, user: &str) -> Result<String, UpstreamError> {
        match tokio::time::timeout(self.timeout, self.backend.complete(system, user)).await {
            Ok(result) => result,
            Err(_) => Err(UpstreamError::Timeout),
        }
    }

    /// Generate a reply for a chat turn. Never fails: any upstream error is
    /// logged and absorbed into [`FALLBACK_REPLY`] so the turn completes.
    pub async fn generate_reply(
        &self,
        question: &str,
        knowledge_context: &str,
        role: Role,
        name: &str,
    ) -> String {
        let system = prompt::system_prompt(role, name, knowledge_context);
        match self.call(&system, question).await {
            Ok(raw) => {
                let reply = sanitize_reply(&raw);
                if reply.is_empty() {
                    warn!("Completion service returned empty text; using fallback");
                    FALLBACK_REPLY.to_string()
                } else {
                    reply
                }
            }
            Err(e) => {
                warn!("Completion service unavailable, serving fallback: {}", e);
                FALLBACK_REPLY.to_string()
            }
        }
    }

    /// Summarize text for ingestion. Falls back to plain truncation.
    pub async fn summarize(&self, text: &str, max_chars: usize) -> String {
        let system = prompt::summarize_prompt(max_chars);
        match self.call(&system, text).await {
            Ok(raw) => {
                let summary = sanitize_reply(&raw);
                summary.chars().take(max_chars).collect()
            }
            Err(e) => {
                debug!("Summarization unavailable, truncating instead: {}", e);
                let mut truncated: String = text.chars().take(max_chars).collect();
                truncated = truncated.trim_end().to_string();
                truncated
            }
        }
    }

    /// Extract keywords for ingestion. Falls back to an empty list.
    pub async fn extract_keywords(&self, text: &str) -> Vec<String> {
        match self.call(prompt::KEYWORDS_PROMPT, text).await {
            Ok(raw) => sanitize_reply(&raw)
                .split(',')
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .take(10)
                .collect(),
            Err(e) => {
                debug!("Keyword extraction unavailable: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Scripted(Result<&'static str, UpstreamError>);

    #[async_trait]
    impl CompletionBackend for Scripted {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String, UpstreamError> {
            match &self.0 {
                Ok(s) => Ok(s.to_string()),
                Err(UpstreamError::InvalidCredentials) => Err(UpstreamError::InvalidCredentials),
                Err(_) => Err(UpstreamError::Http("scripted".into())),
            }
        }
    }

    fn gateway(result: Result<&'static str, UpstreamError>) -> ReplyGateway {
        ReplyGateway::new(Arc::new(Scripted(result)), Duration::from_secs(5))
    }

    #[test]
    fn sanitize_strips_markdown() {
        let raw = "## Welcome!\n**Hours** are *9 to 5*.\n```\ncode here\n```\n";
        let clean = sanitize_reply(raw);
        assert_eq!(clean, "Welcome!\nHours are 9 to 5.\ncode here");
    }

    #[test]
    fn sanitize_trims_whitespace() {
        assert_eq!(sanitize_reply("  hello  \n"), "hello");
    }

    #[tokio::test]
    async fn reply_passes_through_on_success() {
        let reply = gateway(Ok("Welcome aboard, Dana!"))
            .generate_reply("hi", "ctx", Role::Employee, "Dana")
            .await;
        assert_eq!(reply, "Welcome aboard, Dana!");
    }

    #[tokio::test]
    async fn reply_falls_back_on_credential_failure() {
        let reply = gateway(Err(UpstreamError::InvalidCredentials))
            .generate_reply("hi", "ctx", Role::Employee, "Dana")
            .await;
        assert_eq!(reply, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn summarize_falls_back_to_truncation() {
        let summary = gateway(Err(UpstreamError::Http("down".into())))
            .summarize(&"word ".repeat(100), 20)
            .await;
        assert!(summary.chars().count() <= 20);
        assert!(summary.starts_with("word"));
    }

    #[tokio::test]
    async fn keywords_fall_back_to_empty() {
        let keywords = gateway(Err(UpstreamError::Http("down".into())))
            .extract_keywords("anything")
            .await;
        assert!(keywords.is_empty());
    }

    #[tokio::test]
    async fn keywords_parse_comma_separated_output() {
        let keywords = gateway(Ok("Vacation, Payroll , benefits"))
            .extract_keywords("doc")
            .await;
        assert_eq!(keywords, vec!["vacation", "payroll", "benefits"]);
    }
}
