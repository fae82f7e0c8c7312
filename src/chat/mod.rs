// src/chat/mod.rs

pub mod intent;
pub mod orchestrator;

pub use intent::{classify_intent, derive_quick_replies, Intent};
pub use orchestrator::{ChatError, ChatOrchestrator, ChatTurnResult, FeedbackRequest};
