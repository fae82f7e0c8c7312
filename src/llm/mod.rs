// src/llm/mod.rs

pub mod client;
pub mod gateway;
pub mod prompt;

pub use client::{CompletionBackend, OpenAiBackend, UpstreamError};
pub use gateway::ReplyGateway;
