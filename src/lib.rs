// src/lib.rs

pub mod api;
pub mod chat;
pub mod config;
pub mod conversation;
pub mod db;
pub mod feedback;
pub mod identity;
pub mod knowledge;
pub mod llm;
pub mod rate_limit;
pub mod state;
