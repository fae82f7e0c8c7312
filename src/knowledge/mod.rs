// src/knowledge/mod.rs
// Role-gated knowledge entries backing retrieval-augmented replies.

mod query;
mod store;

pub use store::{KnowledgeStore, KnowledgeUpdate};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::Role;

/// Knowledge category. Closed enum so the category→label mapping for quick
/// replies stays exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Policy,
    Benefits,
    It,
    Hr,
    General,
    AdminOnly,
    HrOnly,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Policy => "policy",
            Category::Benefits => "benefits",
            Category::It => "it",
            Category::Hr => "hr",
            Category::General => "general",
            Category::AdminOnly => "admin-only",
            Category::HrOnly => "hr-only",
        }
    }

    pub fn parse(s: &str) -> Option<Category> {
        match s {
            "policy" => Some(Category::Policy),
            "benefits" => Some(Category::Benefits),
            "it" => Some(Category::It),
            "hr" => Some(Category::Hr),
            "general" => Some(Category::General),
            "admin-only" => Some(Category::AdminOnly),
            "hr-only" => Some(Category::HrOnly),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeSource {
    Upload,
    Manual,
    System,
}

impl KnowledgeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            KnowledgeSource::Upload => "upload",
            KnowledgeSource::Manual => "manual",
            KnowledgeSource::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<KnowledgeSource> {
        match s {
            "upload" => Some(KnowledgeSource::Upload),
            "manual" => Some(KnowledgeSource::Manual),
            "system" => Some(KnowledgeSource::System),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeEntry {
    pub id: String,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub category: Category,
    pub source: KnowledgeSource,
    pub tags: Vec<String>,
    /// Empty means visible to every role.
    pub access_roles: Vec<Role>,
    pub is_active: bool,
    pub view_count: i64,
    pub last_accessed: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl KnowledgeEntry {
    /// Fresh entry with generated id and timestamps; used by the ingestion
    /// collaborator and by admin/manual creation.
    pub fn new(title: &str, content: &str, category: Category, source: KnowledgeSource) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            content: content.to_string(),
            summary: String::new(),
            category,
            source,
            tags: Vec::new(),
            access_roles: Vec::new(),
            is_active: true,
            view_count: 0,
            last_accessed: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn visible_to(&self, role: Role) -> bool {
        self.is_active && (self.access_roles.is_empty() || self.access_roles.contains(&role))
    }
}
