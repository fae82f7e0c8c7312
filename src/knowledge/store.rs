// src/knowledge/store.rs

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::warn;

use super::query;
use super::{Category, KnowledgeEntry, KnowledgeSource};
use crate::identity::Role;

/// SQLite-backed knowledge store. Relevance ranking is delegated to the
/// FTS5 index; this layer only enforces role visibility and activity.
#[derive(Clone)]
pub struct KnowledgeStore {
    pool: SqlitePool,
}

/// Admin partial update; `None` fields are left untouched.
#[derive(Debug, Default, serde::Deserialize)]
pub struct KnowledgeUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub category: Option<Category>,
    pub tags: Option<Vec<String>>,
    pub access_roles: Option<Vec<Role>>,
}

#[derive(sqlx::FromRow)]
struct KnowledgeRow {
    id: String,
    title: String,
    content: String,
    summary: String,
    category: String,
    source: String,
    tags: String,
    access_roles: String,
    is_active: bool,
    view_count: i64,
    last_accessed: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl KnowledgeRow {
    fn into_entry(self) -> KnowledgeEntry {
        let tags: Vec<String> = serde_json::from_str(&self.tags).unwrap_or_default();
        let roles: Vec<String> = serde_json::from_str(&self.access_roles).unwrap_or_default();
        KnowledgeEntry {
            id: self.id,
            title: self.title,
            content: self.content,
            summary: self.summary,
            category: Category::parse(&self.category).unwrap_or(Category::General),
            source: KnowledgeSource::parse(&self.source).unwrap_or(KnowledgeSource::Manual),
            tags,
            access_roles: roles.iter().filter_map(|r| Role::parse(r)).collect(),
            is_active: self.is_active,
            view_count: self.view_count,
            last_accessed: self.last_accessed,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Turn free text into a safe FTS5 MATCH expression: bare alphanumeric
/// tokens, quoted, OR-joined. Returns None when nothing searchable remains
/// (punctuation-only input would otherwise be an FTS syntax error).
fn fts_match_expr(text: &str) -> Option<String> {
    let tokens: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 2)
        .take(12)
        .map(|t| format!("\"{}\"", t.to_lowercase()))
        .collect();
    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" OR "))
    }
}

impl KnowledgeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Relevance-ranked search visible to `role`. Never returns inactive
    /// entries or entries whose access list excludes the role.
    pub async fn search_by_role(
        &self,
        text: &str,
        role: Role,
        limit: u32,
    ) -> Result<Vec<KnowledgeEntry>, sqlx::Error> {
        let Some(expr) = fts_match_expr(text) else {
            return Ok(Vec::new());
        };

        let rows: Vec<KnowledgeRow> = sqlx::query_as(query::SEARCH_BY_ROLE)
            .bind(&expr)
            .bind(role.as_str())
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(KnowledgeRow::into_entry).collect())
    }

    /// Bump the view counter and last-accessed stamp. Failures are logged
    /// and swallowed; a counter miss must never fail a chat turn.
    pub async fn increment_view(&self, id: &str) {
        let result = sqlx::query(query::INCREMENT_VIEW)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await;
        if let Err(e) = result {
            warn!("Failed to bump view count for knowledge entry {}: {}", id, e);
        }
    }

    pub async fn insert(&self, entry: &KnowledgeEntry) -> Result<(), sqlx::Error> {
        let tags = serde_json::to_string(&entry.tags).unwrap_or_else(|_| "[]".into());
        let roles = serde_json::to_string(&entry.access_roles).unwrap_or_else(|_| "[]".into());
        sqlx::query(query::INSERT_ENTRY)
            .bind(&entry.id)
            .bind(&entry.title)
            .bind(&entry.content)
            .bind(&entry.summary)
            .bind(entry.category.as_str())
            .bind(entry.source.as_str())
            .bind(tags)
            .bind(roles)
            .bind(entry.is_active)
            .bind(entry.view_count)
            .bind(entry.last_accessed)
            .bind(entry.created_at)
            .bind(entry.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn list(&self, limit: u32) -> Result<Vec<KnowledgeEntry>, sqlx::Error> {
        let rows: Vec<KnowledgeRow> = sqlx::query_as(query::LIST_ENTRIES)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(KnowledgeRow::into_entry).collect())
    }

    pub async fn get(&self, id: &str) -> Result<Option<KnowledgeEntry>, sqlx::Error> {
        let row: Option<KnowledgeRow> = sqlx::query_as(query::GET_ENTRY)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(KnowledgeRow::into_entry))
    }

    /// Apply a partial admin update. Returns false when the id is unknown.
    pub async fn update(&self, id: &str, patch: &KnowledgeUpdate) -> Result<bool, sqlx::Error> {
        let tags = patch
            .tags
            .as_ref()
            .map(|t| serde_json::to_string(t).unwrap_or_else(|_| "[]".into()));
        let roles = patch
            .access_roles
            .as_ref()
            .map(|r| serde_json::to_string(r).unwrap_or_else(|_| "[]".into()));
        let result = sqlx::query(query::UPDATE_ENTRY)
            .bind(&patch.title)
            .bind(&patch.content)
            .bind(&patch.summary)
            .bind(patch.category.map(|c| c.as_str()))
            .bind(tags)
            .bind(roles)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_active(&self, id: &str, active: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(query::SET_ACTIVE)
            .bind(active)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_expr_quotes_and_joins_tokens() {
        let expr = fts_match_expr("What are the working hours?").unwrap();
        assert!(expr.contains("\"working\""));
        assert!(expr.contains("\"hours\""));
        assert!(expr.contains(" OR "));
    }

    #[test]
    fn match_expr_rejects_punctuation_only_input() {
        assert!(fts_match_expr("?!... - ,").is_none());
        assert!(fts_match_expr("").is_none());
    }

    #[test]
    fn match_expr_drops_fts_operators() {
        // Quotes in user text must not escape into FTS syntax.
        let expr = fts_match_expr("\"NEAR(a b)\" AND vacation").unwrap();
        assert!(!expr.contains("NEAR("));
        assert!(expr.contains("\"vacation\""));
    }
}
