// src/knowledge/query.rs

//! SQL query strings for the knowledge store.

/// Weighted full-text search, filtered to active rows the role may see.
/// bm25() returns lower-is-better; column weights rank title above tags
/// above summary above body.
pub const SEARCH_BY_ROLE: &str = r#"
    SELECT
        k.id, k.title, k.content, k.summary, k.category, k.source,
        k.tags, k.access_roles, k.is_active, k.view_count,
        k.last_accessed, k.created_at, k.updated_at
    FROM knowledge_fts
    JOIN knowledge_entries k ON k.rowid = knowledge_fts.rowid
    WHERE knowledge_fts MATCH ?
      AND k.is_active = 1
      AND (
          k.access_roles = '[]'
          OR EXISTS (
              SELECT 1 FROM json_each(k.access_roles) WHERE json_each.value = ?
          )
      )
    ORDER BY bm25(knowledge_fts, 10.0, 6.0, 3.0, 1.0)
    LIMIT ?
"#;

/// View-count bump on retrieval use. Side effect only.
pub const INCREMENT_VIEW: &str = r#"
    UPDATE knowledge_entries
    SET view_count = view_count + 1,
        last_accessed = ?
    WHERE id = ?
"#;

pub const INSERT_ENTRY: &str = r#"
    INSERT INTO knowledge_entries (
        id, title, content, summary, category, source, tags, access_roles,
        is_active, view_count, last_accessed, created_at, updated_at
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

pub const LIST_ENTRIES: &str = r#"
    SELECT
        id, title, content, summary, category, source,
        tags, access_roles, is_active, view_count,
        last_accessed, created_at, updated_at
    FROM knowledge_entries
    ORDER BY updated_at DESC
    LIMIT ?
"#;

pub const GET_ENTRY: &str = r#"
    SELECT
        id, title, content, summary, category, source,
        tags, access_roles, is_active, view_count,
        last_accessed, created_at, updated_at
    FROM knowledge_entries
    WHERE id = ?
"#;

/// Partial update; NULL binds leave the existing value in place.
pub const UPDATE_ENTRY: &str = r#"
    UPDATE knowledge_entries
    SET title        = COALESCE(?, title),
        content      = COALESCE(?, content),
        summary      = COALESCE(?, summary),
        category     = COALESCE(?, category),
        tags         = COALESCE(?, tags),
        access_roles = COALESCE(?, access_roles),
        updated_at   = ?
    WHERE id = ?
"#;

pub const SET_ACTIVE: &str = r#"
    UPDATE knowledge_entries
    SET is_active = ?, updated_at = ?
    WHERE id = ?
"#;
