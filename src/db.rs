// src/db.rs
// Connection pool configuration and startup schema.

use anyhow::Result;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::time::Duration;
use tracing::info;

/// Create an optimized SQLite connection pool
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    SqlitePoolOptions::new()
        // SQLite is single-writer, but can have multiple readers
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .max_lifetime(Duration::from_secs(1800))
        .idle_timeout(Duration::from_secs(600))
        .connect(database_url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))
}

/// Create all tables, the FTS5 knowledge index, and its sync triggers.
/// Statements are idempotent; safe to run on every startup.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    for stmt in SCHEMA {
        sqlx::query(stmt).execute(pool).await?;
    }
    info!("Database schema ready");
    Ok(())
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS knowledge_entries (
        id            TEXT PRIMARY KEY,
        title         TEXT NOT NULL,
        content       TEXT NOT NULL,
        summary       TEXT NOT NULL DEFAULT '',
        category      TEXT NOT NULL,
        source        TEXT NOT NULL DEFAULT 'manual',
        tags          TEXT NOT NULL DEFAULT '[]',
        access_roles  TEXT NOT NULL DEFAULT '[]',
        is_active     INTEGER NOT NULL DEFAULT 1,
        view_count    INTEGER NOT NULL DEFAULT 0,
        last_accessed TEXT,
        created_at    TEXT NOT NULL,
        updated_at    TEXT NOT NULL
    )
    "#,
    // Weighted full-text index over the knowledge base. External-content
    // table kept in sync by the triggers below; ranking uses bm25() with
    // per-column weights at query time.
    r#"
    CREATE VIRTUAL TABLE IF NOT EXISTS knowledge_fts USING fts5(
        title, tags, summary, content,
        content='knowledge_entries',
        content_rowid='rowid'
    )
    "#,
    r#"
    CREATE TRIGGER IF NOT EXISTS knowledge_fts_insert
    AFTER INSERT ON knowledge_entries BEGIN
        INSERT INTO knowledge_fts(rowid, title, tags, summary, content)
        VALUES (new.rowid, new.title, new.tags, new.summary, new.content);
    END
    "#,
    r#"
    CREATE TRIGGER IF NOT EXISTS knowledge_fts_delete
    AFTER DELETE ON knowledge_entries BEGIN
        INSERT INTO knowledge_fts(knowledge_fts, rowid, title, tags, summary, content)
        VALUES ('delete', old.rowid, old.title, old.tags, old.summary, old.content);
    END
    "#,
    r#"
    CREATE TRIGGER IF NOT EXISTS knowledge_fts_update
    AFTER UPDATE ON knowledge_entries BEGIN
        INSERT INTO knowledge_fts(knowledge_fts, rowid, title, tags, summary, content)
        VALUES ('delete', old.rowid, old.title, old.tags, old.summary, old.content);
        INSERT INTO knowledge_fts(rowid, title, tags, summary, content)
        VALUES (new.rowid, new.title, new.tags, new.summary, new.content);
    END
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        id            TEXT PRIMARY KEY,
        session_id    TEXT NOT NULL UNIQUE,
        user_id       TEXT NOT NULL,
        user_email    TEXT NOT NULL,
        user_name     TEXT NOT NULL,
        user_role     TEXT NOT NULL,
        feedback_rating    INTEGER,
        feedback_comment   TEXT,
        feedback_at        TEXT,
        device_type   TEXT NOT NULL DEFAULT 'unknown',
        browser       TEXT NOT NULL DEFAULT 'unknown',
        ip_address    TEXT NOT NULL DEFAULT 'unknown',
        created_at    TEXT NOT NULL,
        updated_at    TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id, updated_at)",
    // Append-only message log, one row per message, ordered by seq.
    r#"
    CREATE TABLE IF NOT EXISTS messages (
        id                TEXT PRIMARY KEY,
        session_id        TEXT NOT NULL REFERENCES sessions(session_id),
        seq               INTEGER NOT NULL,
        role              TEXT NOT NULL,
        content           TEXT NOT NULL,
        intent            TEXT,
        content_length    INTEGER NOT NULL DEFAULT 0,
        response_time_ms  INTEGER,
        quick_replies     TEXT NOT NULL DEFAULT '[]',
        knowledge_sources TEXT NOT NULL DEFAULT '[]',
        created_at        TEXT NOT NULL,
        UNIQUE(session_id, seq)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_id, seq)",
    r#"
    CREATE TABLE IF NOT EXISTS feedback (
        id               TEXT PRIMARY KEY,
        conversation_id  TEXT NOT NULL REFERENCES sessions(id),
        user_id          TEXT NOT NULL,
        user_email       TEXT NOT NULL,
        user_role        TEXT NOT NULL,
        question         TEXT NOT NULL DEFAULT '',
        bot_response     TEXT NOT NULL DEFAULT '',
        rating           INTEGER NOT NULL,
        comment          TEXT,
        is_helpful       INTEGER NOT NULL,
        category         TEXT NOT NULL DEFAULT 'general',
        response_time_ms INTEGER,
        source_count     INTEGER NOT NULL DEFAULT 0,
        created_at       TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_feedback_conversation ON feedback(conversation_id)",
    "CREATE INDEX IF NOT EXISTS idx_feedback_user ON feedback(user_id)",
];
