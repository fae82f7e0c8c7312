// src/conversation/query.rs

//! SQL query strings for the conversation store.

pub const INSERT_SESSION: &str = r#"
    INSERT INTO sessions (
        id, session_id, user_id, user_email, user_name, user_role,
        device_type, browser, ip_address, created_at, updated_at
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

/// Lookup scoped by both fields; a session id alone never authorizes
/// access to another user's data.
pub const FIND_SESSION: &str = r#"
    SELECT
        id, session_id, user_id, user_email, user_name, user_role,
        feedback_rating, feedback_comment, feedback_at,
        device_type, browser, ip_address, created_at, updated_at
    FROM sessions
    WHERE session_id = ? AND user_id = ?
"#;

pub const FIND_BY_CONVERSATION_ID: &str = r#"
    SELECT
        id, session_id, user_id, user_email, user_name, user_role,
        feedback_rating, feedback_comment, feedback_at,
        device_type, browser, ip_address, created_at, updated_at
    FROM sessions
    WHERE id = ? AND user_id = ?
"#;

pub const LOAD_MESSAGES: &str = r#"
    SELECT
        id, role, content, intent, content_length, response_time_ms,
        quick_replies, knowledge_sources, created_at
    FROM messages
    WHERE session_id = ?
    ORDER BY seq ASC
"#;

pub const NEXT_SEQ: &str = r#"
    SELECT COALESCE(MAX(seq), -1) + 1 FROM messages WHERE session_id = ?
"#;

pub const INSERT_MESSAGE: &str = r#"
    INSERT INTO messages (
        id, session_id, seq, role, content, intent, content_length,
        response_time_ms, quick_replies, knowledge_sources, created_at
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

pub const TOUCH_SESSION: &str = r#"
    UPDATE sessions SET updated_at = ? WHERE session_id = ?
"#;

/// Most-recently-updated sessions for a user, with message count and the
/// last message content for the listing view.
pub const LIST_FOR_USER: &str = r#"
    SELECT
        s.session_id,
        s.user_role,
        s.created_at,
        s.updated_at,
        COUNT(m.id) AS message_count,
        (
            SELECT content FROM messages
            WHERE session_id = s.session_id
            ORDER BY seq DESC LIMIT 1
        ) AS last_message
    FROM sessions s
    LEFT JOIN messages m ON m.session_id = s.session_id
    WHERE s.user_id = ?
    GROUP BY s.session_id
    ORDER BY s.updated_at DESC
    LIMIT ?
"#;

pub const STAMP_FEEDBACK: &str = r#"
    UPDATE sessions
    SET feedback_rating = ?, feedback_comment = ?, feedback_at = ?, updated_at = ?
    WHERE id = ?
"#;

pub const DELETE_FEEDBACK_FOR_SESSION: &str = r#"
    DELETE FROM feedback WHERE conversation_id = ?
"#;

pub const DELETE_MESSAGES_FOR_SESSION: &str = r#"
    DELETE FROM messages WHERE session_id = ?
"#;

pub const DELETE_SESSION: &str = r#"
    DELETE FROM sessions WHERE session_id = ? AND user_id = ?
"#;

pub const LIST_SESSION_IDS_FOR_USER: &str = r#"
    SELECT session_id, id FROM sessions WHERE user_id = ?
"#;
