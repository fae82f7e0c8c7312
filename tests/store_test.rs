// tests/store_test.rs
// Store- and orchestrator-level coverage against an in-memory database.

mod common;

use common::*;
use onboard::chat::{ChatError, FeedbackRequest};
use onboard::conversation::DeviceMetadata;
use onboard::identity::Role;
use onboard::knowledge::Category;

fn device() -> DeviceMetadata {
    DeviceMetadata {
        device_type: "desktop".into(),
        browser: "firefox".into(),
        ip_address: "10.0.0.1".into(),
    }
}

#[tokio::test]
async fn search_respects_role_gating() {
    let state = test_state(ScriptedBackend::replying("ok")).await;
    seed_restricted_entry(
        &state,
        "Disciplinary process",
        "Admin-only escalation steps for disciplinary reviews.",
        Category::AdminOnly,
        vec![Role::Admin],
    )
    .await;

    let as_employee = state
        .knowledge
        .search_by_role("disciplinary process", Role::Employee, 7)
        .await
        .unwrap();
    assert!(as_employee.is_empty());

    let as_admin = state
        .knowledge
        .search_by_role("disciplinary process", Role::Admin, 7)
        .await
        .unwrap();
    assert_eq!(as_admin.len(), 1);
    assert_eq!(as_admin[0].title, "Disciplinary process");
}

#[tokio::test]
async fn inactive_entries_never_surface() {
    let state = test_state(ScriptedBackend::replying("ok")).await;
    let id = seed_entry(
        &state,
        "Working hours",
        "Office hours are 9 to 5, Monday through Friday.",
        Category::Policy,
    )
    .await;
    state.knowledge.set_active(&id, false).await.unwrap();

    let results = state
        .knowledge
        .search_by_role("working hours", Role::Employee, 7)
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn title_matches_outrank_body_matches() {
    let state = test_state(ScriptedBackend::replying("ok")).await;
    seed_entry(
        &state,
        "Working hours",
        "Core schedule details.",
        Category::Policy,
    )
    .await;
    seed_entry(
        &state,
        "Parking",
        "The garage is open during working hours only.",
        Category::General,
    )
    .await;

    let results = state
        .knowledge
        .search_by_role("working hours", Role::Employee, 7)
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].title, "Working hours");
}

#[tokio::test]
async fn find_session_is_idempotent_and_owner_scoped() {
    let state = test_state(ScriptedBackend::replying("ok")).await;
    let user = employee("u-1");
    let session = state
        .conversations
        .create_session(&user, device())
        .await
        .unwrap();

    let first = state
        .conversations
        .find_session(&session.session_id, "u-1")
        .await
        .unwrap()
        .expect("own session resolves");
    let second = state
        .conversations
        .find_session(&session.session_id, "u-1")
        .await
        .unwrap()
        .expect("own session resolves");
    assert_eq!(first.session_id, second.session_id);
    assert_eq!(first.messages.len(), second.messages.len());
    assert_eq!(first.updated_at, second.updated_at);

    // The token alone never authorizes another user.
    let foreign = state
        .conversations
        .find_session(&session.session_id, "u-2")
        .await
        .unwrap();
    assert!(foreign.is_none());
}

#[tokio::test]
async fn each_turn_appends_exactly_two_messages_in_order() {
    let state = test_state(ScriptedBackend::replying("Welcome!")).await;
    let user = employee("u-1");

    let turn = state
        .orchestrator
        .handle_turn(&user, "Hello there!", None, device())
        .await
        .unwrap();

    let session = state
        .conversations
        .find_session(&turn.session_id, &user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.messages.len(), 2);
    assert_eq!(session.messages[0].role.as_str(), "user");
    assert_eq!(session.messages[1].role.as_str(), "bot");
    assert!(session.messages[0].timestamp <= session.messages[1].timestamp);

    // Second turn on the same session: strictly appended.
    state
        .orchestrator
        .handle_turn(&user, "And the hours?", Some(&turn.session_id), device())
        .await
        .unwrap();
    let session = state
        .conversations
        .find_session(&turn.session_id, &user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.messages.len(), 4);
}

#[tokio::test]
async fn gateway_failure_still_persists_a_complete_turn() {
    let state = test_state(ScriptedBackend::failing()).await;
    let user = employee("u-1");

    let turn = state
        .orchestrator
        .handle_turn(&user, "What are the working hours?", None, device())
        .await
        .unwrap();

    assert_eq!(turn.reply, onboard::llm::gateway::FALLBACK_REPLY);
    let session = state
        .conversations
        .find_session(&turn.session_id, &user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.messages.len(), 2);
    assert_eq!(session.messages[1].content, onboard::llm::gateway::FALLBACK_REPLY);
}

#[tokio::test]
async fn validation_rejects_without_touching_state() {
    let state = test_state(ScriptedBackend::replying("ok")).await;
    let user = employee("u-1");

    let empty = state
        .orchestrator
        .handle_turn(&user, "   ", None, device())
        .await;
    assert!(matches!(empty, Err(ChatError::Validation(_))));

    let long = "x".repeat(1001);
    let too_long = state
        .orchestrator
        .handle_turn(&user, &long, None, device())
        .await;
    assert!(matches!(too_long, Err(ChatError::Validation(_))));

    let sessions = state.conversations.find_by_user(&user.id, 10).await.unwrap();
    assert!(sessions.is_empty());
}

#[tokio::test]
async fn feedback_validates_rating_and_defaults_helpfulness() {
    let state = test_state(ScriptedBackend::replying("The hours are 9 to 5.")).await;
    let user = employee("u-1");
    let turn = state
        .orchestrator
        .handle_turn(&user, "What are the working hours?", None, device())
        .await
        .unwrap();

    for bad in [0, 6, -1] {
        let result = state
            .orchestrator
            .submit_feedback(
                &user,
                &FeedbackRequest {
                    conversation_id: turn.conversation_id.clone(),
                    rating: bad,
                    comment: None,
                    is_helpful: None,
                    question: None,
                    bot_response: None,
                },
            )
            .await;
        assert!(matches!(result, Err(ChatError::Validation(_))));
    }

    let middling = state
        .orchestrator
        .submit_feedback(
            &user,
            &FeedbackRequest {
                conversation_id: turn.conversation_id.clone(),
                rating: 3,
                comment: None,
                is_helpful: None,
                question: None,
                bot_response: None,
            },
        )
        .await
        .unwrap();
    assert!(!middling.is_helpful);
    // Denormalized from the conversation tail.
    assert_eq!(middling.question, "What are the working hours?");
    assert_eq!(middling.bot_response, "The hours are 9 to 5.");

    let glowing = state
        .orchestrator
        .submit_feedback(
            &user,
            &FeedbackRequest {
                conversation_id: turn.conversation_id.clone(),
                rating: 5,
                comment: Some("great".into()),
                is_helpful: None,
                question: None,
                bot_response: None,
            },
        )
        .await
        .unwrap();
    assert!(glowing.is_helpful);
}

#[tokio::test]
async fn feedback_for_foreign_conversation_is_not_found() {
    let state = test_state(ScriptedBackend::replying("ok")).await;
    let owner = employee("u-1");
    let turn = state
        .orchestrator
        .handle_turn(&owner, "Hello there!", None, device())
        .await
        .unwrap();

    let intruder = employee("u-2");
    let result = state
        .orchestrator
        .submit_feedback(
            &intruder,
            &FeedbackRequest {
                conversation_id: turn.conversation_id,
                rating: 5,
                comment: None,
                is_helpful: None,
                question: None,
                bot_response: None,
            },
        )
        .await;
    assert!(matches!(result, Err(ChatError::NotFound)));
}

#[tokio::test]
async fn deleting_a_session_cascades_to_feedback() {
    let state = test_state(ScriptedBackend::replying("ok")).await;
    let user = employee("u-1");
    let turn = state
        .orchestrator
        .handle_turn(&user, "Hello there!", None, device())
        .await
        .unwrap();
    state
        .orchestrator
        .submit_feedback(
            &user,
            &FeedbackRequest {
                conversation_id: turn.conversation_id.clone(),
                rating: 4,
                comment: None,
                is_helpful: None,
                question: None,
                bot_response: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(
        state
            .feedback
            .count_for_conversation(&turn.conversation_id)
            .await
            .unwrap(),
        1
    );

    state
        .orchestrator
        .delete_session(&user, &turn.session_id)
        .await
        .unwrap();

    assert_eq!(
        state
            .feedback
            .count_for_conversation(&turn.conversation_id)
            .await
            .unwrap(),
        0
    );
    assert!(state
        .conversations
        .find_session(&turn.session_id, &user.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn delete_all_reports_how_many_sessions_existed() {
    let state = test_state(ScriptedBackend::replying("ok")).await;
    let user = employee("u-1");
    for _ in 0..3 {
        state
            .orchestrator
            .handle_turn(&user, "Hello there!", None, device())
            .await
            .unwrap();
    }

    let deleted = state.orchestrator.delete_all(&user).await.unwrap();
    assert_eq!(deleted, 3);
    let remaining = state.conversations.find_by_user(&user.id, 10).await.unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn history_lists_most_recently_updated_first() {
    let state = test_state(ScriptedBackend::replying("ok")).await;
    let user = employee("u-1");
    let first = state
        .orchestrator
        .handle_turn(&user, "Hello there!", None, device())
        .await
        .unwrap();
    let second = state
        .orchestrator
        .handle_turn(&user, "Another question", None, device())
        .await
        .unwrap();
    // Touch the first session again so it becomes the most recent.
    state
        .orchestrator
        .handle_turn(&user, "Follow-up", Some(&first.session_id), device())
        .await
        .unwrap();

    let sessions = state.conversations.find_by_user(&user.id, 10).await.unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].session_id, first.session_id);
    assert_eq!(sessions[0].message_count, 4);
    assert_eq!(sessions[1].session_id, second.session_id);
}

#[tokio::test]
async fn view_counters_increment_after_a_turn() {
    let state = test_state(ScriptedBackend::replying("The hours are 9 to 5.")).await;
    let id = seed_entry(
        &state,
        "Working hours",
        "Office hours are 9 to 5, Monday through Friday.",
        Category::Policy,
    )
    .await;
    let user = employee("u-1");

    let turn = state
        .orchestrator
        .handle_turn(&user, "What are the working hours?", None, device())
        .await
        .unwrap();
    assert!(turn.sources_count >= 1);

    // Increments are fire-and-forget; poll briefly for the side effect.
    let mut view_count = 0;
    for _ in 0..50 {
        view_count = state.knowledge.get(&id).await.unwrap().unwrap().view_count;
        if view_count > 0 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(view_count, 1);
}

#[tokio::test]
async fn stale_session_token_gets_a_fresh_session() {
    let state = test_state(ScriptedBackend::replying("ok")).await;
    let user = employee("u-1");
    let turn = state
        .orchestrator
        .handle_turn(&user, "Hello there!", Some("no-such-token"), device())
        .await
        .unwrap();
    assert_ne!(turn.session_id, "no-such-token");
    assert!(state
        .conversations
        .find_session(&turn.session_id, &user.id)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn schema_survives_reconnect_on_a_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!(
        "sqlite://{}/onboard-test.db?mode=rwc",
        dir.path().display()
    );

    let pool = onboard::db::create_pool(&url, 2).await.unwrap();
    onboard::db::init_schema(&pool).await.unwrap();
    let store = onboard::knowledge::KnowledgeStore::new(pool.clone());
    let entry = onboard::knowledge::KnowledgeEntry::new(
        "Working hours",
        "Office hours are 9 to 5.",
        Category::Policy,
        onboard::knowledge::KnowledgeSource::Manual,
    );
    store.insert(&entry).await.unwrap();
    pool.close().await;

    // Reopen as on restart; init is idempotent and the data is still there.
    let pool = onboard::db::create_pool(&url, 2).await.unwrap();
    onboard::db::init_schema(&pool).await.unwrap();
    let store = onboard::knowledge::KnowledgeStore::new(pool);
    let found = store.get(&entry.id).await.unwrap().unwrap();
    assert_eq!(found.title, "Working hours");
}
