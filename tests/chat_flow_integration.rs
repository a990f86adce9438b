mod common;

use serde_json::json;
use std::sync::Arc;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gemchat::config::ProviderConfig;
use gemchat::providers::{GeminiProvider, Message, MISSING_KEY_PLACEHOLDER};
use gemchat::{AppState, ChatOrchestrator};

/// A full send through the real Gemini client is persisted to disk
#[tokio::test]
async fn test_send_through_gemini_is_persisted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": "Hello there" }] } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (persistence, dir) = common::create_temp_persistence();
    let state = AppState::load(persistence, "gemini-2.0-flash");
    let id = state.current_id().unwrap();

    let cfg = ProviderConfig {
        api_base: server.uri(),
        ..Default::default()
    };
    let provider = GeminiProvider::new(&cfg, Some("k".to_string())).unwrap();
    let chat = ChatOrchestrator::new(state.into_shared(), Arc::new(provider));

    let reply = chat.send(&id, "Hello", None).await.unwrap();
    assert_eq!(reply, "Hello there");
    drop(chat);

    let reloaded = AppState::load(common::reopen_persistence(&dir), "gemini-2.0-flash");
    assert_eq!(
        reloaded.conversation(&id).unwrap().messages,
        vec![Message::user("Hello"), Message::model("Hello there")]
    );
}

/// Without a key the placeholder is committed as the model message
#[tokio::test]
async fn test_missing_key_placeholder_is_committed() {
    let (persistence, _dir) = common::create_temp_persistence();
    let state = AppState::load(persistence, "gemini-2.0-flash");
    let id = state.current_id().unwrap();

    let provider = GeminiProvider::new(&ProviderConfig::default(), None).unwrap();
    let chat = ChatOrchestrator::new(state.into_shared(), Arc::new(provider));

    let reply = chat.send(&id, "Hello", None).await.unwrap();
    assert_eq!(reply, MISSING_KEY_PLACEHOLDER);

    let state = chat.read_state().unwrap();
    let messages = &state.conversation(&id).unwrap().messages;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1], Message::model(MISSING_KEY_PLACEHOLDER));
}

/// Each conversation sends its own instruction and history
#[tokio::test]
async fn test_conversations_are_isolated() {
    let (persistence, _dir) = common::create_temp_persistence();
    let mut state = AppState::load(persistence, "gemini-test");
    let a = state.current_id().unwrap();
    state.set_instruction(&a, "You are A").unwrap();
    let b = state.create_conversation();
    state.set_instruction(&b, "You are B").unwrap();

    let provider = common::MockProvider::new(&["from A", "from B", "A again"]);
    let chat = ChatOrchestrator::new(state.into_shared(), Arc::new(provider.clone()));

    chat.send(&a, "one", None).await.unwrap();
    chat.send(&b, "two", None).await.unwrap();
    chat.send(&a, "three", None).await.unwrap();

    let calls = provider.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].1, "You are A");
    assert_eq!(calls[1].1, "You are B");
    assert_eq!(calls[1].0, vec![Message::user("two")]);
    assert_eq!(calls[2].0.len(), 3);
    assert_eq!(calls[2].2, "gemini-test");

    let state = chat.read_state().unwrap();
    assert_eq!(state.conversation(&a).unwrap().messages.len(), 4);
    assert_eq!(state.conversation(&b).unwrap().messages.len(), 2);
}

/// Editing a user message sends only the history before it
#[tokio::test]
async fn test_edit_sends_truncated_history() {
    let (persistence, _dir) = common::create_temp_persistence();
    let state = AppState::load(persistence, "gemini-test");
    let id = state.current_id().unwrap();

    let provider = common::MockProvider::new(&["A1", "A2", "A2 revised"]);
    let chat = ChatOrchestrator::new(state.into_shared(), Arc::new(provider.clone()));

    chat.send(&id, "Q1", None).await.unwrap();
    chat.send(&id, "Q2", None).await.unwrap();
    let reply = chat.edit(&id, 2, "Q2 revised").await.unwrap();

    assert_eq!(reply.as_deref(), Some("A2 revised"));
    let sent = &provider.calls()[2].0;
    assert_eq!(
        sent,
        &vec![
            Message::user("Q1"),
            Message::model("A1"),
            Message::user("Q2 revised")
        ]
    );
    assert!(!chat.is_busy());
}

/// A transport failure never puts the API key into stored or exported text
#[tokio::test]
async fn test_transport_failure_keeps_key_out_of_history() {
    let (persistence, _dir) = common::create_temp_persistence();
    let state = AppState::load(persistence, "gemini-2.0-flash");
    let id = state.current_id().unwrap();

    let cfg = ProviderConfig {
        api_base: "http://127.0.0.1:1".to_string(),
        timeout_seconds: 5,
        ..Default::default()
    };
    let provider = GeminiProvider::new(&cfg, Some("SECRET-KEY-123".to_string())).unwrap();
    let chat = ChatOrchestrator::new(state.into_shared(), Arc::new(provider));

    let reply = chat.send(&id, "Hello", None).await.unwrap();
    assert!(reply.starts_with("⚠️ Error: "));
    assert!(!reply.contains("SECRET-KEY-123"));

    let conversation = chat.read_state().unwrap().conversation(&id).unwrap().clone();
    assert!(conversation
        .messages
        .iter()
        .all(|m| !m.text.contains("SECRET-KEY-123")));

    let out = tempfile::tempdir().unwrap();
    let path = gemchat::export::export_conversation(&conversation, out.path()).unwrap();
    let exported = std::fs::read_to_string(path).unwrap();
    assert!(!exported.contains("SECRET-KEY-123"));
}
