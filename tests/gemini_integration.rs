use serde_json::json;

use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gemchat::config::ProviderConfig;
use gemchat::providers::{
    complete_or_placeholder, GeminiProvider, Message, Provider, EMPTY_RESPONSE_PLACEHOLDER,
    MISSING_KEY_PLACEHOLDER,
};

fn provider_for(server: &MockServer, key: Option<&str>) -> GeminiProvider {
    let cfg = ProviderConfig {
        api_base: server.uri(),
        timeout_seconds: 5,
        ..Default::default()
    };
    GeminiProvider::new(&cfg, key.map(str::to_string)).unwrap()
}

fn reply_body(parts: &[&str]) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": parts.iter().map(|p| json!({ "text": p })).collect::<Vec<_>>()
            },
            "finishReason": "STOP"
        }]
    })
}

/// Request carries history, instruction and key; reply parts are joined
#[tokio::test]
async fn test_generate_content_round_trip() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [
                { "role": "user", "parts": [{ "text": "Hi" }] },
                { "role": "model", "parts": [{ "text": "Hello!" }] },
                { "role": "user", "parts": [{ "text": "Tell me a joke" }] }
            ],
            "systemInstruction": { "parts": [{ "text": "Be funny" }] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body(&["Why did ", "the crab..."])))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server, Some("test-key"));
    let history = vec![
        Message::user("Hi"),
        Message::model("Hello!"),
        Message::user("Tell me a joke"),
    ];

    let text = provider
        .complete(&history, "Be funny", "gemini-2.0-flash")
        .await
        .unwrap();
    assert_eq!(text, "Why did the crab...");
}

/// A blank instruction is left out of the request body
#[tokio::test]
async fn test_blank_instruction_omitted() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body(&["ok"])))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server, Some("k"));
    provider
        .complete(&[Message::user("ping")], "   ", "models/gemini-2.0-flash")
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("systemInstruction").is_none());
}

/// Error statuses become the error placeholder with the API's message
#[tokio::test]
async fn test_error_status_maps_to_placeholder() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT"
            }
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server, Some("bad-key"));
    let text =
        complete_or_placeholder(&provider, &[Message::user("hi")], "", "gemini-2.0-flash").await;

    assert!(text.starts_with("⚠️ Error: "));
    assert!(text.contains("API key not valid"));
    assert!(text.contains("INVALID_ARGUMENT"));
}

/// No candidates and blank text both map to the empty-response placeholder
#[tokio::test]
async fn test_empty_candidates_map_to_placeholder() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [],
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server, Some("k"));
    let text =
        complete_or_placeholder(&provider, &[Message::user("hi")], "", "gemini-2.0-flash").await;
    assert_eq!(text, EMPTY_RESPONSE_PLACEHOLDER);
}

/// Without a key no request is made at all
#[tokio::test]
async fn test_missing_key_makes_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body(&["unreachable"])))
        .expect(0)
        .mount(&server)
        .await;

    let provider = provider_for(&server, None);
    let text =
        complete_or_placeholder(&provider, &[Message::user("hi")], "", "gemini-2.0-flash").await;
    assert_eq!(text, MISSING_KEY_PLACEHOLDER);
}

/// Model listing keeps only models that support generateContent
#[tokio::test]
async fn test_list_models_filters_generate_content() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .and(query_param("key", "k"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [
                {
                    "name": "models/gemini-2.0-flash",
                    "displayName": "Gemini 2.0 Flash",
                    "inputTokenLimit": 1048576,
                    "supportedGenerationMethods": ["generateContent", "countTokens"]
                },
                {
                    "name": "models/text-embedding-004",
                    "displayName": "Text Embedding 004",
                    "supportedGenerationMethods": ["embedContent"]
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server, Some("k"));
    let models = provider.list_models().await.unwrap();

    assert_eq!(models.len(), 1);
    assert_eq!(models[0].name, "gemini-2.0-flash");
    assert_eq!(models[0].display_name, "Gemini 2.0 Flash");
    assert_eq!(models[0].input_token_limit, Some(1048576));
}

/// Undecodable bodies are reported without the request URL or key
#[tokio::test]
async fn test_decode_error_does_not_echo_api_key() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let provider = provider_for(&server, Some("SECRET-KEY-123"));
    let text =
        complete_or_placeholder(&provider, &[Message::user("hi")], "", "gemini-2.0-flash").await;
    assert!(text.starts_with("⚠️ Error: "));
    assert!(!text.contains("SECRET-KEY-123"));

    let err = provider.list_models().await.unwrap_err();
    assert!(!err.to_string().contains("SECRET-KEY-123"));
}
