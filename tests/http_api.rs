// tests/http_api.rs


use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use recipe_chat::config::DEFAULT_SYSTEM_PROMPT;
use recipe_chat::provider::{ChatProvider, ChatTurn, GeminiProvider};
use recipe_chat::server::{AppState, create_router};
use test_helpers::*;

const PASTA_REPLY: &str = "Ingredients:\n- 200g pasta\nSteps:\n1. Boil water\n2. Add pasta";

#[tokio::test]
async fn test_recipe_reply_includes_video() {
    let provider = Arc::new(ScriptedProvider::replying(&format!("  {}\n\n", PASTA_REPLY)));
    let videos = Arc::new(FakeVideoSearch::enabled(sample_video()));
    let app = test_app(provider.clone(), videos.clone());

    let (status, body) = post_message(&app, r#"{"message": "Give me a pasta recipe"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], PASTA_REPLY);
    assert_eq!(body["youtube"]["videoId"], "pasta42");
    assert_eq!(body["youtube"]["url"], "https://www.youtube.com/watch?v=pasta42");
    assert_eq!(videos.queries(), vec!["Give me a pasta recipe recipe".to_string()]);
}

#[tokio::test]
async fn test_recipe_reply_with_search_disabled() {
    let provider = Arc::new(ScriptedProvider::replying(PASTA_REPLY));
    let videos = Arc::new(FakeVideoSearch::disabled());
    let app = test_app(provider, videos);

    let (status, body) = post_message(&app, r#"{"message": "Give me a pasta recipe"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], PASTA_REPLY);
    assert!(body["youtube"].is_null());
    assert!(body.as_object().unwrap().contains_key("youtube"));
}

#[tokio::test]
async fn test_plain_reply_skips_video_lookup() {
    let provider = Arc::new(ScriptedProvider::replying("Paris is the capital of France."));
    let videos = Arc::new(FakeVideoSearch::enabled(sample_video()));
    let app = test_app(provider, videos.clone());

    let (status, body) = post_message(&app, r#"{"message": "Capital of France?"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["youtube"].is_null());
    assert!(videos.queries().is_empty());
}

#[tokio::test]
async fn test_empty_message_rejected() {
    let provider = Arc::new(ScriptedProvider::replying("unused"));
    let app = test_app(provider.clone(), Arc::new(FakeVideoSearch::disabled()));

    for body in [r#"{"message": ""}"#, r#"{"message": "   \n"}"#, r#"{}"#, "not json"] {
        let (status, json) = post_message(&app, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
        assert_eq!(json, json!({"error": "No message provided."}));
    }

    let (status, _) = send(&app, "POST", "/message", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_message_is_trimmed_before_sending() {
    let provider = Arc::new(ScriptedProvider::replying("ok"));
    let app = test_app(provider.clone(), Arc::new(FakeVideoSearch::disabled()));

    post_message(&app, r#"{"message": "  hello  "}"#).await;

    assert_eq!(provider.calls()[0].input, "hello");
}

#[tokio::test]
async fn test_reset_starts_fresh_context() {
    let provider = Arc::new(ScriptedProvider::new(vec![Ok("one"), Ok("two"), Ok("three")]));
    let app = test_app(provider.clone(), Arc::new(FakeVideoSearch::disabled()));

    post_message(&app, r#"{"message": "first", "system": "Old prompt"}"#).await;
    post_message(&app, r#"{"message": "second"}"#).await;

    let (status, body) = send(&app, "POST", "/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "Chat reset."}));

    post_message(&app, r#"{"message": "third", "system": "New prompt"}"#).await;

    let calls = provider.calls();
    assert_eq!(calls[1].history.len(), 2);
    assert_eq!(calls[2].system, "New prompt");
    assert!(calls[2].history.is_empty());
}

#[tokio::test]
async fn test_reset_without_session_succeeds() {
    let app = test_app(
        Arc::new(ScriptedProvider::default()),
        Arc::new(FakeVideoSearch::disabled()),
    );

    let (status, body) = send(&app, "POST", "/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Chat reset.");
}

#[tokio::test]
async fn test_system_prompt_fixed_after_first_message() {
    let provider = Arc::new(ScriptedProvider::new(vec![Ok("a"), Ok("b")]));
    let app = test_app(provider.clone(), Arc::new(FakeVideoSearch::disabled()));

    post_message(&app, r#"{"message": "hi"}"#).await;
    post_message(&app, r#"{"message": "again", "system": "Ignored"}"#).await;

    let calls = provider.calls();
    assert_eq!(calls[0].system, DEFAULT_SYSTEM_PROMPT);
    assert_eq!(calls[1].system, DEFAULT_SYSTEM_PROMPT);
    assert_eq!(calls[0].model, TEST_MODEL);
}

#[tokio::test]
async fn test_history_seeds_first_message_only() {
    let provider = Arc::new(ScriptedProvider::new(vec![Ok("a"), Ok("b")]));
    let app = test_app(provider.clone(), Arc::new(FakeVideoSearch::disabled()));

    let first = json!({
        "message": "and dessert?",
        "history": [
            {"role": "user", "content": "dinner ideas"},
            {"role": "model", "content": "try risotto"}
        ]
    });
    post_message(&app, &first.to_string()).await;
    post_message(
        &app,
        r#"{"message": "thanks", "history": [{"role": "user", "content": "ghost"}]}"#,
    )
    .await;

    let calls = provider.calls();
    assert_eq!(
        calls[0].history,
        vec![ChatTurn::user("dinner ideas"), ChatTurn::assistant("try risotto")]
    );
    assert_eq!(calls[1].history.len(), 4);
    assert!(!calls[1].history.contains(&ChatTurn::user("ghost")));
}

#[tokio::test]
async fn test_invalid_history_ignored() {
    let provider = Arc::new(ScriptedProvider::replying("ok"));
    let app = test_app(provider.clone(), Arc::new(FakeVideoSearch::disabled()));

    let (status, _) = post_message(&app, r#"{"message": "hi", "history": "nope"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert!(provider.calls()[0].history.is_empty());
}

#[tokio::test]
async fn test_provider_failure_returns_upstream_message() {
    let provider = Arc::new(ScriptedProvider::new(vec![Err("429 Resource has been exhausted")]));
    let videos = Arc::new(FakeVideoSearch::enabled(sample_video()));
    let app = test_app(provider, videos.clone());

    let (status, body) = post_message(&app, r#"{"message": "pasta please"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Scripted error: 429 Resource has been exhausted");
    assert!(videos.queries().is_empty());
}

#[tokio::test]
async fn test_failed_first_message_allows_new_system_prompt() {
    let provider = Arc::new(ScriptedProvider::new(vec![Err("boom"), Ok("ok")]));
    let app = test_app(provider.clone(), Arc::new(FakeVideoSearch::disabled()));

    post_message(&app, r#"{"message": "hi", "system": "First"}"#).await;
    let (status, _) = post_message(&app, r#"{"message": "hi", "system": "Second"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(provider.calls()[1].system, "Second");
}

#[tokio::test]
async fn test_mistyped_system_does_not_reject_message() {
    let provider = Arc::new(ScriptedProvider::replying("hi there"));
    let app = test_app(provider.clone(), Arc::new(FakeVideoSearch::disabled()));

    let (status, body) = post_message(&app, r#"{"message": "hello", "system": 5}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], "hi there");
    let calls = provider.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].input, "hello");
    assert_eq!(calls[0].system, DEFAULT_SYSTEM_PROMPT);
}

#[tokio::test]
async fn test_unreachable_provider_error_hides_api_key() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let provider = GeminiProvider::new("SECRET-KEY-123".into()).with_base_url(base_url);
    let state = AppState::new(
        Some(Arc::new(provider) as Arc<dyn ChatProvider>),
        Arc::new(FakeVideoSearch::disabled()),
        TEST_MODEL,
    );
    let app = create_router(state);

    let (status, body) = post_message(&app, r#"{"message": "hi"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = body["error"].as_str().unwrap();
    assert!(!error.is_empty());
    assert!(!error.contains("SECRET-KEY-123"), "key leaked: {error}");
}

#[tokio::test]
async fn test_missing_api_key_fails_per_request() {
    let state = AppState::new(None, Arc::new(FakeVideoSearch::disabled()), TEST_MODEL);
    let app = create_router(state);

    let (status, body) = post_message(&app, r#"{"message": "hi"}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "API_KEY is not set; the model provider is disabled");

    // Validation still comes first
    let (status, _) = post_message(&app, r#"{"message": ""}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_status_endpoint() {
    let provider = Arc::new(ScriptedProvider::replying("hello"));
    let app = test_app(provider, Arc::new(FakeVideoSearch::enabled(sample_video())));

    let (status, body) = send(&app, "GET", "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["provider"], "Scripted");
    assert_eq!(body["model"], TEST_MODEL);
    assert_eq!(body["video_lookup"], true);
    assert_eq!(body["session"], "uninitialized");

    post_message(&app, r#"{"message": "hi"}"#).await;
    let (_, body) = send(&app, "GET", "/status", None).await;
    assert_eq!(body["session"], "active");
}

#[tokio::test]
async fn test_concurrent_messages_are_serialized() {
    let provider = Arc::new(
        ScriptedProvider::new(vec![Ok("one"), Ok("two")]).with_delay(Duration::from_millis(50)),
    );
    let app = test_app(provider.clone(), Arc::new(FakeVideoSearch::disabled()));

    let (a, b) = tokio::join!(
        post_message(&app, r#"{"message": "first"}"#),
        post_message(&app, r#"{"message": "second"}"#),
    );
    assert_eq!(a.0, StatusCode::OK);
    assert_eq!(b.0, StatusCode::OK);

    assert_eq!(provider.max_in_flight(), 1);
    let calls = provider.calls();
    assert!(calls[0].history.is_empty());
    assert_eq!(calls[1].history.len(), 2, "second call sees the first exchange");
}
