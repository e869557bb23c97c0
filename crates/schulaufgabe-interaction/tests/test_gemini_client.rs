use std::sync::{Arc, Mutex};

use axum::Json;
use axum::Router;
use axum::http::{HeaderMap, StatusCode, Uri};
use schulaufgabe_core::PipelineError;
use schulaufgabe_core::inference::InferenceClient;
use schulaufgabe_interaction::GeminiInferenceClient;
use serde_json::{Value, json};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
struct Captured {
    path: String,
    api_key: Option<String>,
    body: Value,
}

/// Serves `reply` for every request and records the last request seen.
async fn spawn_fake_gemini(
    status: StatusCode,
    reply: Value,
) -> (String, Arc<Mutex<Option<Captured>>>) {
    let captured: Arc<Mutex<Option<Captured>>> = Arc::new(Mutex::new(None));
    let sink = captured.clone();

    let app = Router::new().fallback(
        move |headers: HeaderMap, uri: Uri, Json(body): Json<Value>| {
            let sink = sink.clone();
            let reply = reply.clone();
            async move {
                *sink.lock().unwrap() = Some(Captured {
                    path: uri.path().to_string(),
                    api_key: headers
                        .get("x-goog-api-key")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string),
                    body,
                });
                (status, Json(reply))
            }
        },
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/v1beta/models"), captured)
}

#[tokio::test]
async fn test_infer_sends_image_and_prompt_and_returns_text() {
    let (base_url, captured) = spawn_fake_gemini(
        StatusCode::OK,
        json!({"candidates": [{"content": {"parts": [{"text": "```latex\n\\documentclass{article}\n```"}]}}]}),
    )
    .await;

    let client = GeminiInferenceClient::new("test-key", "gemini-2.0-flash").with_base_url(base_url);
    let text = client
        .infer(b"jpeg-bytes", "image/jpeg", "Transcribe")
        .await
        .expect("inference should succeed");

    // Sanitizing is the pipeline's job, the client returns the raw text.
    assert_eq!(text, "```latex\n\\documentclass{article}\n```");

    let seen = captured.lock().unwrap().clone().expect("request recorded");
    assert_eq!(seen.path, "/v1beta/models/gemini-2.0-flash:generateContent");
    assert_eq!(seen.api_key.as_deref(), Some("test-key"));
    let parts = &seen.body["contents"][0]["parts"];
    assert_eq!(parts[0]["inlineData"]["mimeType"], "image/jpeg");
    assert_eq!(parts[0]["inlineData"]["data"], "anBlZy1ieXRlcw==");
    assert_eq!(parts[1]["text"], "Transcribe");
}

#[tokio::test]
async fn test_http_error_becomes_upstream_error() {
    let (base_url, _captured) = spawn_fake_gemini(
        StatusCode::FORBIDDEN,
        json!({"error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}}),
    )
    .await;

    let client = GeminiInferenceClient::with_api_key("bad-key").with_base_url(base_url);
    let err = client.infer(b"x", "image/jpeg", "p").await.unwrap_err();

    match err {
        PipelineError::Upstream(message) => {
            assert!(message.contains("403"));
            assert!(message.contains("PERMISSION_DENIED: API key not valid"));
            assert!(!message.contains("bad-key"));
        }
        other => panic!("Expected Upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_candidates_become_upstream_error() {
    let (base_url, _captured) = spawn_fake_gemini(StatusCode::OK, json!({"candidates": []})).await;

    let client = GeminiInferenceClient::with_api_key("k").with_base_url(base_url);
    let err = client.infer(b"x", "image/jpeg", "p").await.unwrap_err();
    assert!(matches!(err, PipelineError::Upstream(_)));
}

#[tokio::test]
async fn test_unreachable_endpoint_becomes_upstream_error() {
    // Bind then drop to get a port with nothing listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = GeminiInferenceClient::with_api_key("k").with_base_url(format!("http://{addr}"));
    let err = client.infer(b"x", "image/jpeg", "p").await.unwrap_err();
    assert!(err.to_string().contains("Gemini API request failed"));
}
