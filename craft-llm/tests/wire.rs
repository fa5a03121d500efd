//! Wire-level tests — `LlmClient` against an in-process fake provider.
//!
//! The fake speaks just enough of the OpenAI chat completions and Ollama chat
//! protocols to check request bodies, reply extraction and error classification.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{Value, json};

use craft_llm::{ChatBackend, ChatMessage, LlmClient, LlmError, LlmProvider, ModelInvoker};

#[derive(Clone, Default)]
struct Fake {
    bodies: Arc<Mutex<Vec<Value>>>,
    auth: Arc<Mutex<Vec<String>>>,
}

async fn openai_chat(
    State(fake): State<Fake>,
    headers: axum::http::HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    fake.bodies.lock().push(body.clone());
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    fake.auth.lock().push(auth.clone());

    if auth != "Bearer gsk_test" {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": {"message": "Invalid API Key", "code": "invalid_api_key"}})),
        );
    }

    let user = body["messages"][1]["content"].as_str().unwrap_or_default();
    if user.contains("reject-json") && body.get("response_format").is_some() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": {
                "message": "Failed to generate JSON. Please adjust your prompt.",
                "type": "invalid_request_error",
                "code": "json_validate_failed"
            }})),
        );
    }

    let content = if body.get("response_format").is_some() {
        r#"{"symbol": "Steam", "emoji": "💨"}"#
    } else {
        "  Steam 💨  "
    };
    (
        StatusCode::OK,
        Json(json!({
            "choices": [{"message": {"role": "assistant", "content": content}}],
            "usage": {"completion_tokens": 12}
        })),
    )
}

async fn ollama_chat(State(fake): State<Fake>, Json(body): Json<Value>) -> Json<Value> {
    fake.bodies.lock().push(body);
    Json(json!({
        "message": {
            "role": "assistant",
            "content": "{\"symbol\":\"Mud\",\"emoji\":\"🟤\"}"
        },
        "eval_count": 9
    }))
}

async fn spawn_fake() -> (SocketAddr, Fake) {
    let fake = Fake::default();
    let app = Router::new()
        .route("/v1/chat/completions", post(openai_chat))
        .route("/api/chat", post(ollama_chat))
        .with_state(fake.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    (addr, fake)
}

fn messages(user: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system("You are an API that returns JSON."),
        ChatMessage::user(user),
    ]
}

fn openai_client(addr: SocketAddr, key: &str) -> LlmClient {
    LlmClient::new(
        LlmProvider::OpenAiCompatible {
            base_url: format!("http://{addr}/v1/"),
            api_key: key.into(),
        },
        "qwen/qwen3-32b",
    )
}

#[tokio::test]
async fn openai_request_carries_json_mode_and_sampling() {
    let (addr, fake) = spawn_fake().await;
    let invoker = ModelInvoker::new(Arc::new(openai_client(addr, "gsk_test")));

    let text = invoker
        .invoke(&messages("Combine the following symbols: Water+Fire"), true)
        .await
        .expect("invoke");
    assert_eq!(text, r#"{"symbol": "Steam", "emoji": "💨"}"#);

    let bodies = fake.bodies.lock().clone();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["model"], "qwen/qwen3-32b");
    assert_eq!(bodies[0]["temperature"], 0.0);
    assert_eq!(bodies[0]["max_tokens"], 30_000);
    assert_eq!(bodies[0]["response_format"]["type"], "json_object");
    assert_eq!(bodies[0]["messages"][0]["role"], "system");
}

#[tokio::test]
async fn json_rejection_falls_back_to_plain_text() {
    let (addr, fake) = spawn_fake().await;
    let invoker = ModelInvoker::new(Arc::new(openai_client(addr, "gsk_test")));

    let text = invoker
        .invoke(&messages("reject-json Water+Fire"), true)
        .await
        .expect("invoke");
    assert_eq!(text, "Steam 💨");

    let bodies = fake.bodies.lock().clone();
    assert_eq!(bodies.len(), 2);
    assert!(bodies[0].get("response_format").is_some());
    assert!(bodies[1].get("response_format").is_none());
    assert_eq!(bodies[0]["messages"], bodies[1]["messages"]);
}

#[tokio::test]
async fn bad_key_is_rejected_without_retry() {
    let (addr, fake) = spawn_fake().await;
    let invoker = ModelInvoker::new(Arc::new(openai_client(addr, "")));

    let err = invoker
        .invoke(&messages("Water+Fire"), true)
        .await
        .expect_err("unauthorized");
    assert!(matches!(err, LlmError::Rejected { status: 401, .. }));
    assert_eq!(fake.auth.lock().len(), 1, "no retry after an auth failure");
}

#[tokio::test]
async fn ollama_uses_format_json() {
    let (addr, fake) = spawn_fake().await;
    let client = LlmClient::new(
        LlmProvider::Ollama {
            base_url: format!("http://{addr}"),
        },
        "qwen2.5:1.5b",
    );
    let req = craft_llm::ChatRequest::new(messages("Water+Earth"));
    let resp = client.complete(&req).await.expect("complete");
    assert_eq!(resp.text, r#"{"symbol":"Mud","emoji":"🟤"}"#);
    assert_eq!(resp.tokens_generated, 9);

    let bodies = fake.bodies.lock().clone();
    assert_eq!(bodies[0]["format"], "json");
    assert_eq!(bodies[0]["stream"], false);
    assert_eq!(bodies[0]["options"]["num_predict"], 30_000);
}

#[tokio::test]
async fn unreachable_provider_is_an_error() {
    // Bind then drop to get a port nobody listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let invoker = ModelInvoker::new(Arc::new(openai_client(addr, "gsk_test")));
    let err = invoker
        .invoke(&messages("Water+Fire"), true)
        .await
        .expect_err("nothing listening");
    assert!(matches!(
        err,
        LlmError::Unavailable(_) | LlmError::RequestFailed(_)
    ));
}
