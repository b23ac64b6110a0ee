// Shared helpers for the router-level integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Once};

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use estate_relay::api::{create_extraction_router, ExtractionState};
use estate_relay::assistants::{AssistantPlatform, AssistantsClient};
use estate_relay::config::{ExtractionConfig, PlatformConfig, RunConfig, ServerConfig, ToolBinding};

static INIT: Once = Once::new();

/// Initialize tracing subscriber once for tests
pub fn init_test_logger() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub const BOUNDARY: &str = "estate-relay-test-boundary";
pub const REPLY: &str = r#"{"property_info":{"name":"Maple Court","total_units":48},"pricing":{"asking_price":7250000}}"#;

pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// A `multipart/form-data` body with a single file part named `field`.
pub fn multipart_body(field: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn upload_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn pdf_upload_request() -> Request<Body> {
    upload_request(
        "/extract",
        multipart_body(
            "file",
            "maple-court-om.pdf",
            "application/pdf",
            b"%PDF-1.7 Maple Court offering memorandum",
        ),
    )
}

pub fn extraction_config(base_url: &str, tool_binding: ToolBinding) -> ExtractionConfig {
    ExtractionConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 5000,
        },
        platform: PlatformConfig {
            api_key: Some("sk-test".to_string()),
            assistant_id: Some("asst_test".to_string()),
            base_url: base_url.to_string(),
            beta_header: "assistants=v2".to_string(),
            timeout_secs: 5,
        },
        run: RunConfig {
            poll_interval_ms: 20,
            poll_timeout_secs: 5,
            tool_binding,
            await_indexing: true,
            cleanup: true,
        },
        path: "/extract".to_string(),
        max_upload_bytes: 1024 * 1024,
    }
}

pub fn extraction_router(config: ExtractionConfig) -> Router {
    extraction_router_with_shutdown(config, CancellationToken::new())
}

/// Router whose in-flight extractions are cancelled by `shutdown`.
pub fn extraction_router_with_shutdown(
    config: ExtractionConfig,
    shutdown: CancellationToken,
) -> Router {
    let platform: Arc<dyn AssistantPlatform> =
        Arc::new(AssistantsClient::new(&config.platform).unwrap());
    let state = ExtractionState::new(config, platform, shutdown).unwrap();
    create_extraction_router(state)
}

/// Number of requests the mock server received for `method` and `path`.
pub async fn received(server: &MockServer, method: &str, path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == method && r.url.path() == path)
        .count()
}

fn ok_json(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

/// Mount every platform call up to and including run creation.
pub async fn mount_setup_steps(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/files"))
        .respond_with(ok_json(json!({
            "id": "file-abc",
            "object": "file",
            "filename": "maple-court-om.pdf",
            "bytes": 40,
            "purpose": "assistants"
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/vector_stores"))
        .respond_with(ok_json(json!({ "id": "vs_abc", "name": "maple-court-om.pdf" })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/vector_stores/vs_abc/file_batches"))
        .respond_with(ok_json(json!({ "id": "vsfb_abc", "status": "completed" })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/threads"))
        .respond_with(ok_json(json!({ "id": "thread_abc", "object": "thread" })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/threads/thread_abc/messages"))
        .respond_with(ok_json(json!({
            "id": "msg_prompt",
            "role": "user",
            "created_at": 1700000000,
            "content": [{ "type": "text", "text": { "value": "prompt", "annotations": [] } }]
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/threads/thread_abc/runs"))
        .respond_with(ok_json(json!({ "id": "run_abc", "status": "queued" })))
        .mount(server)
        .await;
}

pub async fn mount_run_status(server: &MockServer, status: &str) {
    Mock::given(method("GET"))
        .and(path("/threads/thread_abc/runs/run_abc"))
        .respond_with(ok_json(json!({ "id": "run_abc", "status": status })))
        .mount(server)
        .await;
}

pub async fn mount_reply(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/threads/thread_abc/messages"))
        .respond_with(ok_json(json!({
            "object": "list",
            "data": [
                {
                    "id": "msg_reply",
                    "role": "assistant",
                    "created_at": 1700000030,
                    "content": [{ "type": "text", "text": { "value": REPLY, "annotations": [] } }]
                },
                {
                    "id": "msg_prompt",
                    "role": "user",
                    "created_at": 1700000000,
                    "content": [{ "type": "text", "text": { "value": "prompt", "annotations": [] } }]
                }
            ]
        })))
        .mount(server)
        .await;
}

/// Mount the three cleanup deletes, each expected `times` times.
pub async fn mount_cleanup(server: &MockServer, times: u64) {
    for (route, id) in [
        ("/threads/thread_abc", "thread_abc"),
        ("/vector_stores/vs_abc", "vs_abc"),
        ("/files/file-abc", "file-abc"),
    ] {
        Mock::given(method("DELETE"))
            .and(path(route))
            .respond_with(ok_json(json!({ "id": id, "deleted": true })))
            .expect(times)
            .named(route)
            .mount(server)
            .await;
    }
}
