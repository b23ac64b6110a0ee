mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use estate_relay::api::LIVENESS_MESSAGE;
use estate_relay::config::ToolBinding;

use common::*;

#[tokio::test]
async fn test_completed_run_returns_latest_assistant_reply() {
    init_test_logger();
    let server = MockServer::start().await;
    mount_setup_steps(&server).await;
    mount_run_status(&server, "completed").await;
    mount_reply(&server).await;
    mount_cleanup(&server, 1).await;

    let app = extraction_router(extraction_config(&server.uri(), ToolBinding::Thread));
    let response = app.oneshot(pdf_upload_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/plain; charset=utf-8"
    );
    assert_eq!(body_string(response).await, REPLY);
}

#[tokio::test]
async fn test_platform_calls_carry_auth_and_beta_headers() {
    let server = MockServer::start().await;
    // Registered first so it wins over the catch-all mounts below.
    Mock::given(method("POST"))
        .and(path("/threads/thread_abc/runs"))
        .and(header("authorization", "Bearer sk-test"))
        .and(header("openai-beta", "assistants=v2"))
        .and(body_partial_json(json!({
            "assistant_id": "asst_test",
            "tools": [{ "type": "file_search" }]
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "run_abc", "status": "queued" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_setup_steps(&server).await;
    mount_run_status(&server, "completed").await;
    mount_reply(&server).await;
    mount_cleanup(&server, 1).await;

    let app = extraction_router(extraction_config(&server.uri(), ToolBinding::Thread));
    let response = app.oneshot(pdf_upload_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_failed_run_returns_500() {
    let server = MockServer::start().await;
    mount_setup_steps(&server).await;
    mount_run_status(&server, "failed").await;
    Mock::given(method("GET"))
        .and(path("/threads/thread_abc/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(0)
        .mount(&server)
        .await;
    mount_cleanup(&server, 1).await;

    let app = extraction_router(extraction_config(&server.uri(), ToolBinding::Thread));
    let response = app.oneshot(pdf_upload_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "run_failed");
    assert_eq!(json["error"]["message"], "Assistant run failed");
}

#[tokio::test]
async fn test_expired_run_is_also_a_failure() {
    let server = MockServer::start().await;
    mount_setup_steps(&server).await;
    mount_run_status(&server, "expired").await;
    mount_cleanup(&server, 1).await;

    let app = extraction_router(extraction_config(&server.uri(), ToolBinding::Thread));
    let response = app.oneshot(pdf_upload_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_rejected_step_returns_422_and_cleans_up() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/threads"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "error": { "message": "Invalid tool_resources" } })),
        )
        .mount(&server)
        .await;
    mount_setup_steps(&server).await;

    for (route, id, times) in [
        ("/threads/thread_abc", "thread_abc", 0),
        ("/vector_stores/vs_abc", "vs_abc", 1),
        ("/files/file-abc", "file-abc", 1),
    ] {
        Mock::given(method("DELETE"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "id": id, "deleted": true })),
            )
            .expect(times)
            .mount(&server)
            .await;
    }

    let app = extraction_router(extraction_config(&server.uri(), ToolBinding::Thread));
    let response = app.oneshot(pdf_upload_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "upstream_rejected");
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("POST /threads"));
    assert!(!json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Invalid tool_resources"));
}

#[tokio::test]
async fn test_upload_rejection_returns_422() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Incorrect API key"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/vector_stores"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = extraction_router(extraction_config(&server.uri(), ToolBinding::Thread));
    let response = app.oneshot(pdf_upload_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["error"]["code"], "upstream_rejected");
}

#[tokio::test]
async fn test_unreachable_platform_returns_422() {
    // Nothing listens on the discard port.
    let app = extraction_router(extraction_config(
        "http://127.0.0.1:9",
        ToolBinding::Thread,
    ));
    let response = app.oneshot(pdf_upload_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body_json(response).await["error"]["code"],
        "upstream_unavailable"
    );
}

#[tokio::test]
async fn test_run_past_deadline_times_out_and_is_cancelled() {
    let server = MockServer::start().await;
    mount_setup_steps(&server).await;
    mount_run_status(&server, "in_progress").await;
    Mock::given(method("POST"))
        .and(path("/threads/thread_abc/runs/run_abc/cancel"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "run_abc", "status": "cancelling" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_cleanup(&server, 1).await;

    let mut config = extraction_config(&server.uri(), ToolBinding::Thread);
    config.run.poll_interval_ms = 100;
    config.run.poll_timeout_secs = 1;
    let app = extraction_router(config);
    let response = app.oneshot(pdf_upload_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body_json(response).await["error"]["code"], "run_timeout");
}

#[tokio::test]
async fn test_thread_binding_never_modifies_assistant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/threads"))
        .and(body_partial_json(json!({
            "tool_resources": { "file_search": { "vector_store_ids": ["vs_abc"] } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "thread_abc" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/assistants/asst_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "asst_test" })))
        .expect(0)
        .mount(&server)
        .await;
    mount_setup_steps(&server).await;
    mount_run_status(&server, "completed").await;
    mount_reply(&server).await;
    mount_cleanup(&server, 1).await;

    let app = extraction_router(extraction_config(&server.uri(), ToolBinding::Thread));
    let response = app.oneshot(pdf_upload_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_assistant_binding_updates_shared_assistant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/assistants/asst_test"))
        .and(body_partial_json(json!({
            "tools": [{ "type": "file_search" }],
            "tool_resources": { "file_search": { "vector_store_ids": ["vs_abc"] } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "asst_test" })))
        .expect(1)
        .mount(&server)
        .await;
    mount_setup_steps(&server).await;
    mount_run_status(&server, "completed").await;
    mount_reply(&server).await;
    mount_cleanup(&server, 1).await;

    let app = extraction_router(extraction_config(&server.uri(), ToolBinding::Assistant));
    let response = app.oneshot(pdf_upload_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, REPLY);
}

#[tokio::test]
async fn test_concurrent_assistant_binding_rewrites_one_shared_assistant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/assistants/asst_test"))
        .and(body_partial_json(json!({
            "tool_resources": { "file_search": { "vector_store_ids": ["vs_abc"] } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "asst_test" })))
        .expect(2)
        .mount(&server)
        .await;
    mount_setup_steps(&server).await;
    mount_run_status(&server, "completed").await;
    mount_reply(&server).await;
    mount_cleanup(&server, 2).await;

    let app = extraction_router(extraction_config(&server.uri(), ToolBinding::Assistant));
    let (first, second) = tokio::join!(
        app.clone().oneshot(pdf_upload_request()),
        app.oneshot(pdf_upload_request()),
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(body_string(first).await, REPLY);
    assert_eq!(body_string(second).await, REPLY);
    // Both requests pointed the same assistant at their own store.
    assert_eq!(received(&server, "POST", "/assistants/asst_test").await, 2);
    assert_eq!(received(&server, "POST", "/threads/thread_abc/runs").await, 2);
}

#[tokio::test]
async fn test_client_disconnect_cancels_run_and_cleans_up() {
    let server = MockServer::start().await;
    mount_setup_steps(&server).await;
    mount_run_status(&server, "in_progress").await;
    Mock::given(method("POST"))
        .and(path("/threads/thread_abc/runs/run_abc/cancel"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "run_abc", "status": "cancelling" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_cleanup(&server, 1).await;

    let mut config = extraction_config(&server.uri(), ToolBinding::Thread);
    config.run.poll_interval_ms = 50;
    config.run.poll_timeout_secs = 60;
    let app = extraction_router(config);

    // The caller gives up mid-poll, dropping the in-flight request.
    let outcome =
        tokio::time::timeout(Duration::from_millis(300), app.oneshot(pdf_upload_request())).await;
    assert!(outcome.is_err());

    tokio::time::sleep(Duration::from_millis(500)).await;

    let run_path = "/threads/thread_abc/runs/run_abc";
    assert_eq!(received(&server, "POST", "/threads/thread_abc/runs/run_abc/cancel").await, 1);
    assert_eq!(received(&server, "DELETE", "/threads/thread_abc").await, 1);
    assert_eq!(received(&server, "DELETE", "/vector_stores/vs_abc").await, 1);
    assert_eq!(received(&server, "DELETE", "/files/file-abc").await, 1);

    let polls = received(&server, "GET", run_path).await;
    assert!(polls > 0);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(received(&server, "GET", run_path).await, polls);
}

#[tokio::test]
async fn test_shutdown_cancels_in_flight_extraction() {
    let server = MockServer::start().await;
    mount_setup_steps(&server).await;
    mount_run_status(&server, "in_progress").await;
    Mock::given(method("POST"))
        .and(path("/threads/thread_abc/runs/run_abc/cancel"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "run_abc", "status": "cancelling" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_cleanup(&server, 1).await;

    let mut config = extraction_config(&server.uri(), ToolBinding::Thread);
    config.run.poll_interval_ms = 50;
    config.run.poll_timeout_secs = 60;
    let shutdown = CancellationToken::new();
    let app = extraction_router_with_shutdown(config, shutdown.clone());

    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let response = app.oneshot(pdf_upload_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["error"]["code"], "cancelled");
}

#[tokio::test]
async fn test_cleanup_disabled_leaves_resources() {
    let server = MockServer::start().await;
    mount_setup_steps(&server).await;
    mount_run_status(&server, "completed").await;
    mount_reply(&server).await;
    mount_cleanup(&server, 0).await;

    let mut config = extraction_config(&server.uri(), ToolBinding::Thread);
    config.run.cleanup = false;
    let app = extraction_router(config);
    let response = app.oneshot(pdf_upload_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_file_field_is_rejected_locally() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = extraction_router(extraction_config(&server.uri(), ToolBinding::Thread));
    let request = upload_request(
        "/extract",
        multipart_body("document", "om.pdf", "application/pdf", b"%PDF"),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "invalid_request");
    assert!(json["error"]["message"].as_str().unwrap().contains("file"));
}

#[tokio::test]
async fn test_non_multipart_body_is_rejected() {
    let app = extraction_router(extraction_config(
        "http://127.0.0.1:9",
        ToolBinding::Thread,
    ));
    let request = Request::builder()
        .method("POST")
        .uri("/extract")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"file":"nope"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["error"]["code"], "invalid_request");
}

#[tokio::test]
async fn test_empty_file_is_rejected() {
    let app = extraction_router(extraction_config(
        "http://127.0.0.1:9",
        ToolBinding::Thread,
    ));
    let request = upload_request(
        "/extract",
        multipart_body("file", "empty.pdf", "application/pdf", b""),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_liveness_and_health() {
    let app = extraction_router(extraction_config(
        "http://127.0.0.1:9",
        ToolBinding::Thread,
    ));

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, LIVENESS_MESSAGE);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["service"], "extraction-service");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = extraction_router(extraction_config(
        "http://127.0.0.1:9",
        ToolBinding::Thread,
    ));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["paths"]["/extract"]["post"].is_object());
}

#[tokio::test]
async fn test_openapi_document_uses_configured_path() {
    let mut config = extraction_config("http://127.0.0.1:9", ToolBinding::Thread);
    config.path = "/deals/extract".to_string();
    let app = extraction_router(config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = body_json(response).await;
    assert!(json["paths"]["/deals/extract"]["post"].is_object());
    assert!(json["paths"]["/extract"].is_null());
}
