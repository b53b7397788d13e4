//! HTTP-level tests for the Adsight API, run against mock platform data.

use adsight::{router, AppState, Config};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Router over mock data with no LLM providers.
fn create_test_app() -> Router {
    let state = AppState::new(Config::default()).expect("mock state");
    router(Arc::new(state))
}

/// Helper to make a JSON request to the router.
async fn json_request(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let req = match method {
        "GET" => Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
        "POST" => Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.unwrap_or(json!({})).to_string()))
            .unwrap(),
        _ => panic!("Unsupported method"),
    };

    let response = app.oneshot(req).await.unwrap();
    let status = response.status();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(json!({}));

    (status, body)
}

// ============================================================================
// Health Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_health_endpoint_returns_200() {
    let (status, body) = json_request(create_test_app(), "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_ready_endpoint_reports_catalog() {
    let (status, body) = json_request(create_test_app(), "GET", "/ready", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["tools"], 14);
    assert_eq!(body["data_mode"], "mock");
}

// ============================================================================
// Chat Tests
// ============================================================================

#[tokio::test]
async fn test_chat_empty_message_returns_400() {
    let (status, body) = json_request(
        create_test_app(),
        "POST",
        "/chat",
        Some(json!({ "message": "   " })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Message cannot be empty");
    assert_eq!(body["code"], 400);
}

#[tokio::test]
async fn test_chat_missing_message_is_rejected() {
    let (status, _) = json_request(create_test_app(), "POST", "/chat", Some(json!({}))).await;

    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_chat_spend_today() {
    let (status, body) = json_request(
        create_test_app(),
        "POST",
        "/chat",
        Some(json!({ "message": "How much meta spend today?", "tenant_id": "acme" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["meta"]["mode"], "tool-mapping-spend-today");
    assert_eq!(body["meta"]["cached"], false);
    assert!(body["answer"].as_str().unwrap().contains("1,250.00"));
    assert_eq!(body["tools"][0]["name"], "get_meta_spend_today");
    assert_eq!(body["tools"][0]["result"]["source"], "mock");
}

#[tokio::test]
async fn test_chat_unmatched_question_still_ok() {
    let (status, body) = json_request(
        create_test_app(),
        "POST",
        "/chat",
        Some(json!({ "message": "What's the weather today" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["meta"]["mode"], "no-match");
    assert!(!body["answer"].as_str().unwrap().is_empty());
    assert!(body.get("tools").is_none());
}

// ============================================================================
// Tool Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_list_tools() {
    let (status, body) = json_request(create_test_app(), "GET", "/tools", None).await;

    assert_eq!(status, StatusCode::OK);
    let tools = body["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 14);
    assert!(tools
        .iter()
        .any(|t| t["name"] == "get_ga4_top_pages" && t["input_schema"]["type"] == "object"));
}

#[tokio::test]
async fn test_run_tool_directly() {
    let (status, body) = json_request(
        create_test_app(),
        "POST",
        "/tools/get_ga4_top_pages/run",
        Some(json!({ "args": { "limit": 2 } })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["tool"], "get_ga4_top_pages");
    assert_eq!(body["pages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_run_unknown_tool_returns_err_result_with_200() {
    let (status, body) =
        json_request(create_test_app(), "POST", "/tools/get_tiktok_spend/run", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"], "Unknown tool");
}

#[tokio::test]
async fn test_run_tool_rejects_malformed_body() {
    let req = Request::builder()
        .method("POST")
        .uri("/tools/get_ga4_top_pages/run")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"args": {"limit": 2"#))
        .unwrap();

    let response = create_test_app().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body_bytes).unwrap();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body"));
}

#[tokio::test]
async fn test_run_tool_with_empty_body_uses_defaults() {
    let req = Request::builder()
        .method("POST")
        .uri("/tools/get_ga4_top_pages/run")
        .body(Body::empty())
        .unwrap();

    let response = create_test_app().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body_bytes).unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["pages"].as_array().unwrap().len(), 5);
}
