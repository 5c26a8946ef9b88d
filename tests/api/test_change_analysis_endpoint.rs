// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /api/v1/change_analysis with stub models and a local image server

use axum::http::StatusCode;
use pulseview::analysis::ChangeAnalysisService;
use pulseview::api::AppState;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

use super::support::{
    app, body_json, json_request, spawn_image_server, state_with_stub_models, FailingCaption,
    QuadrantExtractor,
};

fn analysis_body(pre: &str, post: &str) -> serde_json::Value {
    json!({
        "image_url_pre": pre,
        "image_url_post": post,
        "instruction": "Describe the new construction."
    })
}

#[tokio::test]
async fn test_success_returns_caption_and_mask() {
    let addr = spawn_image_server().await;
    let app = app(state_with_stub_models());

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/change_analysis",
            analysis_body(
                &format!("http://{}/pre.png", addr),
                &format!("http://{}/post.png", addr),
            ),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["caption"], "Describe the new construction. [1, 4, 3]");
    // Only the top-right quadrant changed
    assert_eq!(body["change_mask"], json!([0.0, 1.0, 0.0, 0.0]));
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_unreachable_url_returns_error_payload() {
    let app = app(state_with_stub_models());

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/change_analysis",
            analysis_body("http://127.0.0.1:1/pre.png", "http://127.0.0.1:1/post.png"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("Could not download image"), "{}", error);
    assert!(body.get("caption").is_none());
}

#[tokio::test]
async fn test_http_error_status_is_download_failure() {
    let addr = spawn_image_server().await;
    let app = app(state_with_stub_models());

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/change_analysis",
            analysis_body(
                &format!("http://{}/pre.png", addr),
                &format!("http://{}/missing.png", addr),
            ),
        ))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Could not download image"));
}

#[tokio::test]
async fn test_corrupt_image_returns_processing_error() {
    let addr = spawn_image_server().await;
    let app = app(state_with_stub_models());

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/change_analysis",
            analysis_body(
                &format!("http://{}/broken.png", addr),
                &format!("http://{}/post.png", addr),
            ),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Error processing image"));
}

#[tokio::test]
async fn test_models_not_loaded_is_503() {
    let app = app(AppState::new_for_test().unwrap());

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/change_analysis",
            analysis_body("http://127.0.0.1:1/a.png", "http://127.0.0.1:1/b.png"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = body_json(response).await;
    assert_eq!(body["error_type"], "service_unavailable");
}

#[tokio::test]
async fn test_inference_failure_is_500() {
    let addr = spawn_image_server().await;
    let state = AppState::new_for_test()
        .unwrap()
        .with_change_analysis(ChangeAnalysisService::new(
            Arc::new(QuadrantExtractor),
            Arc::new(FailingCaption),
        ));
    let app = app(state);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/change_analysis",
            analysis_body(
                &format!("http://{}/pre.png", addr),
                &format!("http://{}/post.png", addr),
            ),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["error_type"], "internal_error");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("decoder session failed"));
}

#[tokio::test]
async fn test_missing_instruction_is_rejected() {
    let app = app(state_with_stub_models());

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/change_analysis",
            json!({"image_url_pre": "a", "image_url_post": "b"}),
        ))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}
