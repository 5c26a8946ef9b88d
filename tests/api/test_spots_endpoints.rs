// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! GET/POST /api/v1/spots

use axum::http::StatusCode;
use pulseview::api::AppState;
use serde_json::json;
use tower::ServiceExt; // for `oneshot`

use super::support::{app, body_json, get_request, json_request};

async fn create(app: &axum::Router, name: &str, lat: f64, lon: f64) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/spots",
            json!({"name": name, "category": "landmark", "latitude": lat, "longitude": lon}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

#[tokio::test]
async fn test_create_returns_record_with_id() {
    let app = app(AppState::new_for_test().unwrap());

    let created = create(&app, "Brandenburg Gate", 52.516275, 13.377704).await;

    assert!(created["id"].as_i64().unwrap() > 0);
    assert_eq!(created["name"], "Brandenburg Gate");
    assert_eq!(created["category"], "landmark");
    assert_eq!(created["latitude"], 52.516275);
    assert_eq!(created["longitude"], 13.377704);
}

#[tokio::test]
async fn test_create_then_list_round_trips_coordinates() {
    let app = app(AppState::new_for_test().unwrap());
    create(&app, "Shibuya Crossing", 35.659482, 139.700553).await;

    let response = app.oneshot(get_request("/api/v1/spots")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let spots = body_json(response).await;
    let spots = spots.as_array().unwrap();
    assert_eq!(spots.len(), 1);
    assert_eq!(spots[0]["latitude"], 35.659482);
    assert_eq!(spots[0]["longitude"], 139.700553);
}

#[tokio::test]
async fn test_skip_excludes_first_spot() {
    let app = app(AppState::new_for_test().unwrap());
    create(&app, "first", 1.0, 1.0).await;
    create(&app, "second", 2.0, 2.0).await;
    create(&app, "third", 3.0, 3.0).await;

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/spots?skip=1"))
        .await
        .unwrap();
    let names: Vec<String> = body_json(response)
        .await
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["second", "third"]);

    let response = app
        .oneshot(get_request("/api/v1/spots?skip=0&limit=2"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_negative_skip_is_rejected() {
    let app = app(AppState::new_for_test().unwrap());

    let response = app
        .oneshot(get_request("/api/v1/spots?skip=-1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_with_missing_field_is_rejected() {
    let app = app(AppState::new_for_test().unwrap());

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/spots",
            json!({"name": "nowhere", "category": "x", "latitude": 1.0}),
        ))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_concurrent_creates_get_distinct_ids() {
    let app = app(AppState::new_for_test().unwrap());

    let requests = (0..8).map(|i| {
        let app = app.clone();
        async move { create(&app, &format!("spot-{}", i), i as f64, i as f64).await }
    });
    let created = futures::future::join_all(requests).await;

    let mut ids: Vec<i64> = created.iter().map(|s| s["id"].as_i64().unwrap()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 8);
}
