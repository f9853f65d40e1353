mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::app::spawn_test_app;
use common::http::{active_session, assert_json_error, assert_status_ok_json, call, post_emotion};

#[tokio::test]
async fn it_stopped_run_becomes_a_record() {
    let app = spawn_test_app().await;
    let id = active_session(&app.app, "emotion").await;
    for emotion in ["happy", "sad", "sad", "angry"] {
        post_emotion(&app.app, &id, emotion).await;
    }
    call(&app.app, Method::POST, &format!("/api/sessions/{id}/stop"), None).await;

    let (status, body) = call(&app.app, Method::GET, "/api/records", None).await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["total"], 1);
    let record = &body["data"]["data"][0];
    assert_eq!(record["sessionId"], id);
    assert_eq!(record["kind"], "emotion");
    assert_eq!(record["outcome"], "stopped");
    assert_eq!(record["observations"], 4);
    assert_eq!(record["labelCounts"], json!({ "angry": 1, "happy": 1, "sad": 2 }));
    assert_eq!(record["alertsRaised"], 1);

    let record_id = record["id"].as_str().unwrap().to_string();
    let (status, body) = call(&app.app, Method::GET, &format!("/api/records/{record_id}"), None).await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["id"], record_id);
}

#[tokio::test]
async fn it_failed_run_records_reason() {
    let app = spawn_test_app().await;
    let id = active_session(&app.app, "attention").await;
    call(
        &app.app,
        Method::POST,
        &format!("/api/sessions/{id}/fail"),
        Some(json!({ "reason": "websocket dropped", "phase": "transport" })),
    )
    .await;

    let (_, body) = call(&app.app, Method::GET, "/api/records", None).await;
    let record = &body["data"]["data"][0];
    assert_eq!(record["outcome"], "failed");
    assert_eq!(record["failureReason"], "websocket dropped");
}

#[tokio::test]
async fn it_records_are_paginated_newest_first() {
    let app = spawn_test_app().await;
    let id = active_session(&app.app, "emotion").await;
    call(&app.app, Method::POST, &format!("/api/sessions/{id}/stop"), None).await;
    for _ in 0..2 {
        call(&app.app, Method::POST, &format!("/api/sessions/{id}/start"), None).await;
        call(&app.app, Method::POST, &format!("/api/sessions/{id}/connect"), None).await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        call(&app.app, Method::POST, &format!("/api/sessions/{id}/stop"), None).await;
    }

    let (_, body) = call(&app.app, Method::GET, "/api/records?page=1&perPage=2", None).await;
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["totalPages"], 2);
    assert_eq!(body["data"]["data"].as_array().unwrap().len(), 2);

    let first = body["data"]["data"][0]["endedAt"].as_str().unwrap().to_string();
    let second = body["data"]["data"][1]["endedAt"].as_str().unwrap().to_string();
    assert!(first >= second);

    let (_, body) = call(&app.app, Method::GET, "/api/records?page=2&perPage=2", None).await;
    assert_eq!(body["data"]["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn it_unknown_record_is_not_found() {
    let app = spawn_test_app().await;
    for id in ["missing-record", "bad:id"] {
        let (status, body) = call(&app.app, Method::GET, &format!("/api/records/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_json_error(&body, "RECORD_NOT_FOUND");
    }
}
