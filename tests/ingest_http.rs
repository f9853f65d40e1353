mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::app::{spawn_test_app, spawn_with, TestOptions};
use common::fixtures::{angry_landmarks, landmarks_with, neutral_landmarks};
use common::http::{
    active_session, assert_json_error, call, create_session, history_labels, post_emotion,
};

#[tokio::test]
async fn it_history_is_deduplicated_and_newest_first() {
    let app = spawn_test_app().await;
    let id = active_session(&app.app, "emotion").await;

    for emotion in ["neutral", "neutral", "sad", "sad", "angry"] {
        post_emotion(&app.app, &id, emotion).await;
    }

    let (_, body) = call(&app.app, Method::GET, &format!("/api/sessions/{id}/history"), None).await;
    let labels: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["state"]["label"].as_str().unwrap())
        .collect();
    assert_eq!(labels, vec!["angry", "sad", "neutral"]);
}

#[tokio::test]
async fn it_history_is_capped_at_five() {
    let app = spawn_test_app().await;
    let id = active_session(&app.app, "emotion").await;

    let mut last = json!({});
    for emotion in ["neutral", "happy", "sad", "angry", "surprised", "fear"] {
        last = post_emotion(&app.app, &id, emotion).await;
    }
    let labels = history_labels(&last["data"]["snapshot"]);
    assert_eq!(labels, vec!["fear", "surprised", "angry", "sad", "happy"]);
}

#[tokio::test]
async fn it_alert_tracks_unusual_emotion() {
    let app = spawn_test_app().await;
    let id = active_session(&app.app, "emotion").await;

    let body = post_emotion(&app.app, &id, "happy").await;
    assert_eq!(body["data"]["snapshot"]["alert"], "none");

    let body = post_emotion(&app.app, &id, "Sad").await;
    assert_eq!(body["data"]["outcome"], "recorded");
    assert_eq!(body["data"]["alertChanged"], true);
    assert_eq!(body["data"]["snapshot"]["alert"], "warning");
    assert_eq!(body["data"]["snapshot"]["display"], "Sad 😢");

    let body = post_emotion(&app.app, &id, "neutral").await;
    assert_eq!(body["data"]["snapshot"]["alert"], "none");
}

#[tokio::test]
async fn it_unknown_emotion_name_is_neutral() {
    let app = spawn_test_app().await;
    let id = active_session(&app.app, "emotion").await;
    let body = post_emotion(&app.app, &id, "contempt").await;
    assert_eq!(body["data"]["snapshot"]["current"]["label"], "neutral");
}

#[tokio::test]
async fn it_sustained_alert_needs_consecutive_warnings() {
    let app = spawn_with(TestOptions {
        alert_sustain: 2,
        ..TestOptions::default()
    })
    .await;
    let id = active_session(&app.app, "emotion").await;

    let body = post_emotion(&app.app, &id, "angry").await;
    assert_eq!(body["data"]["snapshot"]["alert"], "none");
    let body = post_emotion(&app.app, &id, "angry").await;
    assert_eq!(body["data"]["snapshot"]["alert"], "warning");
}

#[tokio::test]
async fn it_observation_before_start_is_ignored() {
    let app = spawn_test_app().await;
    let id = create_session(&app.app, "emotion").await;

    let body = post_emotion(&app.app, &id, "sad").await;
    assert_eq!(body["data"]["outcome"], "ignored");
    assert_eq!(body["data"]["reason"], "sessionInactive");
    assert_eq!(body["data"]["snapshot"]["state"], "idle");
}

#[tokio::test]
async fn it_first_observation_activates_starting_session() {
    let app = spawn_test_app().await;
    let id = create_session(&app.app, "emotion").await;
    call(&app.app, Method::POST, &format!("/api/sessions/{id}/start"), None).await;

    let body = post_emotion(&app.app, &id, "happy").await;
    assert_eq!(body["data"]["activated"], true);
    assert_eq!(body["data"]["snapshot"]["state"], "active");
}

#[tokio::test]
async fn it_landmark_frames_are_classified() {
    let app = spawn_test_app().await;
    let id = active_session(&app.app, "emotion").await;

    let (status, body) = call(
        &app.app,
        Method::POST,
        &format!("/api/sessions/{id}/frames"),
        Some(json!({ "landmarks": angry_landmarks() })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["outcome"], "recorded");
    assert_eq!(body["data"]["snapshot"]["current"]["label"], "angry");

    let (_, body) = call(
        &app.app,
        Method::POST,
        &format!("/api/sessions/{id}/frames"),
        Some(json!({ "landmarks": neutral_landmarks() })),
    )
    .await;
    assert_eq!(history_labels(&body["data"]["snapshot"]), vec!["neutral", "angry"]);
}

#[tokio::test]
async fn it_no_face_and_partial_frames_change_nothing() {
    let app = spawn_test_app().await;
    let id = active_session(&app.app, "emotion").await;
    post_emotion(&app.app, &id, "sad").await;

    let (_, body) = call(
        &app.app,
        Method::POST,
        &format!("/api/sessions/{id}/frames"),
        Some(json!({ "landmarks": null })),
    )
    .await;
    assert_eq!(body["data"]["outcome"], "ignored");
    assert_eq!(body["data"]["reason"], "noFace");

    let partial: Vec<serde_json::Value> = (0..20).map(|_| json!({ "x": 0.5, "y": 0.5 })).collect();
    let (status, body) = call(
        &app.app,
        Method::POST,
        &format!("/api/sessions/{id}/frames"),
        Some(json!({ "landmarks": partial })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["reason"], "malformedFrame");
    assert_eq!(body["data"]["snapshot"]["alert"], "warning");
    assert_eq!(history_labels(&body["data"]["snapshot"]), vec!["sad"]);
}

#[tokio::test]
async fn it_attention_reading_updates_gaze_and_blink() {
    let app = spawn_test_app().await;
    let id = active_session(&app.app, "attention").await;

    let (status, body) = call(
        &app.app,
        Method::POST,
        &format!("/api/sessions/{id}/attention"),
        Some(json!({ "focusStatus": "Distracted", "gazeDirection": "Left", "blinking": "Yes" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let snapshot = &body["data"]["snapshot"];
    assert_eq!(snapshot["current"]["label"], "distracted");
    assert_eq!(snapshot["gaze"], "left");
    assert_eq!(snapshot["blinking"], true);
    assert_eq!(snapshot["alert"], "warning");

    let (_, body) = call(
        &app.app,
        Method::POST,
        &format!("/api/sessions/{id}/attention"),
        Some(json!({ "focusStatus": "Focused", "gazeDirection": "center", "blinking": false })),
    )
    .await;
    assert_eq!(body["data"]["snapshot"]["alert"], "none");
    assert_eq!(body["data"]["snapshot"]["display"], "Focused 🎯");
}

#[tokio::test]
async fn it_wrong_axis_is_ignored() {
    let app = spawn_test_app().await;
    let id = active_session(&app.app, "attention").await;
    let body = post_emotion(&app.app, &id, "angry").await;
    assert_eq!(body["data"]["reason"], "wrongAxis");
    assert_eq!(body["data"]["snapshot"]["alert"], "none");
}

#[tokio::test]
async fn it_stateless_classify_reports_rule() {
    let app = spawn_test_app().await;
    let (status, body) = call(
        &app.app,
        Method::POST,
        "/api/classify",
        Some(json!({ "landmarks": angry_landmarks() })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["label"], "angry");
    assert_eq!(body["data"]["rule"], "angry");
    assert_eq!(body["data"]["display"], "Angry 😡");

    let (_, body) = call(
        &app.app,
        Method::POST,
        "/api/classify",
        Some(json!({ "landmarks": landmarks_with(&[]) })),
    )
    .await;
    assert_eq!(body["data"]["label"], "neutral");
    assert!(body["data"]["rule"].is_null());
}

#[tokio::test]
async fn it_stateless_classify_rejects_partial_frame() {
    let app = spawn_test_app().await;
    let (status, body) = call(
        &app.app,
        Method::POST,
        "/api/classify",
        Some(json!({ "landmarks": [{ "x": 0.1, "y": 0.1 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_json_error(&body, "MALFORMED_FRAME");
}

#[tokio::test]
async fn it_frames_for_unknown_session_are_not_counted() {
    let app = spawn_test_app().await;
    let (status, body) = call(
        &app.app,
        Method::POST,
        "/api/sessions/00000000-0000-4000-8000-000000000000/frames",
        Some(json!({ "landmarks": null })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_json_error(&body, "SESSION_NOT_FOUND");

    let (_, body) = call(&app.app, Method::GET, "/health/metrics", None).await;
    assert_eq!(body["engine"]["framesReceived"], 0);
    assert_eq!(body["engine"]["framesWithoutFace"], 0);
}
