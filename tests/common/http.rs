use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tower::util::ServiceExt;

pub async fn request(
    app: &Router,
    method: Method,
    path: &str,
    body: Option<Value>,
    headers: &[(&str, String)],
) -> Response {
    let mut builder = Request::builder().method(method).uri(path);

    for (k, v) in headers {
        builder = builder.header(*k, v.as_str());
    }

    let req = if let Some(payload) = body {
        builder
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request body")
    } else {
        builder.body(Body::empty()).expect("empty body")
    };

    app.clone().oneshot(req).await.expect("oneshot response")
}

pub async fn response_json(resp: Response) -> (StatusCode, HeaderMap, Value) {
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body bytes");

    let json = if bytes.is_empty() {
        json!({})
    } else {
        serde_json::from_slice::<Value>(&bytes).expect("parse json body")
    };

    (status, headers, json)
}

/// Sends a request and returns `(status, json)`.
pub async fn call(app: &Router, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, _, json) = response_json(request(app, method, path, body, &[]).await).await;
    (status, json)
}

pub fn assert_json_error(body: &Value, code: &str) {
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], code);
    assert!(body.get("message").is_some());
}

pub fn assert_status_ok_json(status: StatusCode, body: &Value) {
    assert!(status.is_success(), "status {status}: {body}");
    assert_eq!(body["success"], true);
    assert!(body.get("data").is_some());
}

/// Creates a session of `kind` and returns its id.
pub async fn create_session(app: &Router, kind: &str) -> String {
    let (status, body) = call(app, Method::POST, "/api/sessions", Some(json!({ "kind": kind }))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["sessionId"]
        .as_str()
        .expect("session id")
        .to_string()
}

/// Creates a session and drives it to `active`.
pub async fn active_session(app: &Router, kind: &str) -> String {
    let id = create_session(app, kind).await;
    let (status, _) = call(app, Method::POST, &format!("/api/sessions/{id}/start"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = call(app, Method::POST, &format!("/api/sessions/{id}/connect"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["snapshot"]["state"], "active");
    id
}

pub async fn post_emotion(app: &Router, id: &str, emotion: &str) -> Value {
    let (status, body) = call(
        app,
        Method::POST,
        &format!("/api/sessions/{id}/emotion"),
        Some(json!({ "emotion": emotion })),
    )
    .await;
    assert_status_ok_json(status, &body);
    body
}

pub fn history_labels(snapshot: &Value) -> Vec<String> {
    snapshot["history"]
        .as_array()
        .expect("history array")
        .iter()
        .map(|entry| entry["state"]["label"].as_str().unwrap_or_default().to_string())
        .collect()
}
