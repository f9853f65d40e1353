use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use crate::affect::engine::FailurePhase;
use crate::affect::types::{
    AttentionReading, EmotionLabel, GazeDirection, LandmarkFrame, SessionKind,
};
use crate::extractors::JsonBody;
use crate::response::{created, ok, AppError};
use crate::state::AppState;
use crate::validation::{is_valid_session_id, validate_reason};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sessions).post(create_session))
        .route("/:id", get(get_session).delete(delete_session))
        .route("/:id/start", post(start_session))
        .route("/:id/stop", post(stop_session))
        .route("/:id/reset", post(reset_session))
        .route("/:id/connect", post(connect_session))
        .route("/:id/fail", post(fail_session))
        .route("/:id/frames", post(ingest_frame))
        .route("/:id/emotion", post(ingest_emotion))
        .route("/:id/attention", post(ingest_attention))
        .route("/:id/history", get(get_history))
}

fn session_id(id: String) -> Result<String, AppError> {
    if is_valid_session_id(&id) {
        Ok(id)
    } else {
        Err(AppError::not_found(
            "SESSION_NOT_FOUND",
            &format!("session not found: {id}"),
        ))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionRequest {
    kind: SessionKind,
}

async fn create_session(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = state.engine().create_session(req.kind).await?;
    Ok(created(snapshot))
}

async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    ok(state.engine().list_sessions().await)
}

async fn get_session(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let id = session_id(id)?;
    Ok(ok(state.engine().snapshot(&id).await?))
}

async fn delete_session(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let id = session_id(id)?;
    Ok(ok(state.engine().remove_session(&id).await?))
}

async fn get_history(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let id = session_id(id)?;
    Ok(ok(state.engine().history(&id).await?))
}

async fn start_session(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let id = session_id(id)?;
    Ok(ok(state.engine().start(&id).await?))
}

async fn stop_session(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let id = session_id(id)?;
    Ok(ok(state.engine().stop(&id).await?))
}

async fn reset_session(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let id = session_id(id)?;
    Ok(ok(state.engine().reset(&id).await?))
}

async fn connect_session(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let id = session_id(id)?;
    Ok(ok(state.engine().connect(&id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FailRequest {
    reason: String,
    #[serde(default)]
    phase: FailurePhase,
}

async fn fail_session(
    Path(id): Path<String>,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<FailRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = session_id(id)?;
    let reason =
        validate_reason(&req.reason).map_err(|msg| AppError::bad_request("INVALID_REASON", msg))?;
    Ok(ok(state.engine().fail(&id, req.phase, reason).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FrameRequest {
    /// `null` when the detector saw no face.
    #[serde(default)]
    landmarks: Option<LandmarkFrame>,
}

async fn ingest_frame(
    Path(id): Path<String>,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<FrameRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = session_id(id)?;
    Ok(ok(state.engine().observe_frame(&id, req.landmarks).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmotionRequest {
    emotion: String,
}

async fn ingest_emotion(
    Path(id): Path<String>,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<EmotionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = session_id(id)?;
    let label = EmotionLabel::from_wire(&req.emotion);
    Ok(ok(state.engine().observe_emotion(&id, label).await?))
}

/// Blink flag as sent by detectors: either a boolean or the strings "Yes"/"No".
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BlinkFlag {
    Flag(bool),
    Text(String),
}

impl BlinkFlag {
    fn is_blinking(&self) -> bool {
        match self {
            Self::Flag(flag) => *flag,
            Self::Text(text) => text.trim().eq_ignore_ascii_case("yes"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttentionRequest {
    focus_status: String,
    #[serde(default)]
    gaze_direction: Option<String>,
    #[serde(default)]
    blinking: Option<BlinkFlag>,
}

impl From<AttentionRequest> for AttentionReading {
    fn from(req: AttentionRequest) -> Self {
        Self {
            gaze: req
                .gaze_direction
                .as_deref()
                .map(GazeDirection::from_wire)
                .unwrap_or_default(),
            blinking: req.blinking.as_ref().is_some_and(BlinkFlag::is_blinking),
            focus_status: req.focus_status,
        }
    }
}

async fn ingest_attention(
    Path(id): Path<String>,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<AttentionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = session_id(id)?;
    Ok(ok(state
        .engine()
        .observe_attention(&id, req.into())
        .await?))
}
