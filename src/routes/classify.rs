use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::affect::classifier;
use crate::affect::features;
use crate::affect::types::{EmotionLabel, FeatureSet, LandmarkFrame};
use crate::extractors::JsonBody;
use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(classify_frame))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassifyRequest {
    landmarks: LandmarkFrame,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClassifyResponse {
    label: EmotionLabel,
    display: &'static str,
    /// Name of the rule that fired; absent when the neutral fallback applied.
    rule: Option<&'static str>,
    features: FeatureSet,
}

/// Stateless: extracts features from one frame and reports the label without touching any session.
async fn classify_frame(
    JsonBody(req): JsonBody<ClassifyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let features = features::extract(&req.landmarks)
        .map_err(|e| AppError::bad_request("MALFORMED_FRAME", &e.to_string()))?;
    let rule = classifier::matching_rule(&features);
    let label = rule.map(|r| r.label).unwrap_or_default();

    Ok(ok(ClassifyResponse {
        label,
        display: label.display_name(),
        rule: rule.map(|r| r.name),
        features,
    }))
}
