//! 面部几何特征提取
//!
//! 从 FaceMesh 关键点中提取分类器使用的标量特征。坐标为归一化图像坐标，
//! 纵轴向下递增。公式与上游前端保持一致，不做符号修正。

use thiserror::Error;

use crate::affect::types::{FeatureSet, LandmarkFrame, FACE_MESH_LANDMARKS};

const LEFT_EYEBROW: usize = 70;
const RIGHT_EYEBROW: usize = 300;
const UPPER_LIP: usize = 13;
const LOWER_LIP: usize = 14;
const LEFT_EYE_UPPER: usize = 159;
const LEFT_EYE_LOWER: usize = 145;
const RIGHT_EYE_UPPER: usize = 386;
const RIGHT_EYE_LOWER: usize = 374;
const MOUTH_LEFT: usize = 61;
const MOUTH_RIGHT: usize = 291;

const USED_INDICES: [usize; 10] = [
    LEFT_EYEBROW,
    RIGHT_EYEBROW,
    UPPER_LIP,
    LOWER_LIP,
    LEFT_EYE_UPPER,
    LEFT_EYE_LOWER,
    RIGHT_EYE_UPPER,
    RIGHT_EYE_LOWER,
    MOUTH_LEFT,
    MOUTH_RIGHT,
];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedFrame {
    #[error("malformed frame: expected {expected} landmarks, got {actual}")]
    MissingLandmarks { expected: usize, actual: usize },
    #[error("malformed frame: landmark {index} has a non-finite coordinate")]
    NonFiniteCoordinate { index: usize },
}

/// Derives the classifier features from a full landmark frame.
///
/// Partial frames are rejected rather than classified from whatever indices happen
/// to be present.
pub fn extract(frame: &LandmarkFrame) -> Result<FeatureSet, MalformedFrame> {
    if frame.len() < FACE_MESH_LANDMARKS {
        return Err(MalformedFrame::MissingLandmarks {
            expected: FACE_MESH_LANDMARKS,
            actual: frame.len(),
        });
    }

    let points = frame.points();
    if let Some(&index) = USED_INDICES.iter().find(|&&i| !points[i].is_finite()) {
        return Err(MalformedFrame::NonFiniteCoordinate { index });
    }

    Ok(FeatureSet {
        eyebrow_left: points[LEFT_EYEBROW].y,
        eyebrow_right: points[RIGHT_EYEBROW].y,
        mouth_open: points[UPPER_LIP].y - points[LOWER_LIP].y,
        eye_left: points[LEFT_EYE_UPPER].y - points[LEFT_EYE_LOWER].y,
        eye_right: points[RIGHT_EYE_UPPER].y - points[RIGHT_EYE_LOWER].y,
        mouth_width: points[MOUTH_LEFT].x - points[MOUTH_RIGHT].x,
    })
}
