use serde_json::{json, Value};

pub const LANDMARK_COUNT: usize = 468;

/// A full frame with every point at (0.5, 0.4) and the given overrides applied.
/// Unmodified, it classifies as neutral.
pub fn landmarks_with(overrides: &[(usize, f64, f64)]) -> Value {
    let mut points: Vec<Value> = (0..LANDMARK_COUNT)
        .map(|_| json!({ "x": 0.5, "y": 0.4, "z": 0.0 }))
        .collect();
    for &(index, x, y) in overrides {
        points[index] = json!({ "x": x, "y": y, "z": 0.0 });
    }
    Value::Array(points)
}

/// Both eyebrows at y = 0.30.
pub fn angry_landmarks() -> Value {
    landmarks_with(&[(70, 0.3, 0.30), (300, 0.7, 0.30)])
}

pub fn neutral_landmarks() -> Value {
    landmarks_with(&[])
}
