use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// FaceMesh 输出的关键点数量（开启虹膜细化时为 478，前 468 个索引保持一致）
pub const FACE_MESH_LANDMARKS: usize = 468;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// One detector frame: index-addressed landmarks in normalized image coordinates,
/// vertical axis pointing down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkFrame {
    points: Vec<Landmark>,
}

impl LandmarkFrame {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Landmark] {
        &self.points
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSet {
    pub eyebrow_left: f64,
    pub eyebrow_right: f64,
    pub mouth_open: f64,
    pub mouth_width: f64,
    pub eye_left: f64,
    pub eye_right: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    #[default]
    Neutral,
    Happy,
    Sad,
    Angry,
    Surprised,
    Fear,
    Disgust,
}

impl EmotionLabel {
    pub const ALL: [EmotionLabel; 7] = [
        EmotionLabel::Neutral,
        EmotionLabel::Happy,
        EmotionLabel::Sad,
        EmotionLabel::Angry,
        EmotionLabel::Surprised,
        EmotionLabel::Fear,
        EmotionLabel::Disgust,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Surprised => "surprised",
            Self::Fear => "fear",
            Self::Disgust => "disgust",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Neutral => "Neutral 🙂",
            Self::Happy => "Happy 😃",
            Self::Sad => "Sad 😢",
            Self::Angry => "Angry 😡",
            Self::Surprised => "Surprised 😲",
            Self::Fear => "Fear 😨",
            Self::Disgust => "Disgust 🤢",
        }
    }

    /// Parses the label names pushed by remote inference services.
    /// Unrecognized input falls back to `Neutral`.
    pub fn from_wire(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|label| label.as_str() == normalized)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttentionLabel {
    Focused,
    Distracted,
    #[default]
    #[serde(rename = "neutral")]
    NeutralAttention,
}

impl AttentionLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Focused => "focused",
            Self::Distracted => "distracted",
            Self::NeutralAttention => "neutral",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Focused => "Focused 🎯",
            Self::Distracted => "Distracted 😵‍💫",
            Self::NeutralAttention => "Neutral 🙂",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GazeDirection {
    Left,
    Right,
    #[default]
    Center,
    Up,
    Down,
}

impl GazeDirection {
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "left" => Self::Left,
            "right" => Self::Right,
            "up" => Self::Up,
            "down" => Self::Down,
            _ => Self::Center,
        }
    }
}

/// Attention data as computed by the upstream detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttentionReading {
    pub focus_status: String,
    pub gaze: GazeDirection,
    pub blinking: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Emotion,
    Attention,
}

impl SessionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Emotion => "emotion",
            Self::Attention => "attention",
        }
    }

    /// The label shown before any observation and after teardown.
    pub fn neutral(self) -> ObservedState {
        match self {
            Self::Emotion => ObservedState::Emotion(EmotionLabel::Neutral),
            Self::Attention => ObservedState::Attention(AttentionLabel::NeutralAttention),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "axis", content = "label", rename_all = "lowercase")]
pub enum ObservedState {
    Emotion(EmotionLabel),
    Attention(AttentionLabel),
}

impl ObservedState {
    pub fn kind(&self) -> SessionKind {
        match self {
            Self::Emotion(_) => SessionKind::Emotion,
            Self::Attention(_) => SessionKind::Attention,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emotion(label) => label.as_str(),
            Self::Attention(label) => label.as_str(),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Emotion(label) => label.display_name(),
            Self::Attention(label) => label.display_name(),
        }
    }
}

impl From<EmotionLabel> for ObservedState {
    fn from(label: EmotionLabel) -> Self {
        Self::Emotion(label)
    }
}

impl From<AttentionLabel> for ObservedState {
    fn from(label: AttentionLabel) -> Self {
        Self::Attention(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub state: ObservedState,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Idle,
    Starting,
    Active,
    Stopping,
    Failed,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Active => "active",
            Self::Stopping => "stopping",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    #[default]
    None,
    Warning,
}
