use serde::{Deserialize, Serialize};

use crate::affect::types::{AlertLevel, AttentionLabel, EmotionLabel, ObservedState, SessionKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertPolicy {
    /// Warn on anything other than neutral or happy.
    UnusualEmotion,
    /// Warn while distracted.
    Distracted,
}

impl AlertPolicy {
    pub fn for_kind(kind: SessionKind) -> Self {
        match kind {
            SessionKind::Emotion => Self::UnusualEmotion,
            SessionKind::Attention => Self::Distracted,
        }
    }
}

/// Stateless per call; callers decide what to do on level changes.
#[derive(Debug, Clone, Copy)]
pub struct AlertEvaluator {
    policy: AlertPolicy,
}

impl AlertEvaluator {
    pub fn new(policy: AlertPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> AlertPolicy {
        self.policy
    }

    pub fn evaluate(&self, state: &ObservedState) -> AlertLevel {
        let warn = match (self.policy, state) {
            (AlertPolicy::UnusualEmotion, ObservedState::Emotion(label)) => {
                !matches!(label, EmotionLabel::Neutral | EmotionLabel::Happy)
            }
            (AlertPolicy::Distracted, ObservedState::Attention(label)) => {
                *label == AttentionLabel::Distracted
            }
            _ => false,
        };

        if warn {
            AlertLevel::Warning
        } else {
            AlertLevel::None
        }
    }
}
