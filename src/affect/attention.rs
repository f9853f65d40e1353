use crate::affect::types::{AttentionLabel, AttentionReading};

/// Normalizes an upstream focus status into the closed label set.
///
/// Matching is a case-sensitive substring test, so "Unfocused" is not `Focused`.
/// Anything unrecognized is `NeutralAttention`; this never fails.
pub fn classify_focus(status: &str) -> AttentionLabel {
    if status.contains("Focused") {
        AttentionLabel::Focused
    } else if status.contains("Distracted") {
        AttentionLabel::Distracted
    } else {
        AttentionLabel::NeutralAttention
    }
}

impl AttentionReading {
    pub fn label(&self) -> AttentionLabel {
        classify_focus(&self.focus_status)
    }
}
