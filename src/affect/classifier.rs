//! 规则情绪分类器
//!
//! 按固定顺序评估规则，首个命中的规则决定标签；全部未命中时为 Neutral。
//! 规则顺序即冲突裁决策略，调整顺序会改变重叠区域的结果。

use crate::affect::types::{EmotionLabel, FeatureSet};

pub const SURPRISE_MOUTH_OPEN: f64 = 0.04;
pub const SURPRISE_MOUTH_WIDTH: f64 = 0.08;
pub const ANGRY_EYEBROW_MAX: f64 = 0.38;
pub const HAPPY_EYE_OPEN: f64 = 0.02;
pub const HAPPY_MOUTH_OPEN: f64 = 0.02;
pub const SAD_MOUTH_OPEN: f64 = 0.02;
pub const SAD_EYEBROW_MIN: f64 = 0.42;

pub struct Rule {
    pub name: &'static str,
    pub label: EmotionLabel,
    matches: fn(&FeatureSet) -> bool,
}

impl Rule {
    pub fn matches(&self, features: &FeatureSet) -> bool {
        (self.matches)(features)
    }
}

fn surprised(f: &FeatureSet) -> bool {
    f.mouth_open > SURPRISE_MOUTH_OPEN && f.mouth_width > SURPRISE_MOUTH_WIDTH
}

fn angry(f: &FeatureSet) -> bool {
    f.eyebrow_left < ANGRY_EYEBROW_MAX && f.eyebrow_right < ANGRY_EYEBROW_MAX
}

// "mouth height" in the happy rule is the same lip difference as mouth_open.
fn happy(f: &FeatureSet) -> bool {
    f.eye_left > HAPPY_EYE_OPEN && f.eye_right > HAPPY_EYE_OPEN && f.mouth_open > HAPPY_MOUTH_OPEN
}

fn sad(f: &FeatureSet) -> bool {
    f.mouth_open > SAD_MOUTH_OPEN
        && f.eyebrow_left > SAD_EYEBROW_MIN
        && f.eyebrow_right > SAD_EYEBROW_MIN
}

const RULES: [Rule; 4] = [
    Rule {
        name: "surprised",
        label: EmotionLabel::Surprised,
        matches: surprised,
    },
    Rule {
        name: "angry",
        label: EmotionLabel::Angry,
        matches: angry,
    },
    Rule {
        name: "happy",
        label: EmotionLabel::Happy,
        matches: happy,
    },
    Rule {
        name: "sad",
        label: EmotionLabel::Sad,
        matches: sad,
    },
];

pub fn rules() -> &'static [Rule] {
    &RULES
}

/// First rule that matches, if any.
pub fn matching_rule(features: &FeatureSet) -> Option<&'static Rule> {
    RULES.iter().find(|rule| rule.matches(features))
}

pub fn classify(features: &FeatureSet) -> EmotionLabel {
    matching_rule(features)
        .map(|rule| rule.label)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(
        mouth_open: f64,
        mouth_width: f64,
        eyebrow: f64,
        eye: f64,
    ) -> FeatureSet {
        FeatureSet {
            eyebrow_left: eyebrow,
            eyebrow_right: eyebrow,
            mouth_open,
            mouth_width,
            eye_left: eye,
            eye_right: eye,
        }
    }

    #[test]
    fn wide_open_mouth_is_surprised() {
        assert_eq!(
            classify(&features(0.05, 0.09, 0.5, 0.01)),
            EmotionLabel::Surprised
        );
    }

    #[test]
    fn low_eyebrows_are_angry() {
        assert_eq!(classify(&features(0.0, 0.0, 0.3, 0.0)), EmotionLabel::Angry);
    }

    #[test]
    fn surprise_wins_over_happy_when_both_match() {
        let f = features(0.05, 0.09, 0.40, 0.03);
        assert!(happy(&f));
        assert_eq!(classify(&f), EmotionLabel::Surprised);
    }

    #[test]
    fn angry_wins_over_happy_when_both_match() {
        let f = features(0.03, 0.0, 0.30, 0.03);
        assert!(happy(&f));
        assert_eq!(classify(&f), EmotionLabel::Angry);
    }

    #[test]
    fn happy_wins_over_sad_when_both_match() {
        let f = features(0.03, 0.0, 0.45, 0.03);
        assert!(sad(&f));
        assert_eq!(classify(&f), EmotionLabel::Happy);
    }

    #[test]
    fn raised_eyebrows_with_open_mouth_are_sad() {
        assert_eq!(classify(&features(0.03, 0.0, 0.45, 0.0)), EmotionLabel::Sad);
    }

    #[test]
    fn thresholds_are_strict() {
        // exactly on the boundary matches nothing
        assert_eq!(
            classify(&features(0.04, 0.08, 0.38, 0.02)),
            EmotionLabel::Neutral
        );
    }

    #[test]
    fn unmatched_features_are_neutral() {
        assert_eq!(classify(&features(0.0, 0.0, 0.40, 0.0)), EmotionLabel::Neutral);
        assert!(matching_rule(&features(0.0, 0.0, 0.40, 0.0)).is_none());
    }

    #[test]
    fn nan_features_fall_through_to_neutral() {
        let f = features(f64::NAN, f64::NAN, f64::NAN, f64::NAN);
        assert_eq!(classify(&f), EmotionLabel::Neutral);
    }

    #[test]
    fn rule_table_order_is_fixed() {
        let names: Vec<&str> = rules().iter().map(|r| r.name).collect();
        assert_eq!(names, ["surprised", "angry", "happy", "sad"]);
    }
}
