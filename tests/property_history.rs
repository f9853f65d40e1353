use proptest::prelude::*;

use emotion_backend::affect::alert::{AlertEvaluator, AlertPolicy};
use emotion_backend::affect::types::{AlertLevel, EmotionLabel, ObservedState};
use emotion_backend::affect::HistoryBuffer;

fn emotion() -> impl Strategy<Value = EmotionLabel> {
    prop::sample::select(EmotionLabel::ALL.to_vec())
}

/// Collapse runs, newest first, keep `capacity`.
fn reference_history(labels: &[EmotionLabel], capacity: usize) -> Vec<ObservedState> {
    let mut out: Vec<ObservedState> = Vec::new();
    for label in labels {
        let state = ObservedState::Emotion(*label);
        if out.first() != Some(&state) {
            out.insert(0, state);
        }
        out.truncate(capacity);
    }
    out
}

proptest! {
    #[test]
    fn pt_history_matches_reference_model(
        labels in prop::collection::vec(emotion(), 0..60),
        capacity in 1_usize..8,
    ) {
        let mut history = HistoryBuffer::new(capacity);
        for label in &labels {
            history.push((*label).into());
        }
        prop_assert_eq!(history.states(), reference_history(&labels, capacity));
    }

    #[test]
    fn pt_history_has_no_adjacent_duplicates(
        labels in prop::collection::vec(emotion(), 0..60),
    ) {
        let mut history = HistoryBuffer::new(5);
        for label in &labels {
            history.push((*label).into());
        }
        let states = history.states();
        prop_assert!(states.len() <= 5);
        for pair in states.windows(2) {
            prop_assert_ne!(pair[0], pair[1]);
        }
        if let Some(last) = labels.last() {
            prop_assert_eq!(history.newest(), Some(ObservedState::Emotion(*last)));
        }
    }

    #[test]
    fn pt_alert_depends_only_on_current_label(label in emotion()) {
        let evaluator = AlertEvaluator::new(AlertPolicy::UnusualEmotion);
        let expected = if matches!(label, EmotionLabel::Neutral | EmotionLabel::Happy) {
            AlertLevel::None
        } else {
            AlertLevel::Warning
        };
        prop_assert_eq!(evaluator.evaluate(&label.into()), expected);
    }
}
