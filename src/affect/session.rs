use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::affect::alert::{AlertEvaluator, AlertPolicy};
use crate::affect::classifier;
use crate::affect::features;
use crate::affect::history::HistoryBuffer;
use crate::affect::types::*;
use crate::constants::{DEFAULT_ALERT_SUSTAIN, DEFAULT_HISTORY_CAPACITY, MAX_HISTORY_CAPACITY};

/// Handle on whatever capture/transport resource feeds a session.
///
/// The controller owns it while `Active`/`Stopping` and calls `release` exactly once.
pub trait CaptureLease: Send {
    fn release(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSettings {
    pub history_capacity: usize,
    /// Consecutive warning observations required before the alert level turns to `Warning`.
    pub alert_sustain: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            alert_sustain: DEFAULT_ALERT_SUSTAIN,
        }
    }
}

impl SessionSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.history_capacity == 0 || self.history_capacity > MAX_HISTORY_CAPACITY {
            return Err(format!(
                "history_capacity must be in [1,{MAX_HISTORY_CAPACITY}]"
            ));
        }
        if self.alert_sustain == 0 {
            return Err("alert_sustain must be >= 1".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IgnoreReason {
    NoFace,
    MalformedFrame,
    SessionInactive,
    WrongAxis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ObserveOutcome {
    #[serde(rename_all = "camelCase")]
    Recorded {
        label: ObservedState,
        history_changed: bool,
        alert: AlertLevel,
        alert_changed: bool,
        activated: bool,
    },
    Ignored { reason: IgnoreReason },
}

impl ObserveOutcome {
    pub fn ignored(reason: IgnoreReason) -> Self {
        Self::Ignored { reason }
    }

    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded { .. })
    }

    /// Whether anything a presentation layer displays changed.
    pub fn is_visible_change(&self) -> bool {
        match self {
            Self::Recorded {
                history_changed,
                alert_changed,
                activated,
                ..
            } => *history_changed || *alert_changed || *activated,
            Self::Ignored { .. } => false,
        }
    }

    pub fn alert_changed(&self) -> bool {
        matches!(self, Self::Recorded { alert_changed: true, .. })
    }
}

/// Turns one detector frame into an emotion label, or the reason it carries none.
///
/// `None` and an empty landmark list both mean no face was detected. Pure, so callers
/// run it before taking a session lock.
pub fn classify_frame(frame: Option<&LandmarkFrame>) -> Result<EmotionLabel, IgnoreReason> {
    let frame = match frame {
        Some(frame) if !frame.is_empty() => frame,
        _ => return Err(IgnoreReason::NoFace),
    };
    match features::extract(frame) {
        Ok(features) => Ok(classifier::classify(&features)),
        Err(e) => {
            tracing::debug!(error = %e, "frame skipped");
            Err(IgnoreReason::MalformedFrame)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunOutcome {
    Stopped,
    Failed,
}

/// Tally of one Starting→…→Idle/Failed run, handed out once the run ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub kind: SessionKind,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub observations: u64,
    pub label_counts: BTreeMap<String, u64>,
    pub alerts_raised: u64,
    pub outcome: RunOutcome,
    pub failure_reason: Option<String>,
}

#[derive(Debug, Clone)]
struct RunStats {
    started_at: DateTime<Utc>,
    observations: u64,
    label_counts: BTreeMap<String, u64>,
    alerts_raised: u64,
}

impl RunStats {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            observations: 0,
            label_counts: BTreeMap::new(),
            alerts_raised: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub session_id: String,
    pub kind: SessionKind,
    pub state: SessionState,
    pub current: ObservedState,
    pub display: String,
    pub gaze: Option<GazeDirection>,
    pub blinking: Option<bool>,
    pub alert: AlertLevel,
    pub history: Vec<HistoryEntry>,
    pub observation_count: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

pub struct SessionController {
    id: String,
    kind: SessionKind,
    state: SessionState,
    history: HistoryBuffer,
    evaluator: AlertEvaluator,
    alert: AlertLevel,
    alert_sustain: u32,
    warning_streak: u32,
    current: ObservedState,
    gaze: GazeDirection,
    blinking: bool,
    lease: Option<Box<dyn CaptureLease>>,
    observation_count: u64,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    last_activity_at: DateTime<Utc>,
    last_error: Option<String>,
    run: Option<RunStats>,
    finished_run: Option<RunSummary>,
}

impl SessionController {
    pub fn new(id: impl Into<String>, kind: SessionKind, settings: SessionSettings) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            kind,
            state: SessionState::Idle,
            history: HistoryBuffer::new(settings.history_capacity),
            evaluator: AlertEvaluator::new(AlertPolicy::for_kind(kind)),
            alert: AlertLevel::None,
            alert_sustain: settings.alert_sustain.max(1),
            warning_streak: 0,
            current: kind.neutral(),
            gaze: GazeDirection::Center,
            blinking: false,
            lease: None,
            observation_count: 0,
            created_at: now,
            started_at: None,
            last_activity_at: now,
            last_error: None,
            run: None,
            finished_run: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn current(&self) -> ObservedState {
        self.current
    }

    pub fn alert(&self) -> AlertLevel {
        self.alert
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.snapshot()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn has_lease(&self) -> bool {
        self.lease.is_some()
    }

    pub fn observation_count(&self) -> u64 {
        self.observation_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_activity_at(&self) -> DateTime<Utc> {
        self.last_activity_at
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// `Idle → Starting`. No-op in every other state.
    pub fn start(&mut self) -> bool {
        if self.state != SessionState::Idle {
            tracing::debug!(session_id = %self.id, state = self.state.as_str(), "start ignored");
            return false;
        }

        let now = Utc::now();
        self.state = SessionState::Starting;
        self.started_at = Some(now);
        self.last_activity_at = now;
        self.last_error = None;
        self.run = Some(RunStats::new(now));
        tracing::info!(session_id = %self.id, kind = self.kind.as_str(), "session starting");
        true
    }

    /// Capture acquired. Moves `Starting → Active` and takes ownership of the lease.
    ///
    /// A lease that cannot be adopted is released immediately.
    pub fn connected(&mut self, mut lease: Box<dyn CaptureLease>) -> bool {
        match self.state {
            SessionState::Starting => {
                self.lease = Some(lease);
                self.activate();
                true
            }
            SessionState::Active if self.lease.is_none() => {
                self.lease = Some(lease);
                tracing::debug!(session_id = %self.id, "capture lease attached to active session");
                false
            }
            _ => {
                tracing::warn!(
                    session_id = %self.id,
                    state = self.state.as_str(),
                    "capture connected in unexpected state, releasing"
                );
                lease.release();
                false
            }
        }
    }

    /// Capture could not be acquired. Only meaningful while `Starting`.
    pub fn acquisition_failed(&mut self, reason: &str) -> bool {
        if self.state != SessionState::Starting {
            return false;
        }
        self.enter_failed(reason);
        true
    }

    /// Fatal transport error: any state moves to `Failed`, history is kept for inspection.
    pub fn fail(&mut self, reason: &str) -> bool {
        if self.state == SessionState::Failed {
            return false;
        }
        self.enter_failed(reason);
        true
    }

    /// `Active → Stopping → Idle`, tearing down synchronously so no further input is needed.
    pub fn stop(&mut self) -> bool {
        if self.state != SessionState::Active {
            tracing::debug!(session_id = %self.id, state = self.state.as_str(), "stop ignored");
            return false;
        }

        self.state = SessionState::Stopping;
        self.release_lease();
        self.finish_run(RunOutcome::Stopped, None);
        self.clear_displayed_state();
        self.state = SessionState::Idle;
        tracing::info!(session_id = %self.id, "session stopped");
        true
    }

    /// `Failed → Idle`.
    pub fn reset(&mut self) -> bool {
        if self.state != SessionState::Failed {
            return false;
        }

        self.clear_displayed_state();
        self.last_error = None;
        self.state = SessionState::Idle;
        tracing::info!(session_id = %self.id, "session reset");
        true
    }

    pub fn observe(&mut self, observed: ObservedState) -> ObserveOutcome {
        if observed.kind() != self.kind {
            return ObserveOutcome::ignored(IgnoreReason::WrongAxis);
        }

        let activated = match self.state {
            SessionState::Active => false,
            SessionState::Starting => {
                self.activate();
                true
            }
            SessionState::Idle | SessionState::Stopping | SessionState::Failed => {
                return ObserveOutcome::ignored(IgnoreReason::SessionInactive);
            }
        };

        self.observation_count += 1;
        self.last_activity_at = Utc::now();
        self.current = observed;

        let history_changed = self.history.push(observed);

        let level = self.evaluator.evaluate(&observed);
        self.warning_streak = match level {
            AlertLevel::Warning => self.warning_streak.saturating_add(1),
            AlertLevel::None => 0,
        };
        let alert = if self.warning_streak >= self.alert_sustain {
            AlertLevel::Warning
        } else {
            AlertLevel::None
        };
        let alert_changed = alert != self.alert;
        self.alert = alert;

        if let Some(run) = self.run.as_mut() {
            run.observations += 1;
            let count = run
                .label_counts
                .entry(observed.as_str().to_string())
                .or_insert(0);
            *count += 1;
            if alert_changed && alert == AlertLevel::Warning {
                run.alerts_raised += 1;
            }
        }

        if alert_changed {
            tracing::info!(
                session_id = %self.id,
                label = observed.as_str(),
                alert = ?alert,
                "alert level changed"
            );
        }

        ObserveOutcome::Recorded {
            label: observed,
            history_changed,
            alert,
            alert_changed,
            activated,
        }
    }

    pub fn observe_attention(&mut self, reading: &AttentionReading) -> ObserveOutcome {
        let outcome = self.observe(reading.label().into());
        if outcome.is_recorded() {
            self.gaze = reading.gaze;
            self.blinking = reading.blinking;
        }
        outcome
    }

    /// Summary of the run that most recently ended, if not yet collected.
    pub fn take_finished_run(&mut self) -> Option<RunSummary> {
        self.finished_run.take()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let attention = self.kind == SessionKind::Attention;
        StatusSnapshot {
            session_id: self.id.clone(),
            kind: self.kind,
            state: self.state,
            current: self.current,
            display: self.current.display_name().to_string(),
            gaze: attention.then_some(self.gaze),
            blinking: attention.then_some(self.blinking),
            alert: self.alert,
            history: self.history.snapshot(),
            observation_count: self.observation_count,
            started_at: self.started_at,
            last_error: self.last_error.clone(),
        }
    }

    fn activate(&mut self) {
        self.state = SessionState::Active;
        self.last_activity_at = Utc::now();
        tracing::info!(session_id = %self.id, "session active");
    }

    fn enter_failed(&mut self, reason: &str) {
        let from = self.state;
        self.release_lease();
        self.state = SessionState::Failed;
        self.last_error = Some(reason.to_string());
        self.last_activity_at = Utc::now();
        self.finish_run(RunOutcome::Failed, Some(reason.to_string()));
        tracing::warn!(
            session_id = %self.id,
            from = from.as_str(),
            reason,
            "session failed"
        );
    }

    fn clear_displayed_state(&mut self) {
        self.history.clear();
        self.observation_count = 0;
        self.alert = AlertLevel::None;
        self.warning_streak = 0;
        self.current = self.kind.neutral();
        self.gaze = GazeDirection::Center;
        self.blinking = false;
        self.started_at = None;
    }

    fn release_lease(&mut self) {
        if let Some(mut lease) = self.lease.take() {
            lease.release();
        }
    }

    fn finish_run(&mut self, outcome: RunOutcome, failure_reason: Option<String>) {
        let Some(run) = self.run.take() else {
            return;
        };
        self.finished_run = Some(RunSummary {
            kind: self.kind,
            started_at: run.started_at,
            ended_at: Utc::now(),
            observations: run.observations,
            label_counts: run.label_counts,
            alerts_raised: run.alerts_raised,
            outcome,
            failure_reason,
        });
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.release_lease();
    }
}
