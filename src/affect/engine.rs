use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex, RwLock};

use crate::affect::metrics::{Counter, EngineMetrics};
use crate::affect::session::{
    classify_frame, CaptureLease, IgnoreReason, ObserveOutcome, SessionController,
    SessionSettings, StatusSnapshot,
};
use crate::affect::types::*;
use crate::constants::SESSION_EVENT_CHANNEL_CAPACITY;
use crate::store::operations::session_records::SessionRecord;
use crate::store::Store;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("session not found: {0}")]
    NotFound(String),
    #[error("session limit reached ({0})")]
    SessionLimit(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePhase {
    /// Capture could not be acquired while starting.
    Acquisition,
    /// The capture/transport channel broke.
    #[default]
    Transport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionEventKind {
    Status,
    Alert,
    Removed,
}

impl SessionEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Alert => "alert",
            Self::Removed => "removed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEvent {
    pub kind: SessionEventKind,
    pub snapshot: StatusSnapshot,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub changed: bool,
    pub snapshot: StatusSnapshot,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    #[serde(flatten)]
    pub outcome: ObserveOutcome,
    pub snapshot: StatusSnapshot,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub removed: usize,
    /// Of `removed`: runs that were still waiting for capture.
    pub never_connected: usize,
    /// Of `removed`: sessions left in `Failed` without a reset.
    pub failed: usize,
}

struct EngineLease {
    session_id: String,
    metrics: Arc<EngineMetrics>,
}

impl CaptureLease for EngineLease {
    fn release(&mut self) {
        self.metrics.incr(Counter::LeasesReleased);
        tracing::debug!(session_id = %self.session_id, "capture lease released");
    }
}

type SessionHandle = Arc<Mutex<SessionController>>;

const REMOVED_WHILE_STARTING: &str = "session removed before capture connected";
const NEVER_CONNECTED: &str = "capture never connected";

/// Registry of live sessions.
///
/// Each controller sits behind its own mutex so updates for one session apply in
/// arrival order; feature extraction and classification happen before the lock.
pub struct AffectEngine {
    settings: SessionSettings,
    max_sessions: usize,
    sessions: RwLock<HashMap<String, SessionHandle>>,
    store: Arc<Store>,
    metrics: Arc<EngineMetrics>,
    events: broadcast::Sender<SessionEvent>,
}

impl AffectEngine {
    pub fn new(settings: SessionSettings, max_sessions: usize, store: Arc<Store>) -> Self {
        let (events, _) = broadcast::channel(SESSION_EVENT_CHANNEL_CAPACITY);
        Self {
            settings,
            max_sessions: max_sessions.max(1),
            sessions: RwLock::new(HashMap::new()),
            store,
            metrics: Arc::new(EngineMetrics::new()),
            events,
        }
    }

    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    pub fn metrics(&self) -> &Arc<EngineMetrics> {
        &self.metrics
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn create_session(&self, kind: SessionKind) -> Result<StatusSnapshot, EngineError> {
        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.max_sessions {
            return Err(EngineError::SessionLimit(self.max_sessions));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let controller = SessionController::new(id.clone(), kind, self.settings);
        let snapshot = controller.snapshot();
        sessions.insert(id.clone(), Arc::new(Mutex::new(controller)));
        tracing::info!(session_id = %id, kind = kind.as_str(), "session created");
        Ok(snapshot)
    }

    pub async fn list_sessions(&self) -> Vec<StatusSnapshot> {
        let handles: Vec<SessionHandle> = self.sessions.read().await.values().cloned().collect();
        let mut snapshots = Vec::with_capacity(handles.len());
        for handle in handles {
            snapshots.push(handle.lock().await.snapshot());
        }
        snapshots.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        snapshots
    }

    pub async fn snapshot(&self, id: &str) -> Result<StatusSnapshot, EngineError> {
        let handle = self.handle(id).await?;
        let session = handle.lock().await;
        Ok(session.snapshot())
    }

    pub async fn history(&self, id: &str) -> Result<Vec<HistoryEntry>, EngineError> {
        let handle = self.handle(id).await?;
        let session = handle.lock().await;
        Ok(session.history())
    }

    /// Drops a session. A running session is stopped first so its run gets archived.
    pub async fn remove_session(&self, id: &str) -> Result<StatusSnapshot, EngineError> {
        self.evict(id, REMOVED_WHILE_STARTING).await
    }

    pub async fn start(&self, id: &str) -> Result<Transition, EngineError> {
        let transition = self.transition(id, |s| s.start()).await?;
        if transition.changed {
            self.metrics.incr(Counter::SessionsStarted);
        }
        Ok(transition)
    }

    pub async fn stop(&self, id: &str) -> Result<Transition, EngineError> {
        self.transition(id, |s| s.stop()).await
    }

    pub async fn reset(&self, id: &str) -> Result<Transition, EngineError> {
        self.transition(id, |s| s.reset()).await
    }

    /// The capture collaborator reports a live connection for this session.
    pub async fn connect(&self, id: &str) -> Result<Transition, EngineError> {
        let lease = Box::new(EngineLease {
            session_id: id.to_string(),
            metrics: self.metrics.clone(),
        });
        self.transition(id, move |s| s.connected(lease)).await
    }

    pub async fn fail(
        &self,
        id: &str,
        phase: FailurePhase,
        reason: &str,
    ) -> Result<Transition, EngineError> {
        let transition = self
            .transition(id, |s| match phase {
                FailurePhase::Acquisition => s.acquisition_failed(reason),
                FailurePhase::Transport => s.fail(reason),
            })
            .await?;
        if transition.changed {
            self.metrics.incr(Counter::SessionsFailed);
        }
        Ok(transition)
    }

    pub async fn observe_frame(
        &self,
        id: &str,
        frame: Option<LandmarkFrame>,
    ) -> Result<Observation, EngineError> {
        let handle = self.handle(id).await?;
        self.metrics.incr(Counter::FramesReceived);

        let classified = classify_frame(frame.as_ref());
        match classified {
            Err(IgnoreReason::NoFace) => self.metrics.incr(Counter::FramesWithoutFace),
            Err(IgnoreReason::MalformedFrame) => self.metrics.incr(Counter::FramesMalformed),
            _ => {}
        }

        self.record_on(&handle, move |s| match classified {
            Ok(label) => s.observe(label.into()),
            Err(reason) => ObserveOutcome::ignored(reason),
        })
        .await
    }

    pub async fn observe_emotion(
        &self,
        id: &str,
        label: EmotionLabel,
    ) -> Result<Observation, EngineError> {
        self.record(id, move |s| s.observe(label.into())).await
    }

    pub async fn observe_attention(
        &self,
        id: &str,
        reading: AttentionReading,
    ) -> Result<Observation, EngineError> {
        self.record(id, move |s| s.observe_attention(&reading)).await
    }

    /// Stops every active session so its run is archived. Returns how many were stopped.
    pub async fn stop_all(&self) -> usize {
        let handles: Vec<SessionHandle> = self.sessions.read().await.values().cloned().collect();
        let mut stopped = 0;
        for handle in handles {
            let mut session = handle.lock().await;
            if session.stop() {
                self.archive_finished_run(&mut session);
                let snapshot = session.snapshot();
                self.publish(SessionEventKind::Status, &snapshot);
                stopped += 1;
            }
        }
        stopped
    }

    /// Removes sessions untouched since `idle_for` ago that are not in use: `Idle`,
    /// `Failed` without a reset, and `Starting` runs whose capture never connected.
    /// `Active` sessions are left alone.
    pub async fn sweep_stale(&self, idle_for: chrono::Duration) -> SweepReport {
        let cutoff = Utc::now() - idle_for;
        let handles: Vec<(String, SessionHandle)> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(id, handle)| (id.clone(), handle.clone()))
            .collect();

        let mut report = SweepReport::default();
        for (id, handle) in handles {
            let (state, last_activity_at) = {
                let session = handle.lock().await;
                (session.state(), session.last_activity_at())
            };
            if last_activity_at >= cutoff {
                continue;
            }
            match state {
                SessionState::Idle | SessionState::Starting | SessionState::Failed => {}
                SessionState::Active | SessionState::Stopping => continue,
            }
            if self.evict(&id, NEVER_CONNECTED).await.is_err() {
                continue;
            }
            report.removed += 1;
            match state {
                SessionState::Starting => {
                    tracing::warn!(session_id = %id, "stale session never connected, removed");
                    report.never_connected += 1;
                }
                SessionState::Failed => {
                    tracing::warn!(session_id = %id, "stale failed session removed");
                    report.failed += 1;
                }
                _ => {}
            }
        }
        report
    }

    /// Unregisters a session and ends whatever run it has, archiving it.
    /// A run still in `Starting` is closed as an acquisition failure with `starting_reason`.
    async fn evict(&self, id: &str, starting_reason: &str) -> Result<StatusSnapshot, EngineError> {
        let handle = self
            .sessions
            .write()
            .await
            .remove(id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;

        let mut session = handle.lock().await;
        if session.acquisition_failed(starting_reason) {
            self.metrics.incr(Counter::SessionsFailed);
        } else {
            session.stop();
        }
        self.archive_finished_run(&mut session);
        let snapshot = session.snapshot();
        self.publish(SessionEventKind::Removed, &snapshot);
        tracing::info!(session_id = %id, state = snapshot.state.as_str(), "session removed");
        Ok(snapshot)
    }

    async fn handle(&self, id: &str) -> Result<SessionHandle, EngineError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(id.to_string()))
    }

    async fn transition<F>(&self, id: &str, op: F) -> Result<Transition, EngineError>
    where
        F: FnOnce(&mut SessionController) -> bool,
    {
        let handle = self.handle(id).await?;
        let mut session = handle.lock().await;
        let changed = op(&mut session);
        self.archive_finished_run(&mut session);
        let snapshot = session.snapshot();
        if changed {
            self.publish(SessionEventKind::Status, &snapshot);
        }
        Ok(Transition { changed, snapshot })
    }

    async fn record<F>(&self, id: &str, op: F) -> Result<Observation, EngineError>
    where
        F: FnOnce(&mut SessionController) -> ObserveOutcome,
    {
        let handle = self.handle(id).await?;
        self.record_on(&handle, op).await
    }

    async fn record_on<F>(&self, handle: &SessionHandle, op: F) -> Result<Observation, EngineError>
    where
        F: FnOnce(&mut SessionController) -> ObserveOutcome,
    {
        let mut session = handle.lock().await;
        let outcome = op(&mut session);

        match outcome {
            ObserveOutcome::Recorded {
                alert,
                alert_changed,
                ..
            } => {
                self.metrics.incr(Counter::LabelsRecorded);
                self.metrics.mark_observation();
                if alert_changed && alert == AlertLevel::Warning {
                    self.metrics.incr(Counter::AlertsRaised);
                }
            }
            ObserveOutcome::Ignored { .. } => self.metrics.incr(Counter::ObservationsIgnored),
        }

        let snapshot = session.snapshot();
        if outcome.is_visible_change() {
            self.publish(SessionEventKind::Status, &snapshot);
        }
        if outcome.alert_changed() {
            self.publish(SessionEventKind::Alert, &snapshot);
        }
        Ok(Observation { outcome, snapshot })
    }

    fn archive_finished_run(&self, session: &mut SessionController) {
        let Some(run) = session.take_finished_run() else {
            return;
        };
        let record = SessionRecord::from_run(session.id(), run);
        match self.store.archive_session_record(&record) {
            Ok(()) => tracing::info!(
                session_id = %session.id(),
                record_id = %record.id,
                "session run archived"
            ),
            Err(e) => tracing::error!(
                session_id = %session.id(),
                error = %e,
                "failed to archive session run"
            ),
        }
    }

    fn publish(&self, kind: SessionEventKind, snapshot: &StatusSnapshot) {
        // No subscribers is fine.
        let _ = self.events.send(SessionEvent {
            kind,
            snapshot: snapshot.clone(),
        });
    }
}
