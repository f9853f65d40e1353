use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    FramesReceived,
    FramesMalformed,
    FramesWithoutFace,
    LabelsRecorded,
    ObservationsIgnored,
    AlertsRaised,
    SessionsStarted,
    SessionsFailed,
    LeasesReleased,
}

impl Counter {
    pub const ALL: [Counter; 9] = [
        Counter::FramesReceived,
        Counter::FramesMalformed,
        Counter::FramesWithoutFace,
        Counter::LabelsRecorded,
        Counter::ObservationsIgnored,
        Counter::AlertsRaised,
        Counter::SessionsStarted,
        Counter::SessionsFailed,
        Counter::LeasesReleased,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Process-wide engine counters; lock-free, relaxed ordering.
pub struct EngineMetrics {
    counters: [AtomicU64; 9],
    last_observation_at: AtomicI64,
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self {
            counters: Default::default(),
            last_observation_at: AtomicI64::new(0),
        }
    }
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr(&self, counter: Counter) {
        self.counters[counter.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self, counter: Counter) -> u64 {
        self.counters[counter.index()].load(Ordering::Relaxed)
    }

    pub fn mark_observation(&self) {
        self.last_observation_at
            .store(chrono::Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let last = self.last_observation_at.load(Ordering::Relaxed);
        MetricsSnapshot {
            frames_received: self.get(Counter::FramesReceived),
            frames_malformed: self.get(Counter::FramesMalformed),
            frames_without_face: self.get(Counter::FramesWithoutFace),
            labels_recorded: self.get(Counter::LabelsRecorded),
            observations_ignored: self.get(Counter::ObservationsIgnored),
            alerts_raised: self.get(Counter::AlertsRaised),
            sessions_started: self.get(Counter::SessionsStarted),
            sessions_failed: self.get(Counter::SessionsFailed),
            leases_released: self.get(Counter::LeasesReleased),
            last_observation_at_ms: (last > 0).then_some(last),
        }
    }

    pub fn reset(&self) {
        for counter in &self.counters {
            counter.store(0, Ordering::Relaxed);
        }
        self.last_observation_at.store(0, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub frames_received: u64,
    pub frames_malformed: u64,
    pub frames_without_face: u64,
    pub labels_recorded: u64,
    pub observations_ignored: u64,
    pub alerts_raised: u64,
    pub sessions_started: u64,
    pub sessions_failed: u64,
    pub leases_released: u64,
    pub last_observation_at_ms: Option<i64>,
}
