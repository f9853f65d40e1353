pub mod record_retention;
pub mod stale_session_sweep;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::affect::AffectEngine;
use crate::config::WorkerConfig;
use crate::store::Store;

/// Timeout for individual worker invocations (5 minutes).
const WORKER_TIMEOUT: Duration = Duration::from_secs(300);

/// Drain period before scheduler shutdown to let in-flight tasks complete.
#[cfg(test)]
const DRAIN_TIMEOUT: Duration = Duration::from_millis(10);
#[cfg(not(test))]
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerName {
    RecordRetention,
    StaleSessionSweep,
}

impl WorkerName {
    pub const ALL: [WorkerName; 2] = [WorkerName::RecordRetention, WorkerName::StaleSessionSweep];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RecordRetention => "record_retention",
            Self::StaleSessionSweep => "stale_session_sweep",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub name: WorkerName,
    pub cron: &'static str,
    pub enabled: bool,
}

pub struct WorkerManager {
    store: Arc<Store>,
    engine: Arc<AffectEngine>,
    shutdown_rx: broadcast::Receiver<()>,
    config: WorkerConfig,
}

impl WorkerManager {
    pub fn new(
        store: Arc<Store>,
        engine: Arc<AffectEngine>,
        shutdown_rx: broadcast::Receiver<()>,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            store,
            engine,
            shutdown_rx,
            config: config.clone(),
        }
    }

    /// Single source of truth for all planned jobs and their cron schedules.
    pub fn planned_jobs(&self) -> Vec<JobSpec> {
        if !self.config.is_leader {
            return Vec::new();
        }

        vec![
            JobSpec {
                name: WorkerName::RecordRetention,
                cron: "0 0 * * * *",
                enabled: true,
            },
            JobSpec {
                name: WorkerName::StaleSessionSweep,
                cron: "0 * * * * *",
                enabled: true,
            },
        ]
    }

    /// Start the worker scheduler. Returns an error if the scheduler cannot be created or started.
    pub async fn start(mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if !self.config.is_leader {
            tracing::info!("Worker leader disabled; skipping worker startup");
            return Ok(());
        }

        let mut scheduler = JobScheduler::new().await?;
        self.register_jobs(&scheduler).await;
        scheduler.start().await?;

        tracing::info!("Worker manager started");
        let _ = self.shutdown_rx.recv().await;

        tracing::info!(
            "Worker manager shutting down, draining for {}s",
            DRAIN_TIMEOUT.as_secs()
        );
        tokio::time::sleep(DRAIN_TIMEOUT).await;
        let _ = scheduler.shutdown().await;
        Ok(())
    }

    async fn register_jobs(&self, scheduler: &JobScheduler) {
        for spec in self.planned_jobs() {
            if !spec.enabled {
                tracing::info!(name = spec.name.as_str(), "Skipping disabled worker");
                continue;
            }

            let name_str = spec.name.as_str();
            match spec.name {
                WorkerName::RecordRetention => {
                    let store = self.store.clone();
                    let retention_days = self.config.record_retention_days;
                    add_job(scheduler, spec.cron, name_str, move || {
                        let store = store.clone();
                        async move {
                            record_retention::run(&store, retention_days).await;
                        }
                    })
                    .await;
                }
                WorkerName::StaleSessionSweep => {
                    let engine = self.engine.clone();
                    add_job(scheduler, spec.cron, name_str, move || {
                        let engine = engine.clone();
                        async move {
                            stale_session_sweep::run(&engine).await;
                        }
                    })
                    .await;
                }
            }
            tracing::info!(name = name_str, cron = spec.cron, "Registered worker");
        }
    }
}

/// Add a job to the scheduler with an overlap guard and timeout wrapper.
async fn add_job<Fut, F>(scheduler: &JobScheduler, cron: &str, name: &'static str, mut run: F)
where
    F: FnMut() -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let running = Arc::new(AtomicBool::new(false));

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let guard = running.clone();

        if guard
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!(
                worker = name,
                "Skipping worker invocation: previous run still in progress"
            );
            return Box::pin(async {});
        }

        let fut = run();
        Box::pin(async move {
            if tokio::time::timeout(WORKER_TIMEOUT, fut).await.is_err() {
                tracing::error!(
                    worker = name,
                    timeout_secs = WORKER_TIMEOUT.as_secs(),
                    "Worker timed out"
                );
            }
            guard.store(false, Ordering::SeqCst);
        })
    });

    match job {
        Ok(job) => {
            if let Err(err) = scheduler.add(job).await {
                tracing::error!(error=%err, cron, worker = name, "Failed to add worker job");
            }
        }
        Err(err) => tracing::error!(error=%err, cron, worker = name, "Failed to create worker job"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::broadcast;

    use crate::affect::SessionSettings;
    use crate::config::Config;
    use crate::store::Store;

    use super::*;

    fn manager(tmp: &tempfile::TempDir, is_leader: bool) -> WorkerManager {
        let cfg = Config::from_env();
        let store = Arc::new(Store::open(tmp.path().join("worker.sled").to_str().unwrap()).unwrap());
        let engine = Arc::new(AffectEngine::new(SessionSettings::default(), 4, store.clone()));
        let (tx, _) = broadcast::channel(2);

        let mut worker_cfg = cfg.worker.clone();
        worker_cfg.is_leader = is_leader;
        WorkerManager::new(store, engine, tx.subscribe(), &worker_cfg)
    }

    #[tokio::test]
    async fn leader_switch_controls_job_registration() {
        let tmp = tempfile::tempdir().expect("tempdir");
        assert!(manager(&tmp, false).planned_jobs().is_empty());
    }

    #[tokio::test]
    async fn leader_plans_every_worker() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let jobs = manager(&tmp, true).planned_jobs();
        for name in WorkerName::ALL {
            let spec = jobs.iter().find(|j| j.name == name).expect("planned");
            assert!(spec.enabled, "{name:?} should be enabled");
            assert_eq!(spec.cron.split_whitespace().count(), 6, "{name:?} cron");
        }
    }

    #[tokio::test]
    async fn non_leader_start_returns_immediately() {
        let tmp = tempfile::tempdir().expect("tempdir");
        manager(&tmp, false)
            .start()
            .await
            .expect("non-leader start should succeed");
    }

    #[test]
    fn worker_names_are_unique() {
        let names: std::collections::HashSet<&str> =
            WorkerName::ALL.iter().map(|n| n.as_str()).collect();
        assert_eq!(names.len(), WorkerName::ALL.len());
    }
}
