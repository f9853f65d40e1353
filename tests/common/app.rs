use std::sync::Arc;

use axum::Router;
use tempfile::TempDir;
use tokio::sync::broadcast;

use emotion_backend::affect::{AffectEngine, SessionSettings};
use emotion_backend::config::{Config, LimitsConfig, WorkerConfig};
use emotion_backend::routes::build_router;
use emotion_backend::state::AppState;
use emotion_backend::store::Store;

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub config: Config,
    pub shutdown_tx: broadcast::Sender<()>,
    _temp_dir: TempDir,
}

pub struct TestOptions {
    pub history_capacity: usize,
    pub alert_sustain: u32,
    pub max_sessions: usize,
    pub max_sse_connections: usize,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            history_capacity: 5,
            alert_sustain: 1,
            max_sessions: 16,
            max_sse_connections: 100,
        }
    }
}

pub async fn spawn_with(options: TestOptions) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let sled_path = temp_dir.path().join("emotion-test.sled");

    // 直接构造 Config，避免 set_var 在并行测试中互相干扰
    let config = Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 4200,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        sled_path: sled_path.to_string_lossy().to_string(),
        cors_origin: "http://localhost:5173".to_string(),
        session: SessionSettings {
            history_capacity: options.history_capacity,
            alert_sustain: options.alert_sustain,
        },
        limits: LimitsConfig {
            max_sessions: options.max_sessions,
            max_sse_connections: options.max_sse_connections,
        },
        worker: WorkerConfig {
            is_leader: false,
            record_retention_days: 30,
        },
    };

    let store = Arc::new(Store::open(&config.sled_path).expect("open store"));
    store.run_migrations().expect("run migrations");

    let engine = Arc::new(AffectEngine::new(
        config.session,
        config.limits.max_sessions,
        store.clone(),
    ));
    let (shutdown_tx, _) = broadcast::channel::<()>(8);

    let state = AppState::new(store, engine, &config, shutdown_tx.clone());
    let app = build_router(state.clone());

    TestApp {
        app,
        state,
        config,
        shutdown_tx,
        _temp_dir: temp_dir,
    }
}

pub async fn spawn_test_app() -> TestApp {
    spawn_with(TestOptions::default()).await
}
