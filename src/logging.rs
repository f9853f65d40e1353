use std::path::Path;

use thiserror::Error;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::Config;

const LOG_FILE_PREFIX: &str = "emotion-backend";
const MAX_LOG_FILES: usize = 30;

// sled 和 tower-http 在 debug 级别下输出过多，默认压到 warn/info
const QUIET_DIRECTIVES: [&str; 2] = ["sled=warn", "tower_http=info"];

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            enable_file_logs: false,
            log_dir: "./logs".to_string(),
        }
    }
}

impl From<&Config> for LogConfig {
    fn from(config: &Config) -> Self {
        Self {
            log_level: config.log_level.clone(),
            enable_file_logs: config.enable_file_logs,
            log_dir: config.log_dir.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create log appender in {dir}: {message}")]
    Appender { dir: String, message: String },
    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}

/// `RUST_LOG` wins over the configured level when set.
pub fn build_filter(log_level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    QUIET_DIRECTIVES
        .iter()
        .filter_map(|directive| directive.parse::<Directive>().ok())
        .fold(EnvFilter::new(log_level), EnvFilter::add_directive)
}

fn file_appender(dir: &str) -> Result<RollingFileAppender, LoggingError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(Path::new(dir))
        .map_err(|e| LoggingError::Appender {
            dir: dir.to_string(),
            message: e.to_string(),
        })
}

/// Installs the global subscriber. A subscriber that is already installed
/// (tests, repeated calls) is not an error.
pub fn init_tracing(config: &LogConfig) -> Result<(), LoggingError> {
    let stdout_layer = fmt::layer().with_target(true).with_thread_ids(false);
    let registry = Registry::default()
        .with(build_filter(&config.log_level))
        .with(stdout_layer);

    let installed = if config.enable_file_logs {
        let file_layer = fmt::layer()
            .with_writer(file_appender(&config.log_dir)?)
            .with_ansi(false)
            .json();
        registry.with(file_layer).try_init()
    } else {
        registry.try_init()
    };

    match installed {
        Ok(()) => Ok(()),
        Err(e) if e.to_string().contains("already been set") => Ok(()),
        Err(e) => Err(LoggingError::Install(e.to_string())),
    }
}
