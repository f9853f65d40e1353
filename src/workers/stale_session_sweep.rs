use chrono::Duration;

use crate::affect::AffectEngine;
use crate::constants::STALE_SESSION_MINUTES;

pub async fn run(engine: &AffectEngine) {
    tracing::debug!("stale_session_sweep: start");
    let report = engine
        .sweep_stale(Duration::minutes(STALE_SESSION_MINUTES))
        .await;
    if report.removed > 0 {
        tracing::info!(
            removed = report.removed,
            never_connected = report.never_connected,
            failed = report.failed,
            "stale_session_sweep: done"
        );
    } else {
        tracing::debug!("stale_session_sweep: nothing to do");
    }
}
