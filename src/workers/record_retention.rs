use chrono::{Duration, Utc};

use crate::store::Store;

/// Drops archived session records that ended more than `retention_days` ago.
pub async fn run(store: &Store, retention_days: i64) {
    tracing::debug!("record_retention: start");
    let cutoff = Utc::now() - Duration::days(retention_days.max(1));
    match store.delete_session_records_before(cutoff.timestamp_millis()) {
        Ok(count) => tracing::info!(deleted = count, retention_days, "record_retention: done"),
        Err(e) => tracing::error!(error = %e, "record_retention failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::operations::session_records::tests::sample_record;

    #[tokio::test]
    async fn old_records_are_removed() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Store::open(tmp.path().join("retention.sled").to_str().unwrap()).unwrap();

        let now_ms = Utc::now().timestamp_millis();
        let old_ms = now_ms - Duration::days(40).num_milliseconds();
        store.archive_session_record(&sample_record("old", old_ms)).unwrap();
        store.archive_session_record(&sample_record("fresh", now_ms)).unwrap();

        run(&store, 30).await;

        assert!(store.get_session_record("old").unwrap().is_none());
        assert!(store.get_session_record("fresh").unwrap().is_some());
    }
}
