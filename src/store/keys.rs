use crate::store::StoreError;

const MAX_ID_LEN: usize = 128;

fn reverse_ts(timestamp_ms: i64) -> u64 {
    u64::MAX - timestamp_ms.max(0) as u64
}

fn validate_id(id: &str) -> Result<(), StoreError> {
    if id.is_empty() || id.len() > MAX_ID_LEN || id.contains(':') {
        return Err(StoreError::Validation(format!("invalid key segment: {id:?}")));
    }
    Ok(())
}

/// Newest-first key: `{reverse_ts:020}:{record_id}`.
pub fn session_record_key(ended_at_ms: i64, record_id: &str) -> Result<String, StoreError> {
    validate_id(record_id)?;
    Ok(format!("{:020}:{}", reverse_ts(ended_at_ms), record_id))
}

/// First key whose record ended strictly before `cutoff_ms`, or `None` when nothing can be older.
pub fn session_records_before_key(cutoff_ms: i64) -> Option<String> {
    if cutoff_ms <= 0 {
        return None;
    }
    Some(format!("{:020}", reverse_ts(cutoff_ms) + 1))
}

pub fn session_record_id_key(record_id: &str) -> Result<String, StoreError> {
    validate_id(record_id)?;
    Ok(record_id.to_string())
}
