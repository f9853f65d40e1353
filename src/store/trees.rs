pub const SESSION_RECORDS: &str = "session_records";
pub const SESSION_RECORD_IDS: &str = "session_record_ids";
pub const META: &str = "_meta";
