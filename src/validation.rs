//! 请求参数校验

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MAX_REASON_LEN};

/// Failure reasons are free text, stored and echoed back; keep them short and printable.
pub fn validate_reason(reason: &str) -> Result<&str, &'static str> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return Err("reason must not be empty");
    }
    if trimmed.chars().count() > MAX_REASON_LEN {
        return Err("reason is too long");
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err("reason must not contain control characters");
    }
    Ok(trimmed)
}

/// Session ids are server-issued UUIDs; anything else cannot exist.
pub fn is_valid_session_id(id: &str) -> bool {
    uuid::Uuid::parse_str(id).is_ok()
}

/// Normalizes 1-based `page` and `per_page` query values.
pub fn clamp_pagination(page: Option<u64>, per_page: Option<u64>) -> (u64, u64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (page, per_page)
}
