use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::response::{ok, paginated, AppError};
use crate::state::AppState;
use crate::validation::clamp_pagination;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_records))
        .route("/:id", get(get_record))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListRecordsQuery {
    page: Option<u64>,
    per_page: Option<u64>,
}

async fn list_records(
    Query(q): Query<ListRecordsQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let (page, per_page) = clamp_pagination(q.page, q.per_page);
    let limit = per_page as usize;
    let offset = page.saturating_sub(1).saturating_mul(per_page) as usize;

    let records = state.store().list_session_records(limit, offset)?;
    let total = state.store().count_session_records()? as u64;
    Ok(paginated(records, total, page, per_page))
}

async fn get_record(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    match state.store().get_session_record(&id) {
        Ok(Some(record)) => Ok(ok(record)),
        Ok(None) => Err(AppError::not_found("RECORD_NOT_FOUND", "Session record not found")),
        // malformed ids cannot name a stored record
        Err(crate::store::StoreError::Validation(_)) => {
            Err(AppError::not_found("RECORD_NOT_FOUND", "Session record not found"))
        }
        Err(e) => Err(e.into()),
    }
}
