use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::Router;
use futures::Stream;
use tokio::sync::broadcast::error::RecvError;

use crate::affect::engine::{SessionEvent, SessionEventKind};
use crate::response::AppError;
use crate::state::AppState;
use crate::validation::is_valid_session_id;

static SSE_CONNECTION_COUNT: AtomicUsize = AtomicUsize::new(0);

struct SseGuard;
impl Drop for SseGuard {
    fn drop(&mut self) {
        SSE_CONNECTION_COUNT.fetch_sub(1, Ordering::SeqCst);
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/:id/events", get(session_events))
}

pub fn active_connections() -> usize {
    SSE_CONNECTION_COUNT.load(Ordering::SeqCst)
}

fn to_sse(event: &SessionEvent) -> Option<Event> {
    let json = serde_json::to_string(&event.snapshot).ok()?;
    Some(Event::default().event(event.kind.as_str()).data(json))
}

/// Streams `status`/`alert` events for one session; the first event is the current snapshot.
pub async fn session_events(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    if !is_valid_session_id(&id) {
        return Err(AppError::not_found(
            "SESSION_NOT_FOUND",
            &format!("session not found: {id}"),
        ));
    }

    let max_sse = state.config().limits.max_sse_connections;
    let current = SSE_CONNECTION_COUNT.fetch_add(1, Ordering::SeqCst);
    if current >= max_sse {
        SSE_CONNECTION_COUNT.fetch_sub(1, Ordering::SeqCst);
        return Err(AppError::too_many_requests(
            "TOO_MANY_CONNECTIONS",
            "Too many SSE connections",
        ));
    }
    let guard = SseGuard;

    // Subscribe before the snapshot so nothing published in between is lost.
    let mut events = state.engine().subscribe();
    let initial = SessionEvent {
        kind: SessionEventKind::Status,
        snapshot: state.engine().snapshot(&id).await?,
    };
    let mut shutdown_rx = state.shutdown_rx();
    tracing::debug!(session_id = %id, "sse subscriber attached");

    let stream = async_stream::stream! {
        let _guard = guard;
        if let Some(event) = to_sse(&initial) {
            yield Ok(event);
        }

        loop {
            tokio::select! {
                received = events.recv() => match received {
                    Ok(event) if event.snapshot.session_id == id => {
                        let removed = event.kind == SessionEventKind::Removed;
                        if let Some(sse) = to_sse(&event) {
                            yield Ok(sse);
                        }
                        if removed {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(session_id = %id, skipped, "sse subscriber lagged");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = shutdown_rx.recv() => {
                    break;
                }
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    ))
}
