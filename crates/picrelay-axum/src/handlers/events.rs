//! SSE events handler - per-session realtime push.

use axum::extract::{Path, State};
use axum::response::sse::{Event, Sse};
use futures_util::stream::Stream;
use std::convert::Infallible;

use crate::state::AppState;

/// Stream one session's push events.
///
/// A session's channel receives exactly one message per completed
/// correlation, carrying the artifact reference.
pub async fn stream(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send + 'static> {
    state.pushes.stream_for_session(session_id)
}
