//! Internal ingest announcement endpoint.
//!
//! The ingest service POSTs completion (or failure) announcements here
//! over loopback; the handler routes them into the correlation registry
//! and reports the dispatch disposition in the status code so the
//! announcing side can log refusals.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use picrelay_core::correlation::Delivery;
use picrelay_core::events::IngestAnnouncement;
use tracing::debug;

use crate::state::AppState;

/// Accept an announcement from the ingest service.
pub async fn announce(
    State(state): State<AppState>,
    Json(announcement): Json<IngestAnnouncement>,
) -> StatusCode {
    match state.bridge.ingest_completed(announcement) {
        Delivery::Delivered(token) => {
            debug!(%token, "announcement delivered");
            StatusCode::OK
        }
        // Nothing waiting for it; acknowledged but goes nowhere.
        Delivery::Unmatched => StatusCode::ACCEPTED,
        Delivery::Ambiguous { .. } => StatusCode::CONFLICT,
    }
}
