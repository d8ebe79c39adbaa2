//! Prompt handler - the bridge's inbound request surface.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::error::HttpError;
use crate::state::AppState;

/// Header carrying the session identifier out-of-band.
pub const SESSION_HEADER: &str = "x-session-id";

/// Request body for a prompt submission.
#[derive(Debug, Deserialize)]
pub struct PromptBody {
    pub prompt: String,
}

/// Successful response: the artifact reference for this request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptReply {
    pub token: String,
    pub artifact: String,
}

/// Submit a prompt and wait for the correlated artifact.
pub async fn send(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<PromptBody>,
) -> Result<Json<PromptReply>, HttpError> {
    let session = headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok());

    let reply = state.bridge.handle_prompt(&body.prompt, session).await?;
    Ok(Json(PromptReply {
        token: reply.token.to_string(),
        artifact: reply.artifact.path.display().to_string(),
    }))
}
