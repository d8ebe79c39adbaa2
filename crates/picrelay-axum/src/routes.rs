//! Route definitions and router construction.

use axum::Router;
use axum::routing::{get, post};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};

use crate::bootstrap::{CorsConfig, WebContext};
use crate::handlers;
use crate::state::AppState;

/// Build CORS layer from configuration.
fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    match config {
        CorsConfig::AllowAll => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        CorsConfig::AllowOrigins(origins) => {
            use axum::http::HeaderValue;
            let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

/// API routes without the `/api` prefix, for nesting by the caller.
pub(crate) fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/prompt", post(handlers::prompt::send))
        .route("/events/{session_id}", get(handlers::events::stream))
}

/// Create the main router: `/health`, `/api/*`, and the loopback
/// announcement endpoint under `/internal`.
///
/// # Path Parameter Syntax
/// Axum 0.8 uses brace syntax for path parameters: `{session_id}`
pub fn create_router(ctx: WebContext, cors_config: &CorsConfig) -> Router {
    let state: AppState = Arc::new(ctx);
    let cors = build_cors_layer(cors_config);

    Router::new()
        .route("/health", get(health_check))
        .route(
            "/internal/ingest",
            post(handlers::ingest::announce).with_state(state.clone()),
        )
        .nest("/api", api_routes().with_state(state).layer(cors))
}

/// Create a router with API routes and static asset serving.
///
/// Serves static assets from `static_dir`, falling back to `index.html`
/// for unmatched paths (SPA client-side routing). API routes take
/// priority.
pub fn create_spa_router<P: AsRef<Path>>(
    ctx: WebContext,
    static_dir: P,
    cors_config: &CorsConfig,
) -> Router {
    let static_path = static_dir.as_ref();
    let index_path = static_path.join("index.html");

    let serve_dir = ServeDir::new(static_path).fallback(ServeFile::new(&index_path));

    let api = create_router(ctx, cors_config);
    api.fallback_service(serve_dir)
}

/// Health check endpoint.
pub(crate) async fn health_check() -> &'static str {
    "OK"
}
