//! Axum web adapter for picrelay.
//!
//! Hosts the correlation bridge: inbound prompt requests, the internal
//! ingest announcement endpoint, and the per-session realtime push
//! stream. Handlers stay thin and delegate to the bridge.

pub mod bootstrap;
pub mod bridge;
pub mod error;
pub mod handlers;
pub mod push;
pub mod routes;
pub mod state;

pub use bootstrap::{CorsConfig, WebConfig, WebContext, bootstrap, bootstrap_with_relay, start_server};
pub use bridge::{BridgeReply, CorrelationBridge};
pub use error::HttpError;
pub use push::PushBroadcaster;
