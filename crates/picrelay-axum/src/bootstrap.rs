//! Web server bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together
//! for the web adapter: the TCP relay client, the correlation bridge,
//! and the push broadcaster are all instantiated here.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use picrelay_core::config::{BridgeConfig, DEFAULT_PEER_ADDR, RelayConfig};
use picrelay_runtime::relay::{PromptRelay, TcpPromptRelay};

use crate::bridge::CorrelationBridge;
use crate::push::PushBroadcaster;

/// CORS configuration for the web server.
#[derive(Debug, Clone, Default)]
pub enum CorsConfig {
    /// Allow all origins (development mode).
    #[default]
    AllowAll,
    /// Allow specific origins (production mode).
    AllowOrigins(Vec<String>),
}

/// Server configuration for the web adapter.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Port for the HTTP server.
    pub http_port: u16,
    /// Address of the prompt-handling peer, `host:port`.
    pub peer_addr: String,
    /// Deadline for a single relay exchange.
    pub relay_timeout: Duration,
    /// Deadline for an artifact to arrive after a relayed prompt.
    pub correlation_timeout: Duration,
    /// Optional path to static assets for SPA serving.
    pub static_dir: Option<PathBuf>,
    /// CORS configuration.
    pub cors: CorsConfig,
}

impl Default for WebConfig {
    fn default() -> Self {
        let bridge = BridgeConfig::default();
        Self {
            http_port: bridge.http_port,
            peer_addr: DEFAULT_PEER_ADDR.to_string(),
            relay_timeout: RelayConfig::default().timeout,
            correlation_timeout: bridge.correlation_timeout,
            static_dir: None,
            cors: CorsConfig::default(),
        }
    }
}

impl WebConfig {
    /// Set the static directory for SPA serving.
    #[must_use]
    pub fn with_static_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(path.into());
        self
    }

    /// Set CORS to allow specific origins.
    #[must_use]
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.cors = CorsConfig::AllowOrigins(origins);
        self
    }

    #[must_use]
    pub fn with_peer_addr(mut self, addr: impl Into<String>) -> Self {
        self.peer_addr = addr.into();
        self
    }

    #[must_use]
    pub fn with_correlation_timeout(mut self, timeout: Duration) -> Self {
        self.correlation_timeout = timeout;
        self
    }
}

/// Application context for the web adapter.
pub struct WebContext {
    /// The correlation bridge, shared with every handler.
    pub bridge: Arc<CorrelationBridge>,
    /// Push broadcaster for per-session SSE streams.
    pub pushes: PushBroadcaster,
}

/// Bootstrap the web adapter with the real TCP relay client.
pub fn bootstrap(config: &WebConfig) -> WebContext {
    let relay_config = RelayConfig::default()
        .with_peer_addr(config.peer_addr.clone())
        .with_timeout(config.relay_timeout);
    let relay: Arc<dyn PromptRelay> = Arc::new(TcpPromptRelay::new(relay_config));

    tracing::info!(
        peer_addr = %config.peer_addr,
        relay_timeout_secs = config.relay_timeout.as_secs(),
        correlation_timeout_secs = config.correlation_timeout.as_secs(),
        "web bootstrap"
    );

    bootstrap_with_relay(relay, config)
}

/// Bootstrap with an injected relay implementation. The seam tests use
/// to run the full HTTP surface without a live peer.
pub fn bootstrap_with_relay(relay: Arc<dyn PromptRelay>, config: &WebConfig) -> WebContext {
    let pushes = PushBroadcaster::with_defaults();
    let bridge = Arc::new(CorrelationBridge::new(
        relay,
        pushes.clone(),
        config.correlation_timeout,
    ));
    WebContext { bridge, pushes }
}

/// Start the web server on the configured port.
///
/// If `config.static_dir` is set, serves static assets with SPA fallback.
/// Otherwise, serves only the API endpoints.
pub async fn start_server(config: WebConfig) -> Result<()> {
    use tokio::net::TcpListener;
    use tracing::info;

    let ctx = bootstrap(&config);

    let app = if let Some(ref static_dir) = config.static_dir {
        info!("Serving static assets from: {}", static_dir.display());
        crate::routes::create_spa_router(ctx, static_dir, &config.cors)
    } else {
        crate::routes::create_router(ctx, &config.cors)
    };

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = TcpListener::bind(&addr).await?;

    if config.static_dir.is_some() {
        info!("picrelay web server (with UI) listening on http://{addr}");
    } else {
        info!("picrelay web server (API only) listening on http://{addr}");
    }

    axum::serve(listener, app).await?;
    Ok(())
}
