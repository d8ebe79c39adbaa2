//! Shared application state type.

use crate::bootstrap::WebContext;
use std::sync::Arc;

/// Application state shared across all handlers: an Arc-wrapped
/// `WebContext` holding the bridge and the push broadcaster.
pub type AppState = Arc<WebContext>;
