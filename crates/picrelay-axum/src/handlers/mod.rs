//! HTTP handlers. Thin: parse the request, delegate to the bridge.

pub mod events;
pub mod ingest;
pub mod prompt;
