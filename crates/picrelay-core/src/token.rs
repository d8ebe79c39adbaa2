//! End-to-end correlation tokens.
//!
//! The same token travels through both wire protocols: the relay client
//! prefixes the outbound prompt with `<token>\n`, and a cooperating peer
//! echoes the token as the first line of the image stream it sends back.
//! That lets the bridge route an inbound artifact to exactly the request
//! that caused it instead of guessing by registration order.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// How far into a stream we look for the token line. A UUID line is 37
/// bytes including the newline; anything past this is payload.
const MAX_TOKEN_LINE: usize = 64;

/// Opaque correlation token threaded through both wire protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationToken(Uuid);

impl CorrelationToken {
    /// Generate a fresh token.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a token from its string form.
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s.trim()).ok().map(Self)
    }

    /// Wire form of the token line, newline included.
    pub fn wire_line(&self) -> String {
        format!("{}\n", self.0)
    }
}

impl Default for CorrelationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Split an inbound stream into an optional leading token line and the
/// payload that follows it.
///
/// If the first line (within [`MAX_TOKEN_LINE`] bytes) parses as a UUID,
/// it is the token and the payload starts after the newline. Otherwise
/// the whole stream is an untagged payload; streams from peers that do
/// not speak the token extension are still accepted.
pub fn split_tagged(stream: &[u8]) -> (Option<CorrelationToken>, &[u8]) {
    let search = &stream[..stream.len().min(MAX_TOKEN_LINE)];
    if let Some(newline) = search.iter().position(|&b| b == b'\n') {
        if let Ok(line) = std::str::from_utf8(&stream[..newline]) {
            if let Some(token) = CorrelationToken::parse(line) {
                return (Some(token), &stream[newline + 1..]);
            }
        }
    }
    (None, stream)
}
