//! Prompt relay client.
//!
//! One fresh TCP connection per call: write the token line and the
//! sanitized prompt, then treat the first inbound data as the complete
//! peer response. Calls are independent and share no state. The whole
//! exchange runs under a caller-supplied deadline so a non-responsive
//! peer cannot hang the request forever.

use async_trait::async_trait;
use picrelay_core::config::RelayConfig;
use picrelay_core::error::RelayError;
use picrelay_core::prompt::{sanitize, validate};
use picrelay_core::token::CorrelationToken;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info};

/// Seam for the bridge; tests substitute a mock.
#[async_trait]
pub trait PromptRelay: Send + Sync {
    /// Relay a prompt to the peer and return its response text.
    async fn relay(&self, token: CorrelationToken, prompt: &str) -> Result<String, RelayError>;
}

/// TCP relay to a fixed peer address.
#[derive(Debug, Clone)]
pub struct TcpPromptRelay {
    config: RelayConfig,
}

impl TcpPromptRelay {
    pub fn new(config: RelayConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PromptRelay for TcpPromptRelay {
    async fn relay(&self, token: CorrelationToken, prompt: &str) -> Result<String, RelayError> {
        // Validation happens before any connection is attempted.
        validate(prompt)?;
        let sanitized = sanitize(prompt);
        debug!(%token, peer = %self.config.peer_addr, "relaying prompt");

        let deadline = self.config.timeout;
        let exchange = async {
            let mut stream = TcpStream::connect(&self.config.peer_addr)
                .await
                .map_err(|e| RelayError::Connection(e.to_string()))?;

            stream
                .write_all(token.wire_line().as_bytes())
                .await
                .map_err(|e| RelayError::Connection(e.to_string()))?;
            stream
                .write_all(sanitized.as_bytes())
                .await
                .map_err(|e| RelayError::Connection(e.to_string()))?;
            stream
                .flush()
                .await
                .map_err(|e| RelayError::Connection(e.to_string()))?;

            let mut buf = vec![0u8; 4096];
            let n = stream
                .read(&mut buf)
                .await
                .map_err(|e| RelayError::Connection(e.to_string()))?;
            if n == 0 {
                return Err(RelayError::Connection(
                    "peer closed the connection without responding".to_string(),
                ));
            }
            Ok(String::from_utf8_lossy(&buf[..n]).into_owned())
        };

        let response = timeout(deadline, exchange)
            .await
            .map_err(|_| RelayError::Timeout {
                seconds: deadline.as_secs(),
            })??;

        info!(%token, response_len = response.len(), "prompt relayed");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::TcpListener;

    /// Peer that records what it received and answers with `reply`.
    async fn spawn_peer(reply: &'static str) -> (String, tokio::sync::oneshot::Receiver<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let (tx, rx) = tokio::sync::oneshot::channel();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = stream.read(&mut buf).await.unwrap();
            stream.write_all(reply.as_bytes()).await.unwrap();
            let _ = tx.send(buf[..n].to_vec());
        });
        (addr, rx)
    }

    #[tokio::test]
    async fn relays_token_line_and_sanitized_prompt() {
        let (addr, received) = spawn_peer("ok").await;
        let relay = TcpPromptRelay::new(RelayConfig::default().with_peer_addr(addr));
        let token = CorrelationToken::new();

        let response = relay.relay(token, "a <cat>").await.unwrap();
        assert_eq!(response, "ok");

        let wire = received.await.unwrap();
        let text = String::from_utf8(wire).unwrap();
        assert_eq!(text, format!("{token}\na &lt;cat&gt;"));
    }

    #[tokio::test]
    async fn invalid_prompt_is_rejected_before_connecting() {
        // Deliberately unroutable peer: validation must fail first.
        let relay = TcpPromptRelay::new(RelayConfig::default().with_peer_addr("127.0.0.1:1"));
        let result = relay.relay(CorrelationToken::new(), "   ").await;
        assert!(matches!(result, Err(RelayError::InvalidPrompt(_))));
    }

    #[tokio::test]
    async fn refused_connection_is_a_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let relay = TcpPromptRelay::new(RelayConfig::default().with_peer_addr(addr));
        let result = relay.relay(CorrelationToken::new(), "hello").await;
        assert!(matches!(result, Err(RelayError::Connection(_))));
    }

    #[tokio::test]
    async fn silent_peer_times_out() {
        // Peer accepts but never answers.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(60)).await;
        });

        let relay = TcpPromptRelay::new(
            RelayConfig::default()
                .with_peer_addr(addr)
                .with_timeout(Duration::from_millis(200)),
        );
        let result = relay.relay(CorrelationToken::new(), "hello").await;
        assert!(matches!(result, Err(RelayError::Timeout { .. })));
    }
}
