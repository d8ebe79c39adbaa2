//! Image ingest server.
//!
//! A long-lived listener where the entire byte stream of each inbound
//! connection, up to peer-initiated close, is one binary artifact. Each
//! connection accumulates into its own buffer; nothing is shared between
//! connections except the store and the announcement sink.

pub mod announce;
pub mod store;

use announce::AnnounceSink;
use picrelay_core::events::IngestAnnouncement;
use picrelay_core::token::split_tagged;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use store::ArtifactStore;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};

/// Ingest server: accept loop plus per-connection handlers.
pub struct IngestServer {
    store: ArtifactStore,
    sink: Arc<dyn AnnounceSink>,
}

impl IngestServer {
    pub fn new(store: ArtifactStore, sink: Arc<dyn AnnounceSink>) -> Self {
        Self { store, sink }
    }

    /// Run the accept loop on an already-bound listener.
    pub async fn run(&self, listener: TcpListener) -> io::Result<()> {
        let addr = listener.local_addr()?;
        info!(%addr, "ingest server listening");

        loop {
            let (stream, peer) = listener.accept().await?;
            let store = self.store.clone();
            let sink = Arc::clone(&self.sink);
            tokio::spawn(async move {
                handle_connection(stream, peer, store, sink).await;
            });
        }
    }
}

/// Accumulate one connection's stream until the peer closes it, then
/// persist and announce.
async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    store: ArtifactStore,
    sink: Arc<dyn AnnounceSink>,
) {
    let mut buf = Vec::new();
    if let Err(e) = stream.read_to_end(&mut buf).await {
        warn!(%peer, error = %e, "connection dropped mid-stream, discarding");
        return;
    }

    let (token, payload) = split_tagged(&buf);

    // A connection that closes without payload carries nothing worth
    // persisting; discard instead of clobbering the active slot.
    if payload.is_empty() {
        warn!(%peer, tagged = token.is_some(), "empty stream discarded");
        return;
    }

    match store.persist(payload).await {
        Ok(artifact) => {
            info!(
                %peer,
                bytes = artifact.bytes,
                path = %artifact.path.display(),
                tagged = token.is_some(),
                "artifact received"
            );
            sink.announce(IngestAnnouncement::completed(token, artifact))
                .await;
        }
        Err(e) => {
            error!(%peer, error = %e, "failed to persist artifact");
            // Escalate so the matching pending request fails instead of
            // stalling until its deadline.
            sink.announce(IngestAnnouncement::failed(token, e.to_string()))
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use announce::ChannelAnnouncer;
    use picrelay_core::token::CorrelationToken;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;
    use tokio::time::timeout;

    struct Fixture {
        addr: SocketAddr,
        announcer: ChannelAnnouncer,
        _dir: tempfile::TempDir,
    }

    async fn start_server() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("landing"), dir.path().join("archive"));
        let announcer = ChannelAnnouncer::default();
        let server = IngestServer::new(store, Arc::new(announcer.clone()));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = server.run(listener).await;
        });

        Fixture {
            addr,
            announcer,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn chunks_are_persisted_in_arrival_order() {
        let fixture = start_server().await;
        let mut rx = fixture.announcer.subscribe();

        let mut conn = TcpStream::connect(fixture.addr).await.unwrap();
        for chunk in [&b"one-"[..], &b"two-"[..], &b"three"[..]] {
            conn.write_all(chunk).await.unwrap();
            conn.flush().await.unwrap();
        }
        drop(conn);

        let announcement = timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        let artifact = announcement.artifact.unwrap();
        assert_eq!(
            tokio::fs::read(&artifact.path).await.unwrap(),
            b"one-two-three"
        );
        assert_eq!(announcement.token, None);
    }

    #[tokio::test]
    async fn token_line_is_stripped_and_carried() {
        let fixture = start_server().await;
        let mut rx = fixture.announcer.subscribe();

        let token = CorrelationToken::new();
        let mut conn = TcpStream::connect(fixture.addr).await.unwrap();
        conn.write_all(token.wire_line().as_bytes()).await.unwrap();
        conn.write_all(&[0x89, 0x50, 0x4E, 0x47]).await.unwrap();
        drop(conn);

        let announcement = timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(announcement.token, Some(token));
        let artifact = announcement.artifact.unwrap();
        assert_eq!(
            tokio::fs::read(&artifact.path).await.unwrap(),
            vec![0x89, 0x50, 0x4E, 0x47]
        );
    }

    #[tokio::test]
    async fn zero_byte_stream_is_discarded_without_announcement() {
        let fixture = start_server().await;
        let mut rx = fixture.announcer.subscribe();

        let conn = TcpStream::connect(fixture.addr).await.unwrap();
        drop(conn);

        // No announcement within a generous window.
        assert!(timeout(Duration::from_millis(500), rx.recv()).await.is_err());

        // And the server is still accepting.
        let mut conn = TcpStream::connect(fixture.addr).await.unwrap();
        conn.write_all(b"still alive").await.unwrap();
        drop(conn);
        let announcement = timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(announcement.artifact.is_some());
    }

    #[tokio::test]
    async fn concurrent_connections_do_not_share_buffers() {
        let fixture = start_server().await;
        let mut rx = fixture.announcer.subscribe();

        let mut a = TcpStream::connect(fixture.addr).await.unwrap();
        let mut b = TcpStream::connect(fixture.addr).await.unwrap();
        a.write_all(b"aaaa").await.unwrap();
        b.write_all(b"bbbb").await.unwrap();
        drop(b);
        drop(a);

        let mut sizes = Vec::new();
        for _ in 0..2 {
            let announcement = timeout(Duration::from_secs(5), rx.recv())
                .await
                .unwrap()
                .unwrap();
            sizes.push(announcement.artifact.unwrap().bytes);
        }
        // Two separate four-byte artifacts, never a merged buffer.
        assert_eq!(sizes, vec![4, 4]);
    }
}
