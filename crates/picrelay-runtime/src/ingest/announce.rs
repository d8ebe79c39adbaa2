//! Completion announcement sinks.
//!
//! The ingest server is the single writer of announcements; how they
//! reach the bridge depends on deployment. In-process (tests, embedded
//! mode) a broadcast channel fans them out to subscribers; across the
//! supervised process boundary they are POSTed to the bridge's internal
//! loopback endpoint.

use async_trait::async_trait;
use picrelay_core::events::IngestAnnouncement;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Where completion announcements go.
#[async_trait]
pub trait AnnounceSink: Send + Sync {
    async fn announce(&self, announcement: IngestAnnouncement);
}

/// In-process broadcast of announcements.
#[derive(Debug, Clone)]
pub struct ChannelAnnouncer {
    sender: broadcast::Sender<IngestAnnouncement>,
}

impl ChannelAnnouncer {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<IngestAnnouncement> {
        self.sender.subscribe()
    }
}

impl Default for ChannelAnnouncer {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl AnnounceSink for ChannelAnnouncer {
    async fn announce(&self, announcement: IngestAnnouncement) {
        // No subscribers is fine; the send error is irrelevant then.
        let _ = self.sender.send(announcement);
    }
}

/// Cross-process announcement delivery over loopback HTTP.
#[derive(Debug, Clone)]
pub struct HttpAnnouncer {
    client: reqwest::Client,
    url: String,
}

impl HttpAnnouncer {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl AnnounceSink for HttpAnnouncer {
    async fn announce(&self, announcement: IngestAnnouncement) {
        match self
            .client
            .post(&self.url)
            .json(&announcement)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                debug!(url = %self.url, "announcement delivered");
            }
            Ok(response) => {
                warn!(url = %self.url, status = %response.status(), "announcement rejected");
            }
            Err(e) => {
                warn!(url = %self.url, error = %e, "announcement delivery failed");
            }
        }
    }
}
