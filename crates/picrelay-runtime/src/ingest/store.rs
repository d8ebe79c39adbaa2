//! Artifact landing and archive storage.
//!
//! The landing directory holds one active artifact slot; the previous
//! occupant is rotated into the archive before a new write, so the slot
//! is last-write-wins while the archive retains history. Rotation and
//! write are not atomic across a crash, which is acceptable under the
//! single-writer assumption (only the ingest server writes here).

use chrono::Utc;
use picrelay_core::config::IngestConfig;
use picrelay_core::error::IngestError;
use picrelay_core::events::ArtifactRef;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// File name of the active artifact slot.
const ACTIVE_NAME: &str = "current.png";

/// Filesystem store for inbound artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    landing_dir: PathBuf,
    archive_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(landing_dir: impl Into<PathBuf>, archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            landing_dir: landing_dir.into(),
            archive_dir: archive_dir.into(),
        }
    }

    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(&config.landing_dir, &config.archive_dir)
    }

    /// Path of the active artifact slot.
    pub fn active_path(&self) -> PathBuf {
        self.landing_dir.join(ACTIVE_NAME)
    }

    /// Ensure both directories exist. `create_dir_all` succeeds when the
    /// directory is already there, so concurrent connections racing this
    /// call are harmless.
    pub async fn ensure_dirs(&self) -> Result<(), IngestError> {
        fs::create_dir_all(&self.landing_dir).await?;
        fs::create_dir_all(&self.archive_dir).await?;
        Ok(())
    }

    /// Persist a complete artifact: rotate the previous active slot into
    /// the archive, then write the new bytes.
    pub async fn persist(&self, bytes: &[u8]) -> Result<ArtifactRef, IngestError> {
        self.ensure_dirs().await?;

        let active = self.active_path();
        if path_exists(&active).await {
            let archived = self
                .archive_dir
                .join(format!("{}.png", Utc::now().format("%Y%m%dT%H%M%S%.3f")));
            fs::rename(&active, &archived).await?;
            debug!(from = %active.display(), to = %archived.display(), "rotated active artifact");
        }

        fs::write(&active, bytes).await?;
        Ok(ArtifactRef {
            path: active,
            bytes: bytes.len() as u64,
            received_at: Utc::now(),
        })
    }
}

async fn path_exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}
