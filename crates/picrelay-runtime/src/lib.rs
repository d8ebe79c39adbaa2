//! OS-facing runtime for picrelay.
//!
//! Home of everything that binds sockets, spawns processes, or touches
//! the filesystem: the port allocator, the process supervisor with
//! tree-kill shutdown, the TCP prompt relay client, and the image ingest
//! server with its artifact store.

pub mod ingest;
pub mod ports;
pub mod relay;
pub mod supervisor;

pub use ingest::announce::{AnnounceSink, ChannelAnnouncer, HttpAnnouncer};
pub use ingest::store::ArtifactStore;
pub use ingest::IngestServer;
pub use ports::{allocate_port, is_port_available};
pub use relay::{PromptRelay, TcpPromptRelay};
pub use supervisor::{ManagedProcess, ServiceCommand, StartOutcome, Supervisor};
