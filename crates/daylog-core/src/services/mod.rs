//! Application services built on the ports.

pub mod auth_gate;
pub mod devices;
pub mod ingest;
pub mod journal;
pub mod listing;

#[cfg(test)]
pub(crate) mod testing;

pub use auth_gate::{ArchiveAccess, AuthGate, AuthPolicy, AuthState, PUBLIC_PREFIXES, is_public};
pub use devices::{DeviceRegistry, Recognition};
pub use ingest::{
    AttachmentIngestor, ContentPath, IngestError, Ingested, THUMBNAIL_JOB, ThumbnailJob,
    content_path, thumbnail_path,
};
pub use journal::Journal;
pub use listing::{ContentFilterEngine, Listing};
