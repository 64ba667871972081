//! Blob store implementations.

mod fs;

pub use fs::FsBlobStore;
