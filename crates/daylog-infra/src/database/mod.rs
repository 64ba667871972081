//! Database connection management and repositories.

mod connections;
pub mod entity;
mod sqlite_base;
pub mod sqlite_repo;

pub use connections::{DatabaseConfig, connect};
pub use sqlite_base::SqliteBaseRepository;
pub use sqlite_repo::{SqliteAttachmentRepository, SqliteDeviceRepository, SqlitePostRepository};

#[cfg(test)]
mod tests;
