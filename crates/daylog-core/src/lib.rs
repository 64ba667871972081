//! # Daylog Core
//!
//! The domain layer of the daylog journal.
//! Entities, ports, and the services that decide who may read what:
//! the session gate, the listing filter, and attachment ingestion.
//! Storage, cookies and image decoding live behind the ports.

pub mod domain;
pub mod error;
pub mod filter;
pub mod pagination;
pub mod ports;
pub mod services;

pub use error::{DomainError, RepoError};
