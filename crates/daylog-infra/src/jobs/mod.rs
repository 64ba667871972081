//! Job queue implementations.

mod memory;

pub use memory::{InMemoryJobQueue, InMemoryJobQueueConfig, JobRouter};
