//! # Daylog Shared
//!
//! Wire types shared by the server and its tests: form payloads, the
//! upload response, and problem details.

pub mod dto;
pub mod response;

pub use response::ErrorResponse;
