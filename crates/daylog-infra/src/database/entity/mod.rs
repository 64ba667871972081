//! SeaORM entities and their mappings to domain types.

pub mod attachment;
pub mod device;
pub mod post;
