//! Domain entities - the core business objects.

mod attachment;
mod device;
mod post;
mod session;

pub use attachment::Attachment;
pub use device::{DEVICE_LIFETIME_DAYS, Device};
pub use post::{EVENT_TIME_FORMAT, Post, PostDraft};
pub use session::Session;
