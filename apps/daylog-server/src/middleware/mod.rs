//! Middleware modules.

pub mod auth;
pub mod error;

pub use auth::{Access, AuthGateMiddleware, CookieSettings, SESSION_COOKIE, SessionHandle};
pub use error::{AppError, AppResult};
