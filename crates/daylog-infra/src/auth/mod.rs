//! Authentication implementations.

mod jwt;
mod password;

pub use jwt::{JwtSessionCodec, SessionCodecConfig};
pub use password::Argon2PasswordService;
