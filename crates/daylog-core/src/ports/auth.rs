//! Authentication ports.

use crate::domain::Session;

/// Signs session bags into cookie values and verifies them back.
pub trait SessionCodec: Send + Sync {
    /// Serialize and sign a session.
    fn encode(&self, session: &Session) -> Result<String, AuthError>;

    /// Verify and deserialize a cookie value.
    /// Any tampering yields [`AuthError::InvalidSession`].
    fn decode(&self, value: &str) -> Result<Session, AuthError>;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid session: {0}")]
    InvalidSession(String),

    #[error("Hashing error: {0}")]
    HashingError(String),

    #[error("Session encoding failed: {0}")]
    Encoding(String),
}
