//! Session gate and archive re-authorization policy.
//!
//! A session is either anonymous or authenticated. Authenticated sessions
//! never expire on the server, but the right to read the archive (anything
//! older than the recency horizon) lapses `archive_window` after login and
//! is restored only by logging in again.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::domain::Session;
use crate::ports::{AuthError, Clock, PasswordService};

/// Path prefixes reachable without a session. Matched on whole segments,
/// so `/login` and `/login/x` are public but `/loginx` is not.
pub const PUBLIC_PREFIXES: &[&str] = &["/static", "/login", "/logout"];

pub fn is_public(path: &str) -> bool {
    PUBLIC_PREFIXES.iter().any(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

/// Timing knobs for the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthPolicy {
    /// How long after login the archive stays readable.
    pub archive_window: Duration,
    /// How far back a session without archive privilege can see.
    pub recency_horizon: Duration,
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self {
            archive_window: Duration::minutes(30),
            recency_horizon: Duration::days(7),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated,
    /// Logged in, but the archive window has lapsed.
    AuthenticatedArchiveExpired,
}

impl AuthState {
    pub fn is_authenticated(self) -> bool {
        !matches!(self, Self::Unauthenticated)
    }
}

/// What part of the journal a listing may show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveAccess {
    Full,
    RecentOnly { newer_than: DateTime<Utc> },
}

impl ArchiveAccess {
    pub fn is_restricted(&self) -> bool {
        matches!(self, Self::RecentOnly { .. })
    }

    pub fn newer_than(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Full => None,
            Self::RecentOnly { newer_than } => Some(*newer_than),
        }
    }
}

pub struct AuthGate {
    policy: AuthPolicy,
    passwords: Arc<dyn PasswordService>,
    secret_hash: String,
    clock: Arc<dyn Clock>,
}

impl AuthGate {
    /// `secret_hash` is a PHC string understood by `passwords`.
    pub fn new(
        policy: AuthPolicy,
        passwords: Arc<dyn PasswordService>,
        secret_hash: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            policy,
            passwords,
            secret_hash: secret_hash.into(),
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn state(&self, session: &Session) -> AuthState {
        if !session.authenticated {
            return AuthState::Unauthenticated;
        }

        let window = self.policy.archive_window.num_seconds();
        match session.created_at {
            Some(created_at) if self.clock.now().timestamp() - created_at < window => {
                AuthState::Authenticated
            }
            _ => AuthState::AuthenticatedArchiveExpired,
        }
    }

    /// Refresh `lastSeen` on an authenticated session.
    /// Returns whether the session changed.
    pub fn touch(&self, session: &mut Session) -> bool {
        if !session.authenticated {
            return false;
        }
        session.last_seen = Some(self.clock.now().timestamp());
        true
    }

    /// Check `password` against the configured secret. On success the
    /// session is (re)stamped, which also restores archive access. On
    /// failure the session is left exactly as it was.
    pub fn login(&self, session: &mut Session, password: &str) -> Result<bool, AuthError> {
        if !self.passwords.verify(password, &self.secret_hash)? {
            tracing::info!("Login rejected");
            return Ok(false);
        }

        let now = self.clock.now().timestamp();
        session.authenticated = true;
        session.created_at = Some(now);
        session.last_seen = Some(now);

        tracing::info!("Login accepted");
        Ok(true)
    }

    pub fn logout(&self, session: &mut Session) {
        session.clear();
    }

    pub fn archive_access(&self, session: &Session) -> ArchiveAccess {
        match self.state(session) {
            AuthState::Authenticated => ArchiveAccess::Full,
            _ => ArchiveAccess::RecentOnly {
                newer_than: self.clock.now() - self.policy.recency_horizon,
            },
        }
    }
}
