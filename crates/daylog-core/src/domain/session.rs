use serde::{Deserialize, Serialize};

/// Session payload carried in the signed session cookie.
///
/// Timestamps are unix seconds. `created_at` is stamped at login and never
/// refreshed; `last_seen` moves on every authenticated request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<i64>,
}

impl Session {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
