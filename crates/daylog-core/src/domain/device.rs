use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How long a remembered browser stays registered.
pub const DEVICE_LIFETIME_DAYS: i64 = 62;

/// A browser that has logged in at least once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: Uuid,
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

impl Device {
    pub fn new(user_agent: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_agent: user_agent.into(),
            created_at: now,
            last_seen_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at >= Duration::days(DEVICE_LIFETIME_DAYS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_expiry() {
        let now = Utc::now();
        let device = Device::new("Firefox", now);

        assert!(!device.is_expired(now + Duration::days(61)));
        assert!(device.is_expired(now + Duration::days(62)));
    }
}
