//! Remembered-device registry behind the `dl-device` cookie.

use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;

use crate::domain::{DEVICE_LIFETIME_DAYS, Device};
use crate::error::RepoError;
use crate::ports::{Clock, DeviceRepository};

#[derive(Debug, Clone, PartialEq)]
pub enum Recognition {
    /// The cookie named a live device; its `last_seen_at` was refreshed.
    Known(Device),
    /// A fresh device was registered and needs a new cookie.
    New(Device),
}

impl Recognition {
    pub fn device(&self) -> &Device {
        match self {
            Self::Known(device) | Self::New(device) => device,
        }
    }
}

pub struct DeviceRegistry {
    devices: Arc<dyn DeviceRepository>,
    clock: Arc<dyn Clock>,
}

impl DeviceRegistry {
    pub fn new(devices: Arc<dyn DeviceRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { devices, clock }
    }

    /// Resolve the device cookie sent with a successful login.
    pub async fn recognize(
        &self,
        cookie: Option<&str>,
        user_agent: &str,
    ) -> Result<Recognition, RepoError> {
        let now = self.clock.now();

        if let Some(id) = cookie.and_then(|raw| Uuid::parse_str(raw).ok()) {
            if let Some(mut device) = self.devices.find_by_id(id).await? {
                if !device.is_expired(now) {
                    device.last_seen_at = now;
                    let device = self.devices.save(device).await?;
                    return Ok(Recognition::Known(device));
                }
            }
        }

        let device = self.devices.save(Device::new(user_agent, now)).await?;
        tracing::info!(device_id = %device.id, "New device registered");
        Ok(Recognition::New(device))
    }

    pub async fn purge_expired(&self) -> Result<u64, RepoError> {
        let cutoff = self.clock.now() - Duration::days(DEVICE_LIFETIME_DAYS);
        let purged = self.devices.delete_created_until(cutoff).await?;
        if purged > 0 {
            tracing::info!(purged, "Expired devices purged");
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::FixedClock;
    use crate::services::testing::MemoryDevices;
    use chrono::{TimeZone, Utc};

    fn registry() -> (DeviceRegistry, Arc<MemoryDevices>, Arc<FixedClock>) {
        let devices = Arc::new(MemoryDevices::default());
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ));
        (
            DeviceRegistry::new(devices.clone(), clock.clone()),
            devices,
            clock,
        )
    }

    #[tokio::test]
    async fn test_unknown_cookie_registers_device() {
        let (registry, devices, _) = registry();

        let first = registry.recognize(None, "Firefox").await.unwrap();
        assert!(matches!(first, Recognition::New(_)));

        let bogus = registry.recognize(Some("garbage"), "Firefox").await.unwrap();
        assert!(matches!(bogus, Recognition::New(_)));
        assert_eq!(devices.rows.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_known_device_is_refreshed() {
        let (registry, _, clock) = registry();
        let id = registry.recognize(None, "Firefox").await.unwrap().device().id;

        clock.advance(Duration::days(3));
        let again = registry
            .recognize(Some(&id.to_string()), "Firefox")
            .await
            .unwrap();

        match again {
            Recognition::Known(device) => {
                assert_eq!(device.id, id);
                assert_eq!(device.last_seen_at, clock.now());
            }
            other => panic!("expected known device, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_expired_device_is_replaced_and_purged() {
        let (registry, devices, clock) = registry();
        let id = registry.recognize(None, "Firefox").await.unwrap().device().id;

        clock.advance(Duration::days(DEVICE_LIFETIME_DAYS));
        let again = registry
            .recognize(Some(&id.to_string()), "Firefox")
            .await
            .unwrap();
        assert!(matches!(again, Recognition::New(ref d) if d.id != id));

        assert_eq!(registry.purge_expired().await.unwrap(), 1);
        let remaining = devices.rows.lock().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_ne!(remaining[0].id, id);
    }
}
