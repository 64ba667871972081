//! Background processing: scheduled maintenance.

mod scheduler;

pub use scheduler::{
    DEVICE_PURGE_SCHEDULE, LIMITER_SHRINK_SCHEDULE, Housekeeping, QUEUE_STATS_SCHEDULE,
    SchedulerConfig, log_queue_stats, purge_devices,
};
