//! Wall-clock time effects.
//!
//! - **Implementation**: `stash-effects` (`RealTimeHandler`, `SimulatedTimeHandler`)
//! - **Usage**: attribution expiry, country cache TTLs, polling cadence

use crate::time::PhysicalTime;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Error type for time operations.
#[derive(Debug, thiserror::Error, Serialize, Deserialize)]
pub enum TimeError {
    /// The system clock reported a time before the Unix epoch
    #[error("Clock before Unix epoch")]
    BeforeEpoch,
}

/// Wall-clock time for timestamps, expiration and cooldowns.
#[async_trait]
pub trait PhysicalTimeEffects: Send + Sync {
    /// Current wall-clock time
    async fn physical_time(&self) -> Result<PhysicalTime, TimeError>;

    /// Suspend the caller for `ms` milliseconds
    async fn sleep_ms(&self, ms: u64) -> Result<(), TimeError>;

    /// Current Unix timestamp in milliseconds, or 0 when the clock fails.
    async fn current_timestamp_ms(&self) -> u64 {
        self.physical_time().await.map(|t| t.ts_ms).unwrap_or(0)
    }
}
