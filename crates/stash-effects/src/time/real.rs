//! Real time effect handler for production use

use async_trait::async_trait;
use stash_core::effects::{PhysicalTimeEffects, TimeError};
use stash_core::time::PhysicalTime;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time;

/// System clock handler
#[derive(Debug, Clone, Copy, Default)]
pub struct RealTimeHandler;

impl RealTimeHandler {
    /// Create a new real time handler
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PhysicalTimeEffects for RealTimeHandler {
    async fn physical_time(&self) -> Result<PhysicalTime, TimeError> {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| TimeError::BeforeEpoch)?;
        Ok(PhysicalTime::from_ms(elapsed.as_millis() as u64))
    }

    async fn sleep_ms(&self, ms: u64) -> Result<(), TimeError> {
        time::sleep(Duration::from_millis(ms)).await;
        Ok(())
    }
}
