//! Simulated time effect handler for testing

use async_trait::async_trait;
use parking_lot::Mutex;
use stash_core::effects::{PhysicalTimeEffects, TimeError};
use stash_core::time::{PhysicalTime, MS_PER_DAY};
use std::sync::Arc;

/// Manually advanced clock.
///
/// `sleep_ms` advances the clock instead of waiting, so code that sleeps
/// between polls runs instantly and deterministically under test. Clones
/// share the same clock.
#[derive(Debug, Clone)]
pub struct SimulatedTimeHandler {
    current_time: Arc<Mutex<u64>>,
}

impl SimulatedTimeHandler {
    /// Create a simulated clock starting at `start_time_ms`
    pub fn new(start_time_ms: u64) -> Self {
        Self {
            current_time: Arc::new(Mutex::new(start_time_ms)),
        }
    }

    /// Create a simulated clock starting at the Unix epoch
    pub fn new_at_epoch() -> Self {
        Self::new(0)
    }

    /// Advance the clock by `duration_ms`
    pub fn advance_time(&self, duration_ms: u64) {
        let mut time = self.current_time.lock();
        *time = time.saturating_add(duration_ms);
    }

    /// Advance the clock by whole days
    pub fn advance_days(&self, days: u64) {
        self.advance_time(days.saturating_mul(MS_PER_DAY));
    }

    /// Set the absolute clock value
    pub fn set_time(&self, time_ms: u64) {
        *self.current_time.lock() = time_ms;
    }

    /// Current clock value
    pub fn get_time(&self) -> u64 {
        *self.current_time.lock()
    }
}

impl Default for SimulatedTimeHandler {
    fn default() -> Self {
        Self::new_at_epoch()
    }
}

#[async_trait]
impl PhysicalTimeEffects for SimulatedTimeHandler {
    async fn physical_time(&self) -> Result<PhysicalTime, TimeError> {
        Ok(PhysicalTime::from_ms(self.get_time()))
    }

    async fn sleep_ms(&self, ms: u64) -> Result<(), TimeError> {
        self.advance_time(ms);
        tokio::task::yield_now().await;
        Ok(())
    }
}
