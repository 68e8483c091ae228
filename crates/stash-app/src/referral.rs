//! Pending referral code captured from a landing URL or deep link.
//!
//! The first valid code wins and is kept under `<prefix>:referral` until
//! signup consumes it or the user clears it.

use crate::attribution::{AttributionError, AttributionParams};
use serde::{Deserialize, Serialize};
use stash_core::{PhysicalTime, PhysicalTimeEffects, StorageEffects, StorageError, StorageJsonExt};
use std::sync::Arc;

/// Persisted referral code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredReferral {
    /// Normalized code
    pub code: String,
    /// When it was captured
    pub captured_at: PhysicalTime,
}

/// Referral code persistence.
pub struct ReferralStore {
    storage: Arc<dyn StorageEffects>,
    time: Arc<dyn PhysicalTimeEffects>,
    key: String,
}

impl std::fmt::Debug for ReferralStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferralStore").field("key", &self.key).finish_non_exhaustive()
    }
}

impl ReferralStore {
    /// Store under `<prefix>:referral`
    pub fn new(
        storage: Arc<dyn StorageEffects>,
        time: Arc<dyn PhysicalTimeEffects>,
        storage_prefix: &str,
    ) -> Self {
        Self {
            storage,
            time,
            key: format!("{storage_prefix}:referral"),
        }
    }

    /// Pending referral, if any. A corrupt record is logged and treated as
    /// absent.
    pub async fn get(&self) -> Result<Option<StoredReferral>, AttributionError> {
        match self.storage.retrieve_json(&self.key).await {
            Ok(stored) => Ok(stored),
            Err(StorageError::Serialization(reason)) => {
                tracing::warn!(key = %self.key, %reason, "discarding unreadable referral record");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Record `code` unless one is already pending. Returns the pending code.
    pub async fn set_if_absent(&self, code: &str) -> Result<Option<String>, AttributionError> {
        if let Some(existing) = self.get().await? {
            return Ok(Some(existing.code));
        }
        let Some(code) = crate::attribution::sanitize_referral_code(code) else {
            return Ok(None);
        };
        let stored = StoredReferral {
            code: code.clone(),
            captured_at: self.time.physical_time().await?,
        };
        self.storage.store_json(&self.key, &stored).await?;
        tracing::debug!(%code, "referral code stored");
        Ok(Some(code))
    }

    /// Capture a referral code from any accepted alias in `url`.
    pub async fn capture_from_url(&self, url: &str) -> Result<Option<String>, AttributionError> {
        let params = AttributionParams::from_deep_link(url)?;
        match params.referral_code {
            Some(code) => self.set_if_absent(&code).await,
            None => Ok(self.get().await?.map(|r| r.code)),
        }
    }

    /// Take the pending code, removing it.
    pub async fn consume(&self) -> Result<Option<String>, AttributionError> {
        let pending = self.get().await?;
        if pending.is_some() {
            self.storage.remove(&self.key).await?;
        }
        Ok(pending.map(|r| r.code))
    }

    /// Forget any pending code
    pub async fn clear(&self) -> Result<(), AttributionError> {
        self.storage.remove(&self.key).await?;
        Ok(())
    }
}
