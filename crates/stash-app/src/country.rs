//! Country detection cache.
//!
//! The IP lookup result is cached under `<prefix>:country` for a TTL. A
//! country the user confirmed never expires until cleared. When a refresh
//! fails, a stale cached value is still returned.

use crate::workflows::backend::{BackendError, CountryLookup};
use serde::{Deserialize, Serialize};
use stash_core::{
    PhysicalTime, PhysicalTimeEffects, StorageEffects, StorageError, StorageJsonExt, TimeError,
    MS_PER_HOUR,
};
use std::sync::Arc;

/// Default cache lifetime
pub const DEFAULT_TTL_HOURS: u64 = 24;

/// Country cache failures
#[derive(Debug, thiserror::Error)]
pub enum CountryError {
    /// Lookup failed and nothing was cached
    #[error("Country lookup failed: {0}")]
    Lookup(#[from] BackendError),

    /// Lookup returned something that is not a country code
    #[error("Invalid country code: {code:?}")]
    InvalidCode {
        /// Value returned by the lookup
        code: String,
    },

    /// Storage failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Clock failure
    #[error(transparent)]
    Time(#[from] TimeError),
}

/// Persisted country entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryCacheEntry {
    /// Upper-case ISO 3166-1 alpha-2 code
    pub country_code: String,
    /// When the entry was written
    pub fetched_at: PhysicalTime,
    /// Confirmed by the user
    #[serde(default)]
    pub confirmed: bool,
}

impl CountryCacheEntry {
    /// Whether the entry is still usable at `now`
    pub fn is_fresh_at(&self, now: PhysicalTime, ttl_ms: u64) -> bool {
        self.confirmed || !now.exceeds_window(self.fetched_at, ttl_ms)
    }
}

fn normalize_code(raw: &str) -> Option<String> {
    let code = raw.trim().to_ascii_uppercase();
    (code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic())).then_some(code)
}

/// Cached country detection
pub struct CountryDetector {
    storage: Arc<dyn StorageEffects>,
    time: Arc<dyn PhysicalTimeEffects>,
    lookup: Arc<dyn CountryLookup>,
    key: String,
    ttl_ms: u64,
}

impl std::fmt::Debug for CountryDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountryDetector")
            .field("key", &self.key)
            .field("ttl_ms", &self.ttl_ms)
            .finish_non_exhaustive()
    }
}

impl CountryDetector {
    /// Detector storing under `<prefix>:country` with the default TTL
    pub fn new(
        storage: Arc<dyn StorageEffects>,
        time: Arc<dyn PhysicalTimeEffects>,
        lookup: Arc<dyn CountryLookup>,
        storage_prefix: &str,
    ) -> Self {
        Self {
            storage,
            time,
            lookup,
            key: format!("{storage_prefix}:country"),
            ttl_ms: DEFAULT_TTL_HOURS * MS_PER_HOUR,
        }
    }

    /// Override the TTL
    #[must_use]
    pub fn with_ttl_hours(mut self, hours: u64) -> Self {
        self.ttl_ms = hours.saturating_mul(MS_PER_HOUR);
        self
    }

    /// Cached entry regardless of age
    pub async fn cached(&self) -> Result<Option<CountryCacheEntry>, CountryError> {
        match self.storage.retrieve_json(&self.key).await {
            Ok(entry) => Ok(entry),
            Err(StorageError::Serialization(reason)) => {
                tracing::warn!(key = %self.key, %reason, "discarding unreadable country cache");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Country code, from cache when fresh, otherwise from the lookup.
    #[tracing::instrument(skip(self), fields(key = %self.key))]
    pub async fn country(&self) -> Result<String, CountryError> {
        let now = self.time.physical_time().await?;
        let cached = self.cached().await?;
        if let Some(entry) = cached.as_ref().filter(|e| e.is_fresh_at(now, self.ttl_ms)) {
            return Ok(entry.country_code.clone());
        }

        match self.lookup.get_country_from_ip().await {
            Ok(raw) => {
                let code = normalize_code(&raw).ok_or(CountryError::InvalidCode { code: raw })?;
                self.write(&code, now, false).await?;
                tracing::debug!(%code, "country detected");
                Ok(code)
            }
            Err(err) => match cached {
                Some(stale) => {
                    tracing::warn!(error = %err, code = %stale.country_code, "country lookup failed, using stale cache");
                    Ok(stale.country_code)
                }
                None => Err(err.into()),
            },
        }
    }

    /// Record a country the user picked or confirmed.
    pub async fn confirm(&self, country_code: &str) -> Result<(), CountryError> {
        let code = normalize_code(country_code).ok_or_else(|| CountryError::InvalidCode {
            code: country_code.to_string(),
        })?;
        let now = self.time.physical_time().await?;
        self.write(&code, now, true).await
    }

    /// Mark the cached country as confirmed, as requested by a
    /// `countryConfirmed` launch link. Returns false when nothing is cached.
    pub async fn mark_confirmed(&self) -> Result<bool, CountryError> {
        let Some(mut entry) = self.cached().await? else {
            return Ok(false);
        };
        entry.confirmed = true;
        self.storage.store_json(&self.key, &entry).await?;
        Ok(true)
    }

    /// Whether the cached country is user-confirmed
    pub async fn is_confirmed(&self) -> Result<bool, CountryError> {
        Ok(self.cached().await?.is_some_and(|e| e.confirmed))
    }

    /// Forget the cached country
    pub async fn clear(&self) -> Result<(), CountryError> {
        self.storage.remove(&self.key).await?;
        Ok(())
    }

    async fn write(&self, code: &str, now: PhysicalTime, confirmed: bool) -> Result<(), CountryError> {
        let entry = CountryCacheEntry {
            country_code: code.to_string(),
            fetched_at: now,
            confirmed,
        };
        self.storage.store_json(&self.key, &entry).await?;
        Ok(())
    }
}
