//! # Attribution Store
//!
//! Persists one [`AttributionRecord`] per device under `<prefix>:attribution`.
//!
//! Merge rules:
//! - the first capture (no `first_visit_timestamp` yet) becomes `first_touch`
//!   and seeds `attribution_data`; `first_touch` is never written again
//! - every later capture replaces `last_touch` and overwrites the fields it
//!   carries in `attribution_data`
//! - captures without any marketing parameter are ignored
//!
//! Expiry is a read-time check: stale records stay on disk until
//! [`AttributionStore::clear`], but [`AttributionStore::has_attribution`]
//! and [`AttributionStore::attribution_for_event`] treat them as absent.

use super::params::{strip_query, AttributionParams};
use super::AttributionError;
use serde::{Deserialize, Serialize};
use stash_core::{
    PhysicalTime, PhysicalTimeEffects, StorageEffects, StorageError, StorageJsonExt, MS_PER_DAY,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Default attribution window.
pub const DEFAULT_WINDOW_DAYS: u64 = 30;

/// Where a capture came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureSource {
    /// Web landing URL
    Url,
    /// App deep link
    DeepLink,
}

/// One captured visit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouchPoint {
    /// Marketing parameters of the visit
    #[serde(flatten)]
    pub params: AttributionParams,
    /// Capture time
    pub timestamp: PhysicalTime,
    /// Landing page without its query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landing_page: Option<String>,
    /// Capture source
    pub source: CaptureSource,
    /// Session the capture happened in
    pub session_id: String,
}

/// Persisted attribution state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributionRecord {
    /// Current merged parameters
    #[serde(default)]
    pub attribution_data: AttributionParams,
    /// First capture, write-once
    #[serde(default)]
    pub first_touch: Option<TouchPoint>,
    /// Most recent capture after the first
    #[serde(default)]
    pub last_touch: Option<TouchPoint>,
    /// Time of the first capture
    #[serde(default)]
    pub first_visit_timestamp: Option<PhysicalTime>,
    /// Time of the most recent capture
    #[serde(default)]
    pub last_visit_timestamp: Option<PhysicalTime>,
    /// Stable per-install id
    #[serde(default)]
    pub device_id: Option<String>,
    /// Number of accepted captures
    #[serde(default)]
    pub capture_count: u32,
}

impl AttributionRecord {
    /// Whether any capture has been recorded
    pub fn has_capture(&self) -> bool {
        self.first_visit_timestamp.is_some()
    }

    /// Whether the first visit is more than `window_days` before `now`.
    /// Records without a visit never expire.
    pub fn is_expired_at(&self, now: PhysicalTime, window_days: u64) -> bool {
        self.first_visit_timestamp
            .is_some_and(|first| now.exceeds_window(first, window_days.saturating_mul(MS_PER_DAY)))
    }
}

/// Result of a capture call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Recorded as the first touch
    FirstTouch,
    /// Recorded as the last touch
    LastTouch,
    /// No marketing parameters; nothing written
    Ignored,
}

/// Captures, merges and reads attribution.
pub struct AttributionStore {
    storage: Arc<dyn StorageEffects>,
    time: Arc<dyn PhysicalTimeEffects>,
    key: String,
    window_days: u64,
    session_id: String,
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for AttributionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributionStore")
            .field("key", &self.key)
            .field("window_days", &self.window_days)
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

impl AttributionStore {
    /// Store under `<prefix>:attribution` with a fresh session id.
    pub fn new(
        storage: Arc<dyn StorageEffects>,
        time: Arc<dyn PhysicalTimeEffects>,
        storage_prefix: &str,
    ) -> Self {
        Self {
            storage,
            time,
            key: format!("{storage_prefix}:attribution"),
            window_days: DEFAULT_WINDOW_DAYS,
            session_id: Uuid::new_v4().to_string(),
            write_lock: Mutex::new(()),
        }
    }

    /// Override the attribution window
    #[must_use]
    pub fn with_window_days(mut self, window_days: u64) -> Self {
        self.window_days = window_days;
        self
    }

    /// Storage key of the record
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Id of this store instance's session
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Configured attribution window
    pub fn window_days(&self) -> u64 {
        self.window_days
    }

    /// Load the persisted record. A corrupt record is logged and treated as
    /// empty.
    pub async fn load(&self) -> Result<AttributionRecord, AttributionError> {
        match self.storage.retrieve_json::<AttributionRecord>(&self.key).await {
            Ok(record) => Ok(record.unwrap_or_default()),
            Err(StorageError::Serialization(reason)) => {
                tracing::warn!(key = %self.key, %reason, "discarding unreadable attribution record");
                Ok(AttributionRecord::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Capture parameters from a web landing URL.
    #[tracing::instrument(skip(self, url))]
    pub async fn capture_from_url(&self, url: &str) -> Result<CaptureOutcome, AttributionError> {
        let params = AttributionParams::from_url(url)?;
        self.capture(params, strip_query(url), CaptureSource::Url).await
    }

    /// Capture parameters from an app deep link.
    #[tracing::instrument(skip(self, link))]
    pub async fn capture_from_deep_link(&self, link: &str) -> Result<CaptureOutcome, AttributionError> {
        let params = AttributionParams::from_deep_link(link)?;
        self.capture(params, strip_query(link), CaptureSource::DeepLink).await
    }

    /// Merge already-parsed parameters into the record.
    pub async fn capture(
        &self,
        params: AttributionParams,
        landing_page: Option<String>,
        source: CaptureSource,
    ) -> Result<CaptureOutcome, AttributionError> {
        if params.is_empty() {
            return Ok(CaptureOutcome::Ignored);
        }

        let _guard = self.write_lock.lock().await;
        let now = self.time.physical_time().await?;
        let mut record = self.load().await?;
        if record.device_id.is_none() {
            record.device_id = Some(Uuid::new_v4().to_string());
        }

        let touch = TouchPoint {
            params: params.clone(),
            timestamp: now,
            landing_page,
            source,
            session_id: self.session_id.clone(),
        };

        let outcome = if record.has_capture() {
            record.attribution_data.merge_present(&params);
            record.last_touch = Some(touch);
            CaptureOutcome::LastTouch
        } else {
            record.first_visit_timestamp = Some(now);
            record.attribution_data = params;
            record.first_touch = Some(touch);
            CaptureOutcome::FirstTouch
        };
        record.last_visit_timestamp = Some(now);
        record.capture_count = record.capture_count.saturating_add(1);

        self.storage.store_json(&self.key, &record).await?;
        tracing::debug!(?outcome, captures = record.capture_count, "attribution captured");
        Ok(outcome)
    }

    /// Whether the first visit lies more than `window_days` in the past.
    pub async fn is_attribution_expired(&self, window_days: u64) -> Result<bool, AttributionError> {
        let record = self.load().await?;
        let now = self.time.physical_time().await?;
        Ok(record.is_expired_at(now, window_days))
    }

    /// Whether usable attribution exists: captured and within the configured
    /// window.
    pub async fn has_attribution(&self) -> Result<bool, AttributionError> {
        let record = self.load().await?;
        if !record.has_capture() {
            return Ok(false);
        }
        let now = self.time.physical_time().await?;
        Ok(!record.is_expired_at(now, self.window_days))
    }

    /// Whether any capture is stored, expired or not.
    pub async fn has_stored_attribution(&self) -> Result<bool, AttributionError> {
        Ok(self.load().await?.has_capture())
    }

    /// Stable per-install id, created on first use.
    pub async fn device_id(&self) -> Result<String, AttributionError> {
        let _guard = self.write_lock.lock().await;
        let mut record = self.load().await?;
        if let Some(id) = &record.device_id {
            return Ok(id.clone());
        }
        let id = Uuid::new_v4().to_string();
        record.device_id = Some(id.clone());
        self.storage.store_json(&self.key, &record).await?;
        Ok(id)
    }

    /// Flat property map attached to outbound analytics events: current
    /// parameters, `first_touch_*`, `last_touch_*`, visit times and ids.
    /// Expired attribution contributes only the device and session ids.
    pub async fn attribution_for_event(&self) -> Result<BTreeMap<String, String>, AttributionError> {
        let record = self.load().await?;
        let now = self.time.physical_time().await?;
        let mut out = BTreeMap::new();

        out.insert("session_id".to_string(), self.session_id.clone());
        if let Some(device_id) = &record.device_id {
            out.insert("device_id".to_string(), device_id.clone());
        }
        if !record.has_capture() || record.is_expired_at(now, self.window_days) {
            return Ok(out);
        }

        for (name, value) in record.attribution_data.fields() {
            if let Some(value) = value {
                out.insert(name.to_string(), value.to_string());
            }
        }
        for (prefix, touch) in [("first_touch", &record.first_touch), ("last_touch", &record.last_touch)] {
            let Some(touch) = touch else { continue };
            for (name, value) in touch.params.fields() {
                if let Some(value) = value {
                    out.insert(format!("{prefix}_{name}"), value.to_string());
                }
            }
            out.insert(format!("{prefix}_timestamp"), touch.timestamp.ts_ms.to_string());
            if let Some(page) = &touch.landing_page {
                out.insert(format!("{prefix}_landing_page"), page.clone());
            }
        }
        if let Some(first) = record.first_visit_timestamp {
            out.insert("first_visit_timestamp".to_string(), first.ts_ms.to_string());
        }
        if let Some(last) = record.last_visit_timestamp {
            out.insert("last_visit_timestamp".to_string(), last.ts_ms.to_string());
        }
        Ok(out)
    }

    /// Drop all captured attribution. The device id survives.
    pub async fn clear(&self) -> Result<(), AttributionError> {
        let _guard = self.write_lock.lock().await;
        let record = self.load().await?;
        match record.device_id {
            Some(device_id) => {
                let kept = AttributionRecord {
                    device_id: Some(device_id),
                    ..AttributionRecord::default()
                };
                self.storage.store_json(&self.key, &kept).await?;
            }
            None => {
                self.storage.remove(&self.key).await?;
            }
        }
        tracing::debug!(key = %self.key, "attribution cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stash_effects::{MemoryStorageHandler, SimulatedTimeHandler};

    const START_MS: u64 = 1_700_000_000_000;

    fn store() -> (AttributionStore, SimulatedTimeHandler, MemoryStorageHandler) {
        let storage = MemoryStorageHandler::new();
        let clock = SimulatedTimeHandler::new(START_MS);
        let store = AttributionStore::new(Arc::new(storage.clone()), Arc::new(clock.clone()), "stash");
        (store, clock, storage)
    }

    #[tokio::test]
    async fn test_first_touch_is_write_once() {
        let (store, clock, _) = store();
        let first = store
            .capture_from_url("https://stash.app/?utm_source=google&utm_medium=cpc")
            .await
            .unwrap();
        assert_eq!(first, CaptureOutcome::FirstTouch);

        clock.advance_days(2);
        let second = store
            .capture_from_url("https://stash.app/?utm_source=newsletter")
            .await
            .unwrap();
        assert_eq!(second, CaptureOutcome::LastTouch);

        let record = store.load().await.unwrap();
        let first_touch = record.first_touch.unwrap();
        assert_eq!(first_touch.params.utm_source.as_deref(), Some("google"));
        assert_eq!(first_touch.timestamp.ts_ms, START_MS);
        let last_touch = record.last_touch.unwrap();
        assert_eq!(last_touch.params.utm_source.as_deref(), Some("newsletter"));
        assert_eq!(record.attribution_data.utm_source.as_deref(), Some("newsletter"));
        assert_eq!(record.attribution_data.utm_medium.as_deref(), Some("cpc"));
        assert_eq!(record.first_visit_timestamp.map(|t| t.ts_ms), Some(START_MS));
        assert_eq!(record.capture_count, 2);
    }

    #[tokio::test]
    async fn test_empty_capture_ignored() {
        let (store, _, storage) = store();
        let outcome = store.capture_from_url("https://stash.app/card").await.unwrap();
        assert_eq!(outcome, CaptureOutcome::Ignored);
        assert!(storage.is_empty());
        assert!(!store.has_stored_attribution().await.unwrap());
    }

    #[tokio::test]
    async fn test_expiry_window() {
        let (store, clock, _) = store();
        store.capture_from_url("https://stash.app/?gclid=abc").await.unwrap();
        clock.advance_time(31 * MS_PER_DAY);

        assert!(store.is_attribution_expired(30).await.unwrap());
        assert!(!store.is_attribution_expired(60).await.unwrap());
        assert!(!store.has_attribution().await.unwrap());
        assert!(store.has_stored_attribution().await.unwrap());
    }

    #[tokio::test]
    async fn test_event_properties_flattened() {
        let (store, clock, _) = store();
        store
            .capture_from_deep_link("stash://deposit?utm_source=push&ref=friend1")
            .await
            .unwrap();
        clock.advance_time(1_000);
        store
            .capture_from_url("https://stash.app/?utm_source=ad&utm_campaign=fall")
            .await
            .unwrap();

        let props = store.attribution_for_event().await.unwrap();
        assert_eq!(props.get("utm_source").map(String::as_str), Some("ad"));
        assert_eq!(props.get("first_touch_utm_source").map(String::as_str), Some("push"));
        assert_eq!(props.get("first_touch_referral_code").map(String::as_str), Some("FRIEND1"));
        assert_eq!(props.get("last_touch_utm_campaign").map(String::as_str), Some("fall"));
        assert_eq!(
            props.get("first_touch_landing_page").map(String::as_str),
            Some("stash://deposit")
        );
        assert_eq!(props.get("session_id").map(String::as_str), Some(store.session_id()));
        assert!(props.contains_key("device_id"));
    }

    #[tokio::test]
    async fn test_expired_event_properties_keep_ids_only() {
        let (store, clock, _) = store();
        store.capture_from_url("https://stash.app/?utm_source=x").await.unwrap();
        clock.advance_days(45);
        let props = store.attribution_for_event().await.unwrap();
        assert!(!props.contains_key("utm_source"));
        assert!(props.contains_key("device_id"));
        assert!(props.contains_key("session_id"));
    }

    #[tokio::test]
    async fn test_clear_keeps_device_id() {
        let (store, _, _) = store();
        store.capture_from_url("https://stash.app/?utm_source=x").await.unwrap();
        let device = store.device_id().await.unwrap();
        store.clear().await.unwrap();

        assert!(!store.has_stored_attribution().await.unwrap());
        assert_eq!(store.device_id().await.unwrap(), device);
        assert_eq!(
            store.capture_from_url("https://stash.app/?utm_source=y").await.unwrap(),
            CaptureOutcome::FirstTouch
        );
    }

    #[tokio::test]
    async fn test_corrupt_record_treated_as_empty() {
        let (store, _, storage) = store();
        storage.store(store.key(), b"{not json".to_vec()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), AttributionRecord::default());
        assert_eq!(
            store.capture_from_url("https://stash.app/?utm_source=x").await.unwrap(),
            CaptureOutcome::FirstTouch
        );
    }
}
