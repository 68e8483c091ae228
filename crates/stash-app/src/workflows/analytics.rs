//! Analytics sinks.
//!
//! [`AttributedAnalytics`] adds the flattened attribution map to every event
//! before forwarding it. Properties set by the caller win over attribution
//! keys with the same name.

use crate::attribution::AttributionStore;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Event properties
pub type Properties = BTreeMap<String, String>;

/// Destination for analytics events
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    /// Record `event`. Delivery failures are the sink's concern.
    async fn track(&self, event: &str, properties: Properties);
}

/// Build a property map from pairs
pub fn properties<I, K, V>(pairs: I) -> Properties
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Enriches events with attribution data
pub struct AttributedAnalytics {
    inner: Arc<dyn AnalyticsSink>,
    attribution: Arc<AttributionStore>,
}

impl std::fmt::Debug for AttributedAnalytics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributedAnalytics")
            .field("attribution", &self.attribution)
            .finish_non_exhaustive()
    }
}

impl AttributedAnalytics {
    /// Wrap `inner`
    pub fn new(inner: Arc<dyn AnalyticsSink>, attribution: Arc<AttributionStore>) -> Self {
        Self { inner, attribution }
    }
}

#[async_trait]
impl AnalyticsSink for AttributedAnalytics {
    async fn track(&self, event: &str, properties: Properties) {
        let mut enriched = match self.attribution.attribution_for_event().await {
            Ok(map) => map,
            Err(err) => {
                tracing::warn!(%event, error = %err, "sending event without attribution");
                Properties::new()
            }
        };
        enriched.extend(properties);
        self.inner.track(event, enriched).await;
    }
}

/// Logs events through `tracing`
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAnalytics;

#[async_trait]
impl AnalyticsSink for TracingAnalytics {
    async fn track(&self, event: &str, properties: Properties) {
        tracing::info!(%event, ?properties, "analytics event");
    }
}

/// A recorded event
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TrackedEvent {
    /// Event name
    pub name: String,
    /// Properties as delivered
    pub properties: Properties,
}

/// Keeps every event in memory. Clones share the log.
#[derive(Clone, Debug, Default)]
pub struct RecordingAnalytics {
    events: Arc<Mutex<Vec<TrackedEvent>>>,
}

impl RecordingAnalytics {
    /// Empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event so far
    pub fn events(&self) -> Vec<TrackedEvent> {
        self.events.lock().clone()
    }

    /// Event names in order
    pub fn names(&self) -> Vec<String> {
        self.events.lock().iter().map(|e| e.name.clone()).collect()
    }

    /// Most recent event named `name`
    pub fn last_named(&self, name: &str) -> Option<TrackedEvent> {
        self.events.lock().iter().rev().find(|e| e.name == name).cloned()
    }
}

#[async_trait]
impl AnalyticsSink for RecordingAnalytics {
    async fn track(&self, event: &str, properties: Properties) {
        self.events.lock().push(TrackedEvent {
            name: event.to_string(),
            properties,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stash_effects::{MemoryStorageHandler, SimulatedTimeHandler};

    #[tokio::test]
    async fn test_events_carry_attribution() {
        let attribution = Arc::new(AttributionStore::new(
            Arc::new(MemoryStorageHandler::new()),
            Arc::new(SimulatedTimeHandler::new(5_000)),
            "stash",
        ));
        attribution
            .capture_from_url("https://stash.app/?utm_source=podcast&utm_campaign=spring")
            .await
            .unwrap();

        let recorder = RecordingAnalytics::new();
        let analytics = AttributedAnalytics::new(Arc::new(recorder.clone()), attribution);
        analytics
            .track(
                "deposit_started",
                properties([("method", "bank_transfer"), ("utm_source", "override")]),
            )
            .await;

        let event = recorder.last_named("deposit_started").unwrap();
        assert_eq!(event.properties["method"], "bank_transfer");
        assert_eq!(event.properties["utm_source"], "override");
        assert_eq!(event.properties["utm_campaign"], "spring");
        assert_eq!(event.properties["first_touch_utm_source"], "podcast");
        assert!(event.properties.contains_key("session_id"));
    }
}
