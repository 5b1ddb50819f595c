//! Load state for dashboard panels and stale-response handling.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::client::{AnalyticsClient, FetchError};
use crate::core::features::Feature;
use crate::core::series::ChartWindow;

/// One result type for every panel. Fetch failures always end up as a
/// visible `Error`, never as an empty panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum PanelState<T> {
    Loading,
    Error(String),
    Ready(T),
}

impl<T> PanelState<T> {
    pub fn from_result(what: &str, result: Result<T, FetchError>) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(e) => {
                tracing::warn!(panel = what, error = %e, "fetch failed");
                Self::Error(format!("Failed to load {}: {}", what, e))
            }
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(v) => Some(v),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> PanelState<U> {
        match self {
            Self::Loading => PanelState::Loading,
            Self::Error(msg) => PanelState::Error(msg),
            Self::Ready(v) => PanelState::Ready(f(v)),
        }
    }

    pub fn as_ref(&self) -> PanelState<&T> {
        match self {
            Self::Loading => PanelState::Loading,
            Self::Error(msg) => PanelState::Error(msg.clone()),
            Self::Ready(v) => PanelState::Ready(v),
        }
    }
}

/// Stats and daily series of one feature. Each side resolves on its own,
/// so a failed chart does not hide the stat cards.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureSnapshot<S, D> {
    pub feature: Feature,
    pub window: ChartWindow,
    pub stats: PanelState<S>,
    pub daily: PanelState<D>,
}

impl<S, D> FeatureSnapshot<S, D> {
    pub fn loading(feature: Feature, window: ChartWindow) -> Self {
        Self {
            feature,
            window,
            stats: PanelState::Loading,
            daily: PanelState::Loading,
        }
    }
}

/// Fetch stats and daily series concurrently.
pub async fn load_snapshot<S, D>(
    client: &AnalyticsClient,
    feature: Feature,
    window: ChartWindow,
) -> FeatureSnapshot<S, D>
where
    S: DeserializeOwned,
    D: DeserializeOwned,
{
    let (stats, daily) = tokio::join!(
        client.fetch_stats::<S>(feature),
        client.fetch_daily::<D>(feature, window),
    );
    FeatureSnapshot {
        feature,
        window,
        stats: PanelState::from_result("statistics", stats),
        daily: PanelState::from_result("daily usage", daily),
    }
}

/// Monotonic ticket counter. Only the latest ticket may publish results.
#[derive(Debug, Default)]
pub struct RequestGeneration(AtomicU64);

impl RequestGeneration {
    pub fn begin(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.0.load(Ordering::SeqCst) == ticket
    }
}

/// A feature view whose window can change while a load is in flight.
pub struct Dashboard<S, D> {
    client: AnalyticsClient,
    feature: Feature,
    generation: RequestGeneration,
    current: Mutex<FeatureSnapshot<S, D>>,
}

impl<S, D> Dashboard<S, D>
where
    S: DeserializeOwned,
    D: DeserializeOwned,
{
    pub fn new(client: AnalyticsClient, feature: Feature, window: ChartWindow) -> Self {
        Self {
            client,
            feature,
            generation: RequestGeneration::default(),
            current: Mutex::new(FeatureSnapshot::loading(feature, window)),
        }
    }

    /// Load `window`. Returns false when a newer refresh superseded this
    /// one; its result is dropped.
    pub async fn refresh(&self, window: ChartWindow) -> bool {
        let ticket = self.generation.begin();
        let snapshot = load_snapshot(&self.client, self.feature, window).await;

        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if !self.generation.is_current(ticket) {
            tracing::debug!(ticket, feature = self.feature.id(), "discarding stale response");
            return false;
        }
        *current = snapshot;
        true
    }

    pub fn into_snapshot(self) -> FeatureSnapshot<S, D> {
        self.current.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}
