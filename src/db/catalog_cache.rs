use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use crate::{
    config::Config,
    models::Game,
    services::{
        acquirer::{Acquisition, FeedAcquirer},
        normalizer::{build_catalog, Normalizer},
    },
};

pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_FAILURE_RETRY: Duration = Duration::from_secs(60);

/// What to do with the current catalog when every feed source fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Keep serving the last non-empty catalog, flagged as retained
    KeepLastGood,
    /// Replace the catalog with an empty one
    ReplaceWithEmpty,
}

#[derive(Debug, Clone, Copy)]
pub struct CacheSettings {
    /// Freshness window after a successful load
    pub ttl: Duration,
    /// Freshness window after a failed load, so outages are retried sooner
    pub failure_retry: Duration,
    pub failure_policy: FailurePolicy,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            failure_retry: DEFAULT_FAILURE_RETRY,
            failure_policy: FailurePolicy::KeepLastGood,
        }
    }
}

impl From<&Config> for CacheSettings {
    fn from(config: &Config) -> Self {
        Self {
            ttl: config.cache_ttl(),
            failure_retry: config.failure_retry(),
            failure_policy: if config.preserve_catalog_on_failure {
                FailurePolicy::KeepLastGood
            } else {
                FailurePolicy::ReplaceWithEmpty
            },
        }
    }
}

/// How trustworthy the current snapshot is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotHealth {
    /// Loaded from a source that answered
    Live,
    /// Last good data, kept after a failed refresh
    Retained,
    /// A refresh failed and there was nothing to keep
    Unavailable,
}

/// An immutable, normalized catalog as of `fetched_at`
#[derive(Debug)]
pub struct CatalogSnapshot {
    pub games: Arc<Vec<Game>>,
    pub fetched_at: DateTime<Utc>,
    pub health: SnapshotHealth,
    expires_at: Instant,
}

impl CatalogSnapshot {
    pub fn is_fresh(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheState {
    Empty,
    Fresh,
    Stale,
}

/// Cache status reported to collaborators
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStatus {
    pub state: CacheState,
    pub health: Option<SnapshotHealth>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub game_count: usize,
}

/// In-process catalog cache with lazy, coalesced refresh
///
/// The snapshot is swapped whole behind an `Arc`, so readers always see a
/// complete catalog. A refresh only happens on the first read after expiry;
/// concurrent readers that find the catalog stale wait for that single
/// refresh instead of starting their own.
pub struct CatalogCache {
    acquirer: FeedAcquirer,
    normalizer: Normalizer,
    settings: CacheSettings,
    current: RwLock<Option<Arc<CatalogSnapshot>>>,
    refresh_lock: Mutex<()>,
}

impl CatalogCache {
    pub fn new(acquirer: FeedAcquirer, normalizer: Normalizer, settings: CacheSettings) -> Self {
        Self {
            acquirer,
            normalizer,
            settings,
            current: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Populates the cache eagerly, e.g. at startup
    pub async fn init(&self) -> Arc<CatalogSnapshot> {
        self.get_or_refresh().await
    }

    /// Returns the current snapshot, refreshing first when it is missing or expired
    pub async fn get_or_refresh(&self) -> Arc<CatalogSnapshot> {
        if let Some(snapshot) = self.fresh_snapshot().await {
            return snapshot;
        }

        let _guard = self.refresh_lock.lock().await;

        // Another reader may have refreshed while we waited
        if let Some(snapshot) = self.fresh_snapshot().await {
            return snapshot;
        }

        self.refresh().await
    }

    /// Drops the snapshot; the next read refreshes
    pub async fn invalidate(&self) {
        *self.current.write().await = None;
        tracing::info!("Catalog cache invalidated");
    }

    pub async fn status(&self) -> CatalogStatus {
        match self.current.read().await.as_ref() {
            None => CatalogStatus {
                state: CacheState::Empty,
                health: None,
                fetched_at: None,
                game_count: 0,
            },
            Some(snapshot) => CatalogStatus {
                state: if snapshot.is_fresh() {
                    CacheState::Fresh
                } else {
                    CacheState::Stale
                },
                health: Some(snapshot.health),
                fetched_at: Some(snapshot.fetched_at),
                game_count: snapshot.games.len(),
            },
        }
    }

    async fn fresh_snapshot(&self) -> Option<Arc<CatalogSnapshot>> {
        self.current
            .read()
            .await
            .as_ref()
            .filter(|snapshot| snapshot.is_fresh())
            .cloned()
    }

    async fn refresh(&self) -> Arc<CatalogSnapshot> {
        let outcome = self.acquirer.acquire().await;
        let previous = self.current.read().await.clone();

        let snapshot = match outcome {
            Acquisition::Loaded { records, source } => {
                let games = build_catalog(&self.normalizer, &records);
                tracing::info!(
                    source,
                    records = records.len(),
                    games = games.len(),
                    "Catalog refreshed"
                );
                self.live_snapshot(games)
            }
            Acquisition::Empty => {
                tracing::warn!("Catalog feed is empty");
                self.live_snapshot(Vec::new())
            }
            Acquisition::Failed => self.failed_snapshot(previous),
        };

        let snapshot = Arc::new(snapshot);
        *self.current.write().await = Some(snapshot.clone());
        snapshot
    }

    fn live_snapshot(&self, games: Vec<Game>) -> CatalogSnapshot {
        CatalogSnapshot {
            games: Arc::new(games),
            fetched_at: Utc::now(),
            health: SnapshotHealth::Live,
            expires_at: Instant::now() + self.settings.ttl,
        }
    }

    fn failed_snapshot(&self, previous: Option<Arc<CatalogSnapshot>>) -> CatalogSnapshot {
        let expires_at = Instant::now() + self.settings.failure_retry;

        match (self.settings.failure_policy, previous) {
            (FailurePolicy::KeepLastGood, Some(previous)) if !previous.games.is_empty() => {
                tracing::warn!(
                    games = previous.games.len(),
                    fetched_at = %previous.fetched_at,
                    "Catalog refresh failed, keeping last good catalog"
                );
                CatalogSnapshot {
                    games: previous.games.clone(),
                    fetched_at: previous.fetched_at,
                    health: SnapshotHealth::Retained,
                    expires_at,
                }
            }
            _ => {
                tracing::warn!("Catalog refresh failed, serving empty catalog");
                CatalogSnapshot {
                    games: Arc::new(Vec::new()),
                    fetched_at: Utc::now(),
                    health: SnapshotHealth::Unavailable,
                    expires_at,
                }
            }
        }
    }
}
