use std::sync::Arc;

use crate::{
    config::Config,
    error::AppResult,
    models::RawRecord,
    services::providers::{FeedSource, HttpFeedSource, LocalFileSource},
};

/// Outcome of one acquisition cycle
#[derive(Debug, Clone, PartialEq)]
pub enum Acquisition {
    /// Records were obtained from the named source
    Loaded {
        records: Vec<RawRecord>,
        source: &'static str,
    },
    /// The remote feed answered, but with zero records
    Empty,
    /// Every configured source failed
    Failed,
}

impl Acquisition {
    pub fn into_records(self) -> Vec<RawRecord> {
        match self {
            Acquisition::Loaded { records, .. } => records,
            Acquisition::Empty | Acquisition::Failed => Vec::new(),
        }
    }
}

/// Fetches raw catalog records with a fixed fallback order:
///
/// 1. `primary` (local snapshot): used only when it yields records.
/// 2. `remote` (HTTP): any successful answer ends acquisition.
/// 3. `fallback` (default local snapshot): used only after `remote` fails.
///
/// Acquisition never errors; failures are logged and reported as
/// `Acquisition::Failed`.
#[derive(Clone, Default)]
pub struct FeedAcquirer {
    primary: Option<Arc<dyn FeedSource>>,
    remote: Option<Arc<dyn FeedSource>>,
    fallback: Option<Arc<dyn FeedSource>>,
}

impl FeedAcquirer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_primary(mut self, source: Arc<dyn FeedSource>) -> Self {
        self.primary = Some(source);
        self
    }

    pub fn with_remote(mut self, source: Arc<dyn FeedSource>) -> Self {
        self.remote = Some(source);
        self
    }

    pub fn with_fallback(mut self, source: Arc<dyn FeedSource>) -> Self {
        self.fallback = Some(source);
        self
    }

    /// Wires the stages from configuration
    ///
    /// A path locator is read from the public directory first and then over
    /// HTTP from `base_url`. A remote locator is fetched directly, or through
    /// `feed_proxy_url` when set. The default snapshot is the last resort
    /// unless it is already the primary.
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let mut acquirer = Self::new().with_remote(Arc::new(HttpFeedSource::new(
            config.remote_feed_url(),
            config.fetch_timeout(),
        )?));

        if !config.source_is_remote() {
            acquirer = acquirer.with_primary(Arc::new(LocalFileSource::new(
                config.public_file(&config.games_source_url),
            )));
        }

        if config.games_source_url != config.default_snapshot_path {
            acquirer = acquirer.with_fallback(Arc::new(LocalFileSource::new(
                config.public_file(&config.default_snapshot_path),
            )));
        }

        Ok(acquirer)
    }

    /// Runs the fallback chain
    pub async fn acquire(&self) -> Acquisition {
        if let Some(primary) = &self.primary {
            match primary.fetch().await {
                Ok(records) if !records.is_empty() => {
                    return Acquisition::Loaded {
                        records,
                        source: primary.name(),
                    };
                }
                Ok(_) => tracing::warn!(
                    source = primary.name(),
                    locator = %primary.locator(),
                    "Primary feed source is empty"
                ),
                Err(e) => tracing::warn!(
                    source = primary.name(),
                    locator = %primary.locator(),
                    error = %e,
                    "Primary feed source failed"
                ),
            }
        }

        if let Some(remote) = &self.remote {
            match remote.fetch().await {
                Ok(records) if records.is_empty() => return Acquisition::Empty,
                Ok(records) => {
                    return Acquisition::Loaded {
                        records,
                        source: remote.name(),
                    };
                }
                Err(e) => tracing::warn!(
                    source = remote.name(),
                    locator = %remote.locator(),
                    error = %e,
                    "Remote feed fetch failed"
                ),
            }
        }

        if let Some(fallback) = &self.fallback {
            match fallback.fetch().await {
                Ok(records) if !records.is_empty() => {
                    tracing::info!(
                        records = records.len(),
                        locator = %fallback.locator(),
                        "Using fallback catalog snapshot"
                    );
                    return Acquisition::Loaded {
                        records,
                        source: fallback.name(),
                    };
                }
                Ok(_) => tracing::warn!(
                    locator = %fallback.locator(),
                    "Fallback catalog snapshot is empty"
                ),
                Err(e) => tracing::warn!(
                    locator = %fallback.locator(),
                    error = %e,
                    "Fallback catalog snapshot failed"
                ),
            }
        }

        tracing::error!("All catalog feed sources failed");
        Acquisition::Failed
    }

    /// Raw records from the first source that succeeds; empty when none does.
    /// An empty result means "no data right now", not "catalog deleted".
    pub async fn acquire_raw_catalog(&self) -> Vec<RawRecord> {
        self.acquire().await.into_records()
    }
}
