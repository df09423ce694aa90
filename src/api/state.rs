use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    config::Config,
    db::{CacheSettings, CatalogCache},
    error::AppResult,
    services::{
        providers::HttpFeedSource, CatalogService, FeedAcquirer, Normalizer,
        RecommendationEngine,
    },
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub recommendations: RecommendationEngine,
    /// Upstream that `/api/games` passes through; `None` when the feed is local
    pub feed_upstream: Option<HttpFeedSource>,
    /// Directory served for requests no route matches
    pub public_dir: Option<PathBuf>,
}

impl AppState {
    /// Creates state over an existing catalog, with no proxy or static files
    pub fn new(catalog: CatalogService) -> Self {
        Self {
            recommendations: RecommendationEngine::new(catalog.clone()),
            catalog,
            feed_upstream: None,
            public_dir: None,
        }
    }

    pub fn with_feed_upstream(mut self, upstream: HttpFeedSource) -> Self {
        self.feed_upstream = Some(upstream);
        self
    }

    pub fn with_recommendations(mut self, engine: RecommendationEngine) -> Self {
        self.recommendations = engine;
        self
    }

    /// Wires the whole pipeline (sources, cache, query layer, engine) from configuration
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let cache = CatalogCache::new(
            FeedAcquirer::from_config(config)?,
            Normalizer::new(config.embed_host.clone()),
            CacheSettings::from(config),
        );
        let catalog = CatalogService::new(Arc::new(cache))
            .with_category_search(config.search_includes_categories);

        let mut state = Self::new(catalog);
        if config.source_is_remote() {
            state = state.with_feed_upstream(HttpFeedSource::new(
                config.games_source_url.clone(),
                config.fetch_timeout(),
            )?);
        }
        state.public_dir = Some(PathBuf::from(&config.public_dir));

        Ok(state)
    }
}
