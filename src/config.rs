use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Locator of the game feed: an `http(s)://` URL or a path under `public_dir`
    #[serde(default = "default_games_source_url")]
    pub games_source_url: String,

    /// Directory holding local catalog snapshots (also served statically)
    #[serde(default = "default_public_dir")]
    pub public_dir: String,

    /// Path of the bundled snapshot used as the last-resort fallback
    #[serde(default = "default_snapshot_path")]
    pub default_snapshot_path: String,

    /// Public base URL of this service, used to fetch path locators over HTTP
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Same-origin proxy to route remote feed requests through, for
    /// deployments without direct egress
    #[serde(default)]
    pub feed_proxy_url: Option<String>,

    /// Host that relative embed URLs are rebased on
    #[serde(default = "default_embed_host")]
    pub embed_host: String,

    /// Timeout for a single feed HTTP request
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// How long a successfully loaded catalog stays fresh
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// How long to wait before retrying after a failed refresh
    #[serde(default = "default_failure_retry_secs")]
    pub failure_retry_secs: u64,

    /// Keep serving the last good catalog when a refresh fails
    #[serde(default = "default_true")]
    pub preserve_catalog_on_failure: bool,

    /// Whether text search also matches category names
    #[serde(default = "default_true")]
    pub search_includes_categories: bool,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_games_source_url() -> String {
    "https://www.onlinegames.io/media/plugins/genGames/embed.json".to_string()
}

fn default_public_dir() -> String {
    "public".to_string()
}

fn default_snapshot_path() -> String {
    "/games.json".to_string()
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_embed_host() -> String {
    "https://www.onlinegames.io".to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_failure_retry_secs() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            games_source_url: default_games_source_url(),
            public_dir: default_public_dir(),
            default_snapshot_path: default_snapshot_path(),
            base_url: default_base_url(),
            feed_proxy_url: None,
            embed_host: default_embed_host(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            failure_retry_secs: default_failure_retry_secs(),
            preserve_catalog_on_failure: true,
            search_includes_categories: true,
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn failure_retry(&self) -> Duration {
        Duration::from_secs(self.failure_retry_secs)
    }

    /// True when the feed locator is a remote URL rather than a snapshot path
    pub fn source_is_remote(&self) -> bool {
        is_remote_locator(&self.games_source_url)
    }

    /// Resolves a snapshot path like `/games.json` inside `public_dir`
    pub fn public_file(&self, locator: &str) -> PathBuf {
        PathBuf::from(&self.public_dir).join(locator.trim_start_matches('/'))
    }

    /// URL the remote acquisition stage should GET
    pub fn remote_feed_url(&self) -> String {
        if self.source_is_remote() {
            self.feed_proxy_url
                .clone()
                .unwrap_or_else(|| self.games_source_url.clone())
        } else {
            let path = self.games_source_url.trim_start_matches('/');
            format!("{}/{}", self.base_url.trim_end_matches('/'), path)
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub fn is_remote_locator(locator: &str) -> bool {
    locator.starts_with("http://") || locator.starts_with("https://")
}
