use std::time::Duration;

use reqwest::Client as HttpClient;
use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    models::RawRecord,
    services::providers::{records_from_document, FeedSource},
};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Game feed served over HTTP (the upstream itself, or the same-origin proxy)
#[derive(Clone)]
pub struct HttpFeedSource {
    http_client: HttpClient,
    url: String,
}

impl HttpFeedSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            url: url.into(),
        })
    }

    /// Fetches the feed document without unwrapping it
    pub async fn fetch_document(&self) -> AppResult<Value> {
        let response = self.http_client.get(&self.url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::ExternalApi(format!(
                "Feed returned status {} from {}",
                status, self.url
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self) -> AppResult<Vec<RawRecord>> {
        let records = records_from_document(self.fetch_document().await?);

        tracing::info!(
            url = %self.url,
            records = records.len(),
            provider = "http_feed",
            "Fetched catalog feed"
        );

        Ok(records)
    }

    fn name(&self) -> &'static str {
        "http_feed"
    }

    fn locator(&self) -> String {
        self.url.clone()
    }
}
