use std::path::PathBuf;

use crate::{
    error::AppResult,
    models::RawRecord,
    services::providers::{records_from_document, FeedSource},
};

/// Feed snapshot stored on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalFileSource {
    path: PathBuf,
}

impl LocalFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl FeedSource for LocalFileSource {
    async fn fetch(&self) -> AppResult<Vec<RawRecord>> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let document = serde_json::from_str(&content)?;
        let records = records_from_document(document);

        tracing::info!(
            path = %self.path.display(),
            records = records.len(),
            provider = "local_file",
            "Loaded catalog snapshot"
        );

        Ok(records)
    }

    fn name(&self) -> &'static str {
        "local_file"
    }

    fn locator(&self) -> String {
        self.path.display().to_string()
    }
}
