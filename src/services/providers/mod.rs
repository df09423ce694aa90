//! Catalog feed sources.
//!
//! A feed is a JSON document that is either a bare array of game records or
//! an object with a `games` array. Each source fetches and unwraps one such
//! document; the acquirer decides the order in which sources are tried.

use serde_json::Value;

use crate::{error::AppResult, models::RawRecord};

pub mod http_feed;
pub mod local_file;

pub use http_feed::HttpFeedSource;
pub use local_file::LocalFileSource;

/// Trait for catalog feed sources
///
/// Implementations return the raw, un-normalized records of one feed
/// document. Errors are reported to the acquirer, which logs them and moves
/// on to the next source.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch and unwrap the feed document
    async fn fetch(&self) -> AppResult<Vec<RawRecord>>;

    /// Source name for logging and debugging
    fn name(&self) -> &'static str;

    /// Where the source reads from (path or URL), for logging
    fn locator(&self) -> String;
}

/// Extracts the record list from a feed document
///
/// Accepts a bare array or an object with a `games` array. Any other shape
/// yields no records.
pub fn records_from_document(document: Value) -> Vec<RawRecord> {
    match document {
        Value::Array(records) => records,
        Value::Object(mut object) => match object.remove("games") {
            Some(Value::Array(records)) => records,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}
