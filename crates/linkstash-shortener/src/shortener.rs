use crate::error::Result;
use async_trait::async_trait;
use linkstash_core::LinkEntity;
use serde::{Deserialize, Serialize};

/// Outcome of shortening a single URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortened {
    /// The short id now pointing at the URL.
    pub id: String,
    /// `false` when the URL was already stored and `id` is the existing one.
    pub created: bool,
}

/// One entry of a batch shorten request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    pub correlation_id: String,
    pub original_url: String,
}

/// One entry of a batch shorten response, in request order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchShortened {
    pub correlation_id: String,
    pub id: String,
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Shortens `original_url` on behalf of `owner_id`.
    async fn shorten(&self, owner_id: &str, original_url: &str) -> Result<Shortened>;

    /// Shortens many URLs at once. Either every item is stored or the call
    /// fails.
    async fn shorten_batch(&self, owner_id: &str, items: Vec<BatchItem>)
        -> Result<Vec<BatchShortened>>;

    /// Returns the original URL behind `id`.
    async fn expand(&self, id: &str) -> Result<String>;

    /// Lists the owner's links that have not been deleted.
    async fn list(&self, owner_id: &str) -> Result<Vec<LinkEntity>>;

    /// Schedules the owner's links for deletion and returns without waiting.
    async fn delete(&self, owner_id: &str, ids: Vec<String>) -> Result<()>;

    async fn ping(&self) -> Result<()>;
}

/// Builds the full short URL for `id` under `base_url`.
pub fn short_url(base_url: &str, id: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), id)
}
