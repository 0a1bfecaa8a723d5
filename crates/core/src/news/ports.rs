//! Port interfaces for news retrieval
//!
//! Implemented by the concrete data sources in `feedline-infra` and by the
//! decorators in this crate, so a decorated repository can stand in wherever
//! a plain one is expected.

use async_trait::async_trait;
use feedline_domain::{NewsItem, Result};

/// Trait for news retrieval
#[async_trait]
pub trait NewsRepository: Send + Sync {
    /// Fetch the full news list
    async fn news_list(&self) -> Result<Vec<NewsItem>>;

    /// Fetch one news item
    ///
    /// # Errors
    /// Returns `FeedlineError::NotFound` when the source has no such item.
    async fn news_by_id(&self, id: &str) -> Result<NewsItem>;
}
