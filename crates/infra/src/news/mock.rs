//! Local news repository backed by bundled data

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use feedline_core::NewsRepository;
use feedline_domain::constants::MOCK_LATENCY_MS;
use feedline_domain::{FeedlineError, NewsItem, Result};
use tracing::instrument;

use crate::errors::InfraError;

const NEWS_FIXTURE: &str = include_str!("../../fixtures/news.json");

/// Serves news from data embedded at compile time.
///
/// Used as the fallback source in remote mode and as the only source in
/// mock mode. Each call sleeps for `latency` first to mimic a network hop.
#[derive(Debug, Clone)]
pub struct MockNewsRepository {
    items: Arc<Vec<NewsItem>>,
    latency: Duration,
}

impl MockNewsRepository {
    /// Load the bundled fixture with the default simulated latency
    ///
    /// # Errors
    /// Returns `FeedlineError::Decode` if the bundled fixture is malformed.
    pub fn new() -> Result<Self> {
        let items: Vec<NewsItem> = serde_json::from_str(NEWS_FIXTURE).map_err(InfraError::from)?;
        Ok(Self::with_items(items))
    }

    /// Serve `items` instead of the bundled fixture
    pub fn with_items(items: Vec<NewsItem>) -> Self {
        Self { items: Arc::new(items), latency: Duration::from_millis(MOCK_LATENCY_MS) }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn without_latency(self) -> Self {
        self.with_latency(Duration::ZERO)
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl NewsRepository for MockNewsRepository {
    #[instrument(skip(self))]
    async fn news_list(&self) -> Result<Vec<NewsItem>> {
        self.simulate_latency().await;
        Ok(self.items.as_ref().clone())
    }

    #[instrument(skip(self))]
    async fn news_by_id(&self, id: &str) -> Result<NewsItem> {
        self.simulate_latency().await;
        self.items
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or_else(|| FeedlineError::NotFound(format!("news item with id {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bundled_fixture_lists_items() {
        let repo = MockNewsRepository::new().unwrap().without_latency();
        let items = repo.news_list().await.unwrap();

        assert_eq!(items.len(), 4);
        assert!(items.iter().all(|item| !item.id.is_empty() && !item.title.is_empty()));
    }

    #[tokio::test]
    async fn test_news_by_id_finds_item() {
        let repo = MockNewsRepository::new().unwrap().without_latency();
        let item = repo.news_by_id("2").await.unwrap();
        assert_eq!(item.title, "Spring hydration tips");
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let repo = MockNewsRepository::new().unwrap().without_latency();
        let result = repo.news_by_id("999").await;
        assert!(matches!(result, Err(FeedlineError::NotFound(msg)) if msg.contains("999")));
    }

    #[tokio::test]
    async fn test_calls_wait_for_simulated_latency() {
        let repo = MockNewsRepository::with_items(Vec::new());
        let started = std::time::Instant::now();

        repo.news_list().await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(MOCK_LATENCY_MS));
    }
}
