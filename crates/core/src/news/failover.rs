//! Primary/fallback composition for news repositories

use std::sync::Arc;

use async_trait::async_trait;
use feedline_common::resilience::ResilienceFailure;
use feedline_domain::{FeedlineError, NewsItem, Result};
use tracing::{instrument, warn};

use super::ports::NewsRepository;
use crate::selection::{CircuitOpenPreferFallback, RepositorySelectionStrategy, Selection};

/// Serves each call from the primary, falling back to a secondary source
/// when the selection strategy says so or the primary's breaker is open.
///
/// No retries happen here; those belong to the primary's own pipeline. When
/// the fallback also fails, its error is the one returned.
pub struct FailoverCompositeNewsRepository {
    primary: Arc<dyn NewsRepository>,
    fallback: Arc<dyn NewsRepository>,
    strategy: Arc<dyn RepositorySelectionStrategy<FeedlineError>>,
}

impl FailoverCompositeNewsRepository {
    /// Compose with the default [`CircuitOpenPreferFallback`] strategy
    pub fn new(primary: Arc<dyn NewsRepository>, fallback: Arc<dyn NewsRepository>) -> Self {
        Self::with_strategy(primary, fallback, Arc::new(CircuitOpenPreferFallback))
    }

    pub fn with_strategy(
        primary: Arc<dyn NewsRepository>,
        fallback: Arc<dyn NewsRepository>,
        strategy: Arc<dyn RepositorySelectionStrategy<FeedlineError>>,
    ) -> Self {
        Self { primary, fallback, strategy }
    }

    fn should_fall_back(&self, operation: &'static str, error: &FeedlineError) -> bool {
        let fall_back =
            self.strategy.pick(error) == Selection::Fallback || error.is_circuit_open();
        if fall_back {
            warn!(operation, error = %error, "primary failed, serving from fallback");
        }
        fall_back
    }
}

#[async_trait]
impl NewsRepository for FailoverCompositeNewsRepository {
    #[instrument(skip(self))]
    async fn news_list(&self) -> Result<Vec<NewsItem>> {
        match self.primary.news_list().await {
            Ok(items) => Ok(items),
            Err(error) if self.should_fall_back("news_list", &error) => self.fallback.news_list().await,
            Err(error) => Err(error),
        }
    }

    #[instrument(skip(self))]
    async fn news_by_id(&self, id: &str) -> Result<NewsItem> {
        match self.primary.news_by_id(id).await {
            Ok(item) => Ok(item),
            Err(error) if self.should_fall_back("news_by_id", &error) => {
                self.fallback.news_by_id(id).await
            }
            Err(error) => Err(error),
        }
    }
}
