//! Resilience decorator for news repositories

use std::sync::Arc;

use async_trait::async_trait;
use feedline_common::resilience::ResiliencePipeline;
use feedline_domain::{FeedlineError, NewsItem, Result};
use tracing::instrument;

use super::ports::NewsRepository;

/// Runs every call of the wrapped repository through one resilience pipeline.
///
/// All methods share the pipeline, and therefore its circuit breaker: a
/// backend that keeps failing `news_list` also short-circuits `news_by_id`.
pub struct ResilientNewsRepository {
    inner: Arc<dyn NewsRepository>,
    pipeline: Arc<ResiliencePipeline<FeedlineError>>,
}

impl ResilientNewsRepository {
    pub fn new(inner: Arc<dyn NewsRepository>, pipeline: Arc<ResiliencePipeline<FeedlineError>>) -> Self {
        Self { inner, pipeline }
    }

    /// The pipeline shared by every method
    pub fn pipeline(&self) -> &ResiliencePipeline<FeedlineError> {
        &self.pipeline
    }
}

#[async_trait]
impl NewsRepository for ResilientNewsRepository {
    #[instrument(skip(self))]
    async fn news_list(&self) -> Result<Vec<NewsItem>> {
        self.pipeline.execute(|| self.inner.news_list()).await
    }

    #[instrument(skip(self))]
    async fn news_by_id(&self, id: &str) -> Result<NewsItem> {
        self.pipeline.execute(|| self.inner.news_by_id(id)).await
    }
}
