//! Composition root for news repositories

use std::sync::Arc;
use std::time::Duration;

use feedline_common::resilience::{policies, BackoffStrategy, ResiliencePipeline};
use feedline_core::{FailoverCompositeNewsRepository, NewsRepository, ResilientNewsRepository};
use feedline_domain::{Config, FeedlineError, RepoKind, RepositoryConfig, ResilienceConfig, Result};
use tracing::info;

use super::mock::MockNewsRepository;
use super::remote::RemoteNewsRepository;

/// Builds the news repository graph from configuration.
///
/// - `mock`: the bundled local source alone
/// - `remote`: `Failover(Resilient(Remote, pipeline), Mock)` with the default
///   circuit-open selection strategy
pub struct NewsRepositoryFactory;

impl NewsRepositoryFactory {
    /// # Errors
    /// Returns `FeedlineError::Config` for invalid resilience settings or an
    /// unusable base URL.
    pub fn create(
        repository: &RepositoryConfig,
        resilience: &ResilienceConfig,
    ) -> Result<Arc<dyn NewsRepository>> {
        let local: Arc<dyn NewsRepository> = Arc::new(MockNewsRepository::new()?);

        match repository.kind {
            RepoKind::Mock => {
                info!(kind = %repository.kind, "news repository uses local data");
                Ok(local)
            }
            RepoKind::Remote => {
                let remote = Arc::new(RemoteNewsRepository::from_config(repository)?);
                let pipeline = Arc::new(Self::build_pipeline(resilience)?);
                let primary = Self::compose_resilient(remote, pipeline);
                info!(
                    kind = %repository.kind,
                    base_url = %repository.api_base_url,
                    "news repository uses remote API with local fallback"
                );
                Ok(Arc::new(FailoverCompositeNewsRepository::new(primary, local)))
            }
        }
    }

    /// Validate and build the repository from the whole configuration
    pub fn build_from_config(config: &Config) -> Result<Arc<dyn NewsRepository>> {
        config.validate()?;
        Self::create(&config.repository, &config.resilience)
    }

    /// Translate resilience settings into a pipeline.
    ///
    /// Stages whose section is `None` are left out. Retries use
    /// [`policies::RetryTransient`], so permanent failures such as a 404 are
    /// returned after the first attempt.
    pub fn build_pipeline(resilience: &ResilienceConfig) -> Result<ResiliencePipeline<FeedlineError>> {
        let mut builder = ResiliencePipeline::<FeedlineError>::builder();

        if let Some(timeout_ms) = resilience.timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        if let Some(retry) = &resilience.retry {
            let backoff = BackoffStrategy::exponential(
                Duration::from_millis(retry.initial_delay_ms),
                retry.multiplier,
            );
            builder = builder
                .retry_with_backoff(retry.max_attempts, backoff)
                .retry_policy(Arc::new(policies::RetryTransient));
        }
        if let Some(breaker) = &resilience.circuit_breaker {
            builder = builder
                .circuit_breaker(breaker.failure_threshold, Duration::from_millis(breaker.cooldown_ms));
        }

        Ok(builder.build()?)
    }

    /// Route every call of `primary` through `pipeline`
    pub fn compose_resilient(
        primary: Arc<dyn NewsRepository>,
        pipeline: Arc<ResiliencePipeline<FeedlineError>>,
    ) -> Arc<dyn NewsRepository> {
        Arc::new(ResilientNewsRepository::new(primary, pipeline))
    }
}

#[cfg(test)]
mod tests {
    use feedline_common::resilience::CircuitState;
    use feedline_domain::{CircuitBreakerSettings, RetrySettings};

    use super::*;

    #[test]
    fn test_default_settings_build_every_stage() {
        let pipeline = NewsRepositoryFactory::build_pipeline(&ResilienceConfig::default()).unwrap();

        assert_eq!(pipeline.timeout(), Some(Duration::from_secs(5)));
        let retry = pipeline.retry_config().unwrap();
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.backoff.delay(1), Duration::from_millis(300));
        assert_eq!(retry.backoff.delay(2), Duration::from_millis(600));
        assert_eq!(pipeline.circuit_breaker().map(|b| b.state()), Some(CircuitState::Closed));
    }

    #[test]
    fn test_disabled_sections_are_left_out() {
        let pipeline = NewsRepositoryFactory::build_pipeline(&ResilienceConfig::disabled()).unwrap();

        assert!(pipeline.timeout().is_none());
        assert!(pipeline.retry_config().is_none());
        assert!(pipeline.circuit_breaker().is_none());
    }

    #[test]
    fn test_invalid_settings_surface_as_config_error() {
        let resilience = ResilienceConfig {
            retry: Some(RetrySettings { max_attempts: 0, ..RetrySettings::default() }),
            circuit_breaker: Some(CircuitBreakerSettings::default()),
            ..ResilienceConfig::default()
        };

        let result = NewsRepositoryFactory::build_pipeline(&resilience);
        assert!(matches!(result, Err(FeedlineError::Config(_))));
    }

    #[tokio::test]
    async fn test_mock_kind_serves_bundled_data() {
        let repo = NewsRepositoryFactory::create(&RepositoryConfig::default(), &ResilienceConfig::default())
            .unwrap();
        assert!(!repo.news_list().await.unwrap().is_empty());
    }

    #[test]
    fn test_remote_kind_without_base_url_is_rejected() {
        let mut config = Config::default();
        config.repository.kind = RepoKind::Remote;

        let result = NewsRepositoryFactory::build_from_config(&config);
        assert!(matches!(result, Err(FeedlineError::Config(_))));
    }
}
