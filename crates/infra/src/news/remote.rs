//! HTTP-backed news repository

use async_trait::async_trait;
use feedline_core::NewsRepository;
use feedline_domain::{FeedlineError, NewsItem, RepositoryConfig, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::errors::InfraError;
use crate::http::HttpClient;

const NEWS_PATH: [&str; 2] = ["api", "noticias"];

/// Reads news from the remote API.
///
/// - `GET {base}/api/noticias` lists every item
/// - `GET {base}/api/noticias/{id}` fetches one item
///
/// Every call is a single HTTP attempt.
pub struct RemoteNewsRepository {
    http: HttpClient,
    base_url: Url,
}

impl RemoteNewsRepository {
    /// # Errors
    /// Returns `FeedlineError::Config` if `base_url` is not an absolute
    /// http(s) URL.
    pub fn new(http: HttpClient, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| FeedlineError::Config(format!("Invalid api_base_url '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(FeedlineError::Config(format!("api_base_url '{base_url}' cannot be a base URL")));
        }
        Ok(Self { http, base_url })
    }

    /// Build the HTTP client and repository from repository settings
    pub fn from_config(config: &RepositoryConfig) -> Result<Self> {
        let mut builder = HttpClient::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("feedline/", env!("CARGO_PKG_VERSION")));
        if let Some(token) = &config.api_token {
            builder = builder.authorization(token.clone());
        }
        Self::new(builder.build()?, &config.api_base_url)
    }

    fn endpoint(&self, id: Option<&str>) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                FeedlineError::Config(format!("api_base_url '{}' cannot be a base URL", self.base_url))
            })?;
            segments.pop_if_empty().extend(NEWS_PATH);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.http.send(self.http.request(Method::GET, url)).await?;
        let status = response.status();

        if !status.is_success() {
            let body = match self.http.read_text(response).await {
                Ok(body) => body,
                Err(error) => {
                    warn!(%status, error = %error, "failed to read error response body");
                    String::new()
                }
            };
            debug!(%status, body = %body, "news API returned an error status");
            return Err(FeedlineError::Upstream { status: status.as_u16(), body });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = self.http.read_text(response).await?;

        if !content_type.contains("application/json") {
            return Err(FeedlineError::Decode(format!(
                "expected application/json, API returned '{content_type}'"
            )));
        }

        serde_json::from_str(&body).map_err(|e| InfraError::from(e).into())
    }
}

#[async_trait]
impl NewsRepository for RemoteNewsRepository {
    #[instrument(skip(self))]
    async fn news_list(&self) -> Result<Vec<NewsItem>> {
        let items: Vec<NewsItem> = self.get_json(self.endpoint(None)?).await?;
        debug!(count = items.len(), "fetched news list");
        Ok(items)
    }

    #[instrument(skip(self))]
    async fn news_by_id(&self, id: &str) -> Result<NewsItem> {
        self.get_json(self.endpoint(Some(id))?).await
    }
}
