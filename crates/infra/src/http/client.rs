use std::time::Duration;

use feedline_domain::constants::DEFAULT_REQUEST_TIMEOUT_MS;
use feedline_domain::FeedlineError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::debug;

use crate::errors::InfraError;

/// Thin HTTP transport over reqwest.
///
/// Each [`send`](HttpClient::send) is exactly one attempt. Retries, deadlines
/// and circuit breaking are layered on top by the resilience pipeline.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    timeout: Duration,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, FeedlineError> {
        Self::builder().build()
    }

    /// Transport-level timeout applied to every request
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the provided request builder once.
    ///
    /// Any HTTP status is returned as a response; only transport failures
    /// become errors.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, FeedlineError> {
        let request = builder.build().map_err(|err| FeedlineError::from(InfraError::from(err)))?;

        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending HTTP request");

        match self.client.execute(request).await {
            Ok(response) => {
                debug!(%method, %url, status = %response.status(), "received HTTP response");
                Ok(response)
            }
            Err(err) => {
                debug!(%method, %url, error = %err, "HTTP request failed");
                Err(self.map_error(err))
            }
        }
    }

    /// Read the whole response body as text.
    ///
    /// The client timeout also covers the body, and expiring there is
    /// reported the same way as during [`send`](HttpClient::send).
    pub async fn read_text(&self, response: Response) -> Result<String, FeedlineError> {
        response.text().await.map_err(|err| self.map_error(err))
    }

    /// Convert a reqwest error, reporting timeouts with this client's limit
    pub(crate) fn map_error(&self, err: reqwest::Error) -> FeedlineError {
        if err.is_timeout() {
            FeedlineError::Timeout { limit: self.timeout }
        } else {
            InfraError::from(err).into()
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
    authorization: Option<String>,
    default_headers: HeaderMap,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        Self {
            timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            user_agent: None,
            authorization: None,
            default_headers,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Send `value` verbatim as the `Authorization` header on every request
    pub fn authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    /// Merge extra headers over the JSON defaults
    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers.extend(headers);
        self
    }

    pub fn build(self) -> Result<HttpClient, FeedlineError> {
        let mut headers = self.default_headers;
        if let Some(token) = self.authorization {
            let mut value = HeaderValue::from_str(&token).map_err(|_| {
                FeedlineError::Config("API token is not a valid header value".to_string())
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder =
            ReqwestClient::builder().timeout(self.timeout).default_headers(headers).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder.build().map_err(|err| FeedlineError::from(InfraError::from(err)))?;

        Ok(HttpClient { client, timeout: self.timeout })
    }
}
