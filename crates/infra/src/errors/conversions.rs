//! Conversions from external infrastructure errors into domain errors.

use feedline_domain::FeedlineError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub FeedlineError);

impl From<InfraError> for FeedlineError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<FeedlineError> for InfraError {
    fn from(value: FeedlineError) -> Self {
        InfraError(value)
    }
}

trait IntoFeedlineError {
    fn into_feedline(self) -> FeedlineError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → FeedlineError */
/* -------------------------------------------------------------------------- */

impl IntoFeedlineError for HttpError {
    fn into_feedline(self) -> FeedlineError {
        // The configured limit is unknown here; `HttpClient` rewrites
        // timeouts with its own value.
        if self.is_timeout() {
            return FeedlineError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return FeedlineError::Network(format!("HTTP connection failure: {self}"));
        }

        if self.is_decode() {
            return FeedlineError::Decode(self.to_string());
        }

        if let Some(status) = self.status() {
            return FeedlineError::Upstream { status: status.as_u16(), body: String::new() };
        }

        if self.is_builder() {
            return FeedlineError::Config(format!("invalid HTTP request: {self}"));
        }

        FeedlineError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_feedline())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → FeedlineError */
/* -------------------------------------------------------------------------- */

impl IntoFeedlineError for serde_json::Error {
    fn into_feedline(self) -> FeedlineError {
        FeedlineError::Decode(format!("invalid JSON payload: {self}"))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(value.into_feedline())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use reqwest::{Client, StatusCode};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn http_status_503_maps_to_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(StatusCode::SERVICE_UNAVAILABLE))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let mapped: FeedlineError = InfraError::from(error).into();
        assert_eq!(mapped, FeedlineError::Upstream { status: 503, body: String::new() });
    }

    #[tokio::test]
    async fn refused_connection_maps_to_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let uri = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(uri).send().await.unwrap_err();

        let mapped: FeedlineError = InfraError::from(error).into();
        assert!(matches!(mapped, FeedlineError::Network(_)), "got {mapped:?}");
    }

    #[test]
    fn malformed_json_maps_to_decode_error() {
        let error = serde_json::from_str::<Vec<u32>>("[1, 2").unwrap_err();
        let mapped: FeedlineError = InfraError::from(error).into();
        assert!(matches!(mapped, FeedlineError::Decode(msg) if msg.contains("invalid JSON")));
    }
}
