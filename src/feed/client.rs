use crate::feed::item::Item;
use crate::feed::kind::FeedKind;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";

const MAX_LIST_SIZE: usize = 10 * 1024 * 1024; // 10MB
const MAX_ITEM_SIZE: usize = 1024 * 1024; // 1MB

/// Errors from a single upstream request.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Request did not complete within the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Response body exceeded the size limit for its endpoint
    #[error("Response too large")]
    ResponseTooLarge,
    /// Body was not the JSON shape the endpoint promises
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
    /// The API answered `null` for this identifier
    #[error("Item {0} not found")]
    Missing(u64),
}

/// Upstream the engine reads from.
///
/// [`HnClient`] is the production implementation; tests plug in stubs to
/// control latency and failures.
pub trait FeedSource: Send + Sync + 'static {
    /// Ordered identifiers for one feed. One request, no retries.
    fn fetch_ids(&self, kind: FeedKind)
        -> impl Future<Output = Result<Vec<u64>, FetchError>> + Send;

    /// One item record.
    fn fetch_item(&self, id: u64) -> impl Future<Output = Result<Item, FetchError>> + Send;
}

/// HTTP client for the Hacker News Firebase API.
#[derive(Debug, Clone)]
pub struct HnClient {
    http: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
}

impl HnClient {
    /// `max_idle` caps pooled idle connections to the API host; pass the
    /// aggregator's concurrency so every admission slot can reuse one.
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
        max_idle: usize,
    ) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("codehn/", env!("CARGO_PKG_VERSION")))
            .pool_max_idle_per_host(max_idle)
            .pool_idle_timeout(Duration::from_secs(30))
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn item_url(&self, id: u64) -> String {
        format!("{}/item/{}.json", self.base_url, id)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, limit: usize) -> Result<T, FetchError> {
        let response = tokio::time::timeout(self.request_timeout, self.http.get(url).send())
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(FetchError::Network)?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        let bytes = read_limited_bytes(response, limit).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl FeedSource for HnClient {
    async fn fetch_ids(&self, kind: FeedKind) -> Result<Vec<u64>, FetchError> {
        let url = kind.list_url(&self.base_url);
        let ids: Vec<u64> = self.get_json(&url, MAX_LIST_SIZE).await?;
        tracing::debug!(feed = %kind, count = ids.len(), "Fetched story identifiers");
        Ok(ids)
    }

    async fn fetch_item(&self, id: u64) -> Result<Item, FetchError> {
        let item: Option<Item> = self.get_json(&self.item_url(id), MAX_ITEM_SIZE).await?;
        item.ok_or(FetchError::Missing(id))
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> HnClient {
        HnClient::new(format!("{}/v0", server.uri()), Duration::from_secs(5), 4).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_ids_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v0/newstories.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[3, 1, 2]"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let ids = client.fetch_ids(FeedKind::New).await.unwrap();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn test_fetch_ids_http_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1) // No retry
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        match client.fetch_ids(FeedKind::Top).await.unwrap_err() {
            FetchError::HttpStatus(503) => {}
            e => panic!("Expected HttpStatus(503), got {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_fetch_ids_malformed_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        match client.fetch_ids(FeedKind::Best).await.unwrap_err() {
            FetchError::Decode(_) => {}
            e => panic!("Expected Decode error, got {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_fetch_item_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v0/item/8863.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"by":"dhouston","id":8863,"score":111,"time":1175714200,
                    "title":"My YC app","type":"story","url":"https://github.com/x"}"#,
            ))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let item = client.fetch_item(8863).await.unwrap();
        assert_eq!(item.id, 8863);
        assert_eq!(item.by, "dhouston");
        assert_eq!(item.url, "https://github.com/x");
    }

    #[tokio::test]
    async fn test_fetch_item_null_is_missing() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("null"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        match client.fetch_item(7).await.unwrap_err() {
            FetchError::Missing(7) => {}
            e => panic!("Expected Missing(7), got {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_fetch_item_too_large() {
        let mock_server = MockServer::start().await;
        let huge = format!(r#"{{"id":1,"title":"{}"}}"#, "a".repeat(MAX_ITEM_SIZE));
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(huge))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        match client.fetch_item(1).await.unwrap_err() {
            FetchError::ResponseTooLarge => {}
            e => panic!("Expected ResponseTooLarge, got {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_fetch_item_timeout() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"id":1}"#)
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let client =
            HnClient::new(format!("{}/v0", mock_server.uri()), Duration::from_millis(50), 1)
                .unwrap();
        let err = client.fetch_item(1).await.unwrap_err();
        assert!(
            matches!(err, FetchError::Timeout | FetchError::Network(_)),
            "Expected a timeout, got {:?}",
            err
        );
    }

    #[tokio::test]
    async fn test_base_url_trailing_slash_trimmed() {
        let client = HnClient::new("https://example.com/v0/", Duration::from_secs(1), 10).unwrap();
        assert_eq!(client.base_url(), "https://example.com/v0");
        assert_eq!(client.item_url(5), "https://example.com/v0/item/5.json");
    }

    #[tokio::test]
    async fn test_single_idle_connection_serves_sequential_requests() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v0/item/1.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id":1}"#))
            .expect(3)
            .mount(&mock_server)
            .await;

        let client =
            HnClient::new(format!("{}/v0", mock_server.uri()), Duration::from_secs(5), 1).unwrap();
        for _ in 0..3 {
            assert_eq!(client.fetch_item(1).await.unwrap().id, 1);
        }
    }
}
