//! Concurrency-limited fetch client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Semaphore, broadcast};
use url::Url;

use super::error::FetchError;
use super::{Fetch, FetchEvent, FetchResponse};

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 20;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Capacity of the lifecycle event channel. Slow subscribers lose the
/// oldest events rather than applying backpressure to fetching.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Configuration for the bounded client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Maximum requests in flight at any instant.
    pub max_concurrent: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl ClientConfig {
    /// Create a config with default limits.
    pub fn new() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set the maximum number of concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport with the given request timeout.
    pub fn new(timeout_secs: u64) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl Fetch for HttpTransport {
    async fn get(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        let response = self.http.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;

        Ok(FetchResponse {
            status: status.as_u16(),
            body,
        })
    }
}

/// Fetch client enforcing a maximum number of simultaneous in-flight
/// requests.
///
/// At most `max_concurrent` requests are in flight at any instant; excess
/// callers wait on a fair queue and are admitted in submission order, and
/// no queued request is ever dropped. Share one client between streams
/// (`Arc<BoundedClient<_>>`) so they compete for the same slots — the
/// streams never do their own admission control.
pub struct BoundedClient<T = HttpTransport> {
    transport: T,
    semaphore: Arc<Semaphore>,
    events: broadcast::Sender<FetchEvent>,
}

impl BoundedClient<HttpTransport> {
    /// Create a bounded client over a real HTTP transport.
    pub fn new(config: ClientConfig) -> Result<Self, FetchError> {
        let transport = HttpTransport::new(config.timeout_secs)?;
        Ok(Self::with_transport(transport, &config))
    }
}

impl<T: Fetch> BoundedClient<T> {
    /// Create a bounded client over an arbitrary transport.
    pub fn with_transport(transport: T, config: &ClientConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            transport,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
            events,
        }
    }

    /// Subscribe to request lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<FetchEvent> {
        self.events.subscribe()
    }

    /// Number of request slots currently free.
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[async_trait]
impl<T: Fetch> Fetch for BoundedClient<T> {
    async fn get(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        // Tokio's semaphore is fair: waiters are admitted in the order
        // they arrived, which is the queue discipline callers rely on.
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| FetchError::Closed)?;

        let _ = self.events.send(FetchEvent::RequestStarted { url: url.clone() });

        let result = self.transport.get(url).await;

        let _ = self.events.send(FetchEvent::ResponseReceived {
            url: url.clone(),
            success: result.is_ok(),
        });

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MockTransport;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn config_builder() {
        let config = ClientConfig::new().with_max_concurrent(5).with_timeout(10);
        assert_eq!(config.max_concurrent, 5);
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.max_concurrent, DEFAULT_MAX_CONCURRENT);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn client_creation() {
        let client = BoundedClient::new(ClientConfig::new());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn serves_from_transport() {
        let transport = MockTransport::new();
        transport.insert(url("http://feed.test/a"), "body-a");

        let client = BoundedClient::with_transport(transport, &ClientConfig::new());
        let response = client.get(&url("http://feed.test/a")).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "body-a");
    }

    #[tokio::test]
    async fn missing_url_is_an_error() {
        let transport = MockTransport::new();
        let client = BoundedClient::with_transport(transport, &ClientConfig::new());
        let result = client.get(&url("http://feed.test/nowhere")).await;
        assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
    }

    #[tokio::test]
    async fn concurrency_never_exceeds_limit() {
        let transport = MockTransport::new().with_delay(Duration::from_millis(5));
        let urls: Vec<Url> = (0..10)
            .map(|i| url(&format!("http://feed.test/{i}")))
            .collect();
        for u in &urls {
            transport.insert(u.clone(), "{}");
        }

        let client = Arc::new(BoundedClient::with_transport(
            transport,
            &ClientConfig::new().with_max_concurrent(2),
        ));

        let results = futures::future::join_all(urls.iter().map(|u| {
            let client = Arc::clone(&client);
            async move { client.get(u).await }
        }))
        .await;

        assert!(results.iter().all(Result::is_ok));
        assert!(client.transport.max_in_flight() <= 2);
        assert!(client.transport.max_in_flight() >= 1);
        assert_eq!(client.available_permits(), 2);
    }

    #[tokio::test]
    async fn emits_lifecycle_events() {
        let transport = MockTransport::new();
        transport.insert(url("http://feed.test/a"), "body");
        transport.insert_error(url("http://feed.test/b"), "boom");

        let client = BoundedClient::with_transport(transport, &ClientConfig::new());
        let mut events = client.subscribe();

        client.get(&url("http://feed.test/a")).await.unwrap();
        client.get(&url("http://feed.test/b")).await.unwrap_err();

        match events.try_recv().unwrap() {
            FetchEvent::RequestStarted { url: u } => assert_eq!(u.as_str(), "http://feed.test/a"),
            other => panic!("expected RequestStarted, got {other:?}"),
        }
        match events.try_recv().unwrap() {
            FetchEvent::ResponseReceived { success, .. } => assert!(success),
            other => panic!("expected ResponseReceived, got {other:?}"),
        }
        match events.try_recv().unwrap() {
            FetchEvent::RequestStarted { url: u } => assert_eq!(u.as_str(), "http://feed.test/b"),
            other => panic!("expected RequestStarted, got {other:?}"),
        }
        match events.try_recv().unwrap() {
            FetchEvent::ResponseReceived { success, .. } => assert!(!success),
            other => panic!("expected ResponseReceived, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn failure_does_not_poison_the_client() {
        let transport = MockTransport::new();
        transport.insert_error(url("http://feed.test/bad"), "boom");
        transport.insert(url("http://feed.test/good"), "fine");

        let client = BoundedClient::with_transport(transport, &ClientConfig::new());
        client.get(&url("http://feed.test/bad")).await.unwrap_err();
        let response = client.get(&url("http://feed.test/good")).await.unwrap();
        assert_eq!(response.body, "fine");
    }
}
