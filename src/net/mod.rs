//! Network utilities for HTTP requests, rate limiting, and markup parsing.
//!
//! - **HTTP Client**: a global, configured reqwest client with connection pooling
//! - **Rate Limiting**: a minimum delay between requests to the same host family
//! - **Retry Logic**: retries with exponential backoff on throttling
//! - **Response Cache**: optional in-memory cache of response bodies
//! - **Fetch trait**: the outbound-fetch seam the catalog and mirror resolver use
//! - **Markup Parsing**: HTML helpers in [`html`]
//!
//! # Examples
//!
//! ```rust
//! use bookwyrm::net::HttpClient;
//!
//! # async fn example() -> bookwyrm::Result<()> {
//! let client = HttpClient::new("libgen")
//!     .with_rate_limit(500)
//!     .with_max_retries(3);
//!
//! let html = client.get_text("http://libgen.io/search.php?req=dune").await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use reqwest::{
    Client,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub mod html;

/// Global HTTP client instance.
///
/// Configured with a 30-second timeout, connection pooling, gzip/brotli
/// decompression and redirect following. Built lazily on first use.
static CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(30))
        .user_agent(concat!("bookwyrm/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10)
        .gzip(true)
        .brotli(true)
        .build()
        .expect("Failed to build HTTP client")
});

/// Outbound fetch: an HTTP GET returning the body of a successful response.
///
/// [`HttpClient`] is the production implementation. The catalog and the
/// mirror resolver only depend on this trait, so tests can serve canned
/// bodies without a network.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetches `url` and returns the response body.
    ///
    /// Non-success statuses are errors.
    async fn fetch(&self, url: &str) -> crate::Result<Bytes>;

    /// Fetches `url` and decodes the body as UTF-8.
    async fn fetch_text(&self, url: &str) -> crate::Result<String> {
        let bytes = self.fetch(url).await?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| crate::Error::parse(format!("Invalid UTF-8 from {}: {}", url, e)))
    }
}

/// Rate limiter enforcing a minimum delay between requests per key.
///
/// Uses a `Mutex` internally and is safe to share across tasks.
#[derive(Debug)]
pub struct RateLimiter {
    last_request: Mutex<HashMap<String, Instant>>,
    default_delay: Duration,
}

impl Clone for RateLimiter {
    fn clone(&self) -> Self {
        Self {
            last_request: Mutex::new(HashMap::new()),
            default_delay: self.default_delay,
        }
    }
}

impl RateLimiter {
    /// Creates a rate limiter with the given minimum delay in milliseconds.
    pub fn new(delay_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(HashMap::new()),
            default_delay: Duration::from_millis(delay_ms),
        }
    }

    /// Sleeps until at least the configured delay has passed since the last
    /// request made under `key`, then records the current request.
    pub async fn wait(&self, key: &str) {
        let now = Instant::now();
        let wait_duration = {
            let last_map = self.last_request.lock();
            last_map.get(key).and_then(|&last| {
                let elapsed = now.duration_since(last);
                (elapsed < self.default_delay).then(|| self.default_delay - elapsed)
            })
        };

        if let Some(duration) = wait_duration {
            tokio::time::sleep(duration).await;
        }

        self.last_request
            .lock()
            .insert(key.to_string(), Instant::now());
    }
}

/// Number of bodies a [`ResponseCache`] holds before evicting.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// In-memory cache of successful response bodies, keyed by URL.
///
/// Holds at most `capacity` bodies; inserting past that evicts the oldest
/// entry. Entries live as long as the cache, there is no expiry. Clones
/// share the same storage.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    inner: Arc<Mutex<CacheEntries>>,
    capacity: usize,
}

#[derive(Debug, Default)]
struct CacheEntries {
    bodies: HashMap<String, Bytes>,
    order: VecDeque<String>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl ResponseCache {
    /// Creates a cache holding at most `capacity` bodies (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheEntries::default())),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, url: &str) -> Option<Bytes> {
        self.inner.lock().bodies.get(url).cloned()
    }

    pub fn insert(&self, url: &str, body: Bytes) {
        let mut entries = self.inner.lock();
        if entries.bodies.insert(url.to_string(), body).is_some() {
            return;
        }
        entries.order.push_back(url.to_string());

        while entries.order.len() > self.capacity {
            if let Some(oldest) = entries.order.pop_front() {
                entries.bodies.remove(&oldest);
                debug!(url = %oldest, "response cache eviction");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().bodies.is_empty()
    }
}

/// HTTP client wrapper with rate limiting, retry logic and an optional
/// response cache.
///
/// Each client carries an id used as its rate-limiting key and in error
/// messages.
///
/// ```rust
/// use bookwyrm::net::HttpClient;
///
/// let client = HttpClient::new("libgen")
///     .with_rate_limit(1000)
///     .with_max_retries(5)
///     .with_header("Accept-Language", "en-US,en;q=0.9")
///     .with_cache(true);
/// ```
#[derive(Clone, Debug)]
pub struct HttpClient {
    source_id: String,
    rate_limiter: RateLimiter,
    max_retries: u32,
    headers: HeaderMap,
    cache: Option<ResponseCache>,
}

impl HttpClient {
    /// Creates a client with a 200ms rate limit, 3 retries and no cache.
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            rate_limiter: RateLimiter::new(200),
            max_retries: 3,
            headers: HeaderMap::new(),
            cache: None,
        }
    }

    /// Sets the minimum delay between requests in milliseconds.
    pub fn with_rate_limit(mut self, delay_ms: u64) -> Self {
        self.rate_limiter = RateLimiter::new(delay_ms);
        self
    }

    /// Sets the maximum number of retries for failed requests.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Adds a header sent with every request. Invalid names or values are
    /// ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (name.parse::<HeaderName>(), value.parse::<HeaderValue>()) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Turns the in-memory response cache on or off.
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache = enabled.then(ResponseCache::default);
        self
    }

    /// The response cache, when enabled.
    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }

    /// Performs a GET request with rate limiting and retries.
    ///
    /// 429 responses are retried with exponential backoff; once retries are
    /// exhausted the `Retry-After` header is reported in
    /// [`Error::RateLimit`](crate::Error::RateLimit). Other non-success
    /// statuses fail immediately with [`Error::Source`](crate::Error::Source).
    /// Transport errors are retried after one second.
    pub async fn get(&self, url: &str) -> crate::Result<Bytes> {
        self.get_with_headers(url, HeaderMap::new()).await
    }

    /// Performs a GET request with a `Referer` header.
    ///
    /// Some mirrors only serve a file when the request appears to come from
    /// one of their own pages.
    pub async fn get_with_referer(&self, url: &str, referer: &str) -> crate::Result<Bytes> {
        let mut extra = HeaderMap::new();
        if let Ok(value) = referer.parse::<HeaderValue>() {
            extra.insert(reqwest::header::REFERER, value);
        }
        self.get_with_headers(url, extra).await
    }

    async fn get_with_headers(&self, url: &str, extra: HeaderMap) -> crate::Result<Bytes> {
        if let Some(body) = self.cache.as_ref().and_then(|cache| cache.get(url)) {
            debug!(url, "response cache hit");
            return Ok(body);
        }

        let mut headers = self.headers.clone();
        headers.extend(extra);

        let mut attempts = 0;

        loop {
            self.rate_limiter.wait(&self.source_id).await;
            debug!(url, attempt = attempts + 1, "GET");

            match CLIENT.get(url).headers(headers.clone()).send().await {
                Ok(response) => {
                    if response.status().is_success() {
                        let body = response.bytes().await?;
                        if let Some(cache) = &self.cache {
                            cache.insert(url, body.clone());
                        }
                        return Ok(body);
                    }

                    if response.status() == 429 {
                        if attempts < self.max_retries {
                            attempts += 1;
                            let delay = Duration::from_secs(2_u64.pow(attempts));
                            warn!(url, ?delay, "rate limited, backing off");
                            tokio::time::sleep(delay).await;
                            continue;
                        }

                        let retry_after = response
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok());

                        return Err(crate::Error::rate_limit(retry_after));
                    }

                    return Err(crate::Error::source(
                        &self.source_id,
                        format!("HTTP {} for {}", response.status(), url),
                    ));
                }
                Err(e) => {
                    if attempts < self.max_retries {
                        attempts += 1;
                        warn!(url, error = %e, "request failed, retrying");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }
    }

    /// Performs a GET request and decodes the body as UTF-8.
    pub async fn get_text(&self, url: &str) -> crate::Result<String> {
        let bytes = self.get(url).await?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| crate::Error::parse(format!("Invalid UTF-8: {}", e)))
    }
}

#[async_trait]
impl Fetch for HttpClient {
    async fn fetch(&self, url: &str) -> crate::Result<Bytes> {
        self.get(url).await
    }
}

/// The `scheme://host[:port]/` origin of `url`, used as a same-origin
/// `Referer`.
///
/// ```rust
/// use bookwyrm::net::origin_of;
///
/// assert_eq!(
///     origin_of("http://bookzz.org/dl/1014779/9a9ab2").as_deref(),
///     Some("http://bookzz.org/")
/// );
/// assert_eq!(origin_of("magnet:?xt=urn:btih:abc"), None);
/// ```
pub fn origin_of(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(port) => format!("{}://{}:{}/", parsed.scheme(), host, port),
        None => format!("{}://{}/", parsed.scheme(), host),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn quiet_client() -> HttpClient {
        HttpClient::new("test").with_rate_limit(0).with_max_retries(0)
    }

    #[tokio::test]
    async fn test_get_text_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let body = quiet_client()
            .get_text(&format!("{}/page", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn test_non_success_status_is_source_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = quiet_client().get(&server.uri()).await;
        match result {
            Err(crate::Error::Source { src, message }) => {
                assert_eq!(src, "test");
                assert!(message.contains("503"));
            }
            other => panic!("expected source error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rate_limit_without_retries_reports_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "120"))
            .mount(&server)
            .await;

        let result = quiet_client().get(&server.uri()).await;
        assert!(matches!(
            result,
            Err(crate::Error::RateLimit {
                retry_after: Some(120)
            })
        ));
    }

    #[tokio::test]
    async fn test_referer_header_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("referer", "http://bookzz.org/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("file"))
            .mount(&server)
            .await;

        let body = quiet_client()
            .get_with_referer(&server.uri(), "http://bookzz.org/")
            .await
            .unwrap();
        assert_eq!(&body[..], b"file");
    }

    #[tokio::test]
    async fn test_cache_answers_repeated_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("cached"))
            .expect(1)
            .mount(&server)
            .await;

        let client = quiet_client().with_cache(true);
        let url = format!("{}/search.php?req=dune", server.uri());

        assert_eq!(client.get_text(&url).await.unwrap(), "cached");
        assert_eq!(client.get_text(&url).await.unwrap(), "cached");
        assert_eq!(client.cache().map(ResponseCache::len), Some(1));
    }

    #[test]
    fn test_cache_evicts_oldest_past_capacity() {
        let cache = ResponseCache::with_capacity(2);
        cache.insert("http://a/1", Bytes::from_static(b"one"));
        cache.insert("http://a/2", Bytes::from_static(b"two"));
        cache.insert("http://a/1", Bytes::from_static(b"uno"));
        cache.insert("http://a/3", Bytes::from_static(b"three"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("http://a/1").is_none());
        assert_eq!(cache.get("http://a/2").as_deref(), Some(&b"two"[..]));
        assert_eq!(cache.get("http://a/3").as_deref(), Some(&b"three"[..]));
        assert_eq!(ResponseCache::default().capacity(), DEFAULT_CACHE_CAPACITY);
    }

    #[test]
    fn test_origin_keeps_port() {
        assert_eq!(
            origin_of("http://127.0.0.1:8080/noleech1.php?hidden=1").as_deref(),
            Some("http://127.0.0.1:8080/")
        );
    }

    #[tokio::test]
    async fn test_rate_limiter_delays_second_request() {
        let limiter = RateLimiter::new(50);
        let start = Instant::now();
        limiter.wait("libgen").await;
        limiter.wait("libgen").await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
