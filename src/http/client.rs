use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, ETAG, IF_NONE_MATCH, PRAGMA};
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::etag::EtagCache;
use crate::convert::ConversionError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while fetching and converting a remote document.
///
/// A non-success HTTP status is not an error: it is reported through
/// [`FetchResponse::status`] and collapses to `Ok(None)` in the typed helpers.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, body decoding, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// The exchange exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// A request URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// Response body exceeded the configured size limit
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    /// The body was fetched but could not be converted to the requested type
    #[error("Conversion failed: {0}")]
    Conversion(#[from] ConversionError),
}

/// Request shaping options for a [`ConditionalFetchClient`].
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Sent as `User-Agent`. Empty means the header is omitted entirely.
    pub user_agent: String,
    /// Send `If-None-Match` from the cache and record `ETag` from responses.
    pub enable_etag: bool,
    /// Advertise gzip/deflate and decode compressed bodies transparently.
    pub enable_compression: bool,
    /// Upper bound for send + headers + body.
    pub timeout: Duration,
    pub max_body_bytes: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            user_agent: String::new(),
            enable_etag: true,
            enable_compression: true,
            timeout: DEFAULT_TIMEOUT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// A fully read HTTP response.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub url: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Decompressed body bytes.
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn etag(&self) -> Option<&str> {
        self.headers.get(ETAG).and_then(|v| v.to_str().ok())
    }
}

/// HTTP client that revalidates resources with entity tags.
///
/// Every request disables intermediary caching (`Cache-Control: no-cache,
/// no-store`), so revalidation happens only through the explicit
/// `If-None-Match` logic here. Entity tags are stored per request URL in an
/// [`EtagCache`]; a response without `ETag` clears the stored tag.
///
/// No retries are performed. The client is cheap to clone and clones share
/// the same cache.
#[derive(Debug, Clone)]
pub struct ConditionalFetchClient {
    http: reqwest::Client,
    options: FetchOptions,
    etags: Arc<EtagCache>,
}

impl ConditionalFetchClient {
    /// Builds a client with a private entity tag cache.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Network`] if the underlying HTTP client cannot be
    /// built (for example, a user agent that is not a valid header value).
    pub fn new(options: FetchOptions) -> Result<Self, FetchError> {
        Self::with_cache(options, Arc::new(EtagCache::default()))
    }

    /// Builds a client that reads and writes entity tags in `etags`.
    pub fn with_cache(options: FetchOptions, etags: Arc<EtagCache>) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder()
            .gzip(options.enable_compression)
            .deflate(options.enable_compression)
            .pool_idle_timeout(Duration::from_secs(30)) // Close idle connections promptly
            .tcp_keepalive(Duration::from_secs(60));

        if !options.user_agent.is_empty() {
            builder = builder.user_agent(options.user_agent.clone());
        }

        let http = builder.build()?;

        Ok(Self {
            http,
            options,
            etags,
        })
    }

    pub fn etag_cache(&self) -> &Arc<EtagCache> {
        &self.etags
    }

    /// Entity tag that the next request to `url` will carry, if any.
    pub fn last_etag(&self, url: &Url) -> Option<String> {
        self.etags.get(url.as_str())
    }

    /// Performs a single GET request and reads the whole body.
    ///
    /// The stages run strictly in order: send, receive headers, read body,
    /// update the entity tag, return. If the timeout fires at any stage the
    /// request is abandoned and the cached entity tag is left untouched.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Network`] - connection, TLS or decoding failures
    /// - [`FetchError::Timeout`] - the exchange exceeded [`FetchOptions::timeout`]
    /// - [`FetchError::ResponseTooLarge`] - body exceeded [`FetchOptions::max_body_bytes`]
    /// - [`FetchError::IncompleteResponse`] - body shorter than `Content-Length`
    pub async fn fetch(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        let resource = url.as_str();
        let headers = self.request_headers(url);

        let request = self.http.get(url.clone()).headers(headers);
        let max_body_bytes = self.options.max_body_bytes;

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = read_limited_bytes(response, max_body_bytes).await?;
            Ok::<_, FetchError>((status, headers, body))
        };

        let (status, headers, body) = tokio::time::timeout(self.options.timeout, exchange)
            .await
            .map_err(|_| FetchError::Timeout)??;

        self.record_etag(resource, &headers);

        tracing::debug!(
            url = %url,
            status = status.as_u16(),
            bytes = body.len(),
            "Fetched resource"
        );

        Ok(FetchResponse {
            url: url.clone(),
            status,
            headers,
            body,
        })
    }

    fn request_headers(&self, url: &Url) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache, no-store"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

        if self.options.enable_etag {
            if let Some(tag) = self.etags.get(url.as_str()) {
                match HeaderValue::from_str(&tag) {
                    Ok(value) => {
                        headers.insert(IF_NONE_MATCH, value);
                    }
                    Err(e) => {
                        tracing::warn!(url = %url, error = %e, "Cached entity tag is not a valid header value, skipping");
                    }
                }
            }
        }

        headers
    }

    fn record_etag(&self, resource: &str, headers: &HeaderMap) {
        let tag = headers
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty());

        match tag {
            Some(tag) if self.options.enable_etag => self.etags.insert(resource, tag),
            _ => {
                self.etags.remove(resource);
            }
        }
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Content-Length describes the encoded body; skip checks when it may be compressed
    let expected_length = if response.headers().contains_key(reqwest::header::CONTENT_ENCODING) {
        None
    } else {
        response.content_length()
    };

    if let Some(len) = expected_length {
        if len > limit as u64 {
            return Err(FetchError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
