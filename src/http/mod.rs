//! HTTP acquisition layer.
//!
//! - `client` - one request per call, `If-None-Match` revalidation, size-limited body reads
//! - `etag` - per-resource entity tag cache shared between clients
//! - `typed` - fetch-and-convert helpers (JSON, XML, feeds, update messages)
//!
//! A non-success HTTP status is never an error here. The raw [`FetchResponse`]
//! exposes the status code, and the typed helpers collapse it to `Ok(None)`.

mod client;
mod etag;
mod typed;

pub use client::{
    ConditionalFetchClient, FetchError, FetchOptions, FetchResponse, DEFAULT_MAX_BODY_BYTES,
    DEFAULT_TIMEOUT,
};
pub use etag::EtagCache;
