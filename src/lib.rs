//! # rssfetch
//!
//! Network and parsing core of an RSS reader.
//!
//! ## Architecture
//!
//! ```text
//! Url → ConditionalFetchClient → body bytes → ContentConverter → typed value
//! ```
//!
//! - [`http`]: conditional HTTP client with entity-tag revalidation and
//!   transparent gzip/deflate decoding, plus typed fetch helpers
//! - [`convert`]: byte-to-value converters with a propagate/suppress error policy
//! - [`update`]: parser for the sectioned `[version]` / `KEY=value` update-message format
//! - [`feed`]: RSS 1.0 and RSS 2.0 parsing into one normalized [`Feed`](feed::Feed) model
//! - [`config`]: optional TOML configuration for the HTTP layer
//!
//! Absent results (`Ok(None)`) mean "nothing to show, try again later".
//! Errors mean something is actually broken (network, configuration).

pub mod config;
pub mod convert;
pub mod feed;
pub mod http;
pub mod update;
pub mod util;

pub use convert::{ContentConverter, ConversionError, ConverterKind, ErrorPolicy};
pub use feed::{parse_feed, parse_feed_at, Feed, FeedFormat, Item, ItemStatus};
pub use http::{ConditionalFetchClient, EtagCache, FetchError, FetchOptions, FetchResponse};
pub use update::UpdateMessage;
