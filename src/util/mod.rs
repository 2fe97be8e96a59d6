//! Utility functions shared by the HTTP and parsing layers.
//!
//! - **Query merging**: add or overwrite query parameters without duplicating keys
//! - **Link resolution**: absolute and channel-relative item links
//! - **Text sanitizing**: strip control characters from feed-supplied strings
//!
//! # Examples
//!
//! ```
//! use rssfetch::util::merge_query;
//! use url::Url;
//!
//! let url = Url::parse("https://example.com/notice?lang=en&ver=0.9").unwrap();
//! let merged = merge_query(&url, [("ver", "1.0.2")]);
//! assert_eq!(merged.as_str(), "https://example.com/notice?lang=en&ver=1.0.2");
//! ```

mod links;
mod text;

pub use links::{merge_query, resolve_link};
pub use text::strip_control_chars;
