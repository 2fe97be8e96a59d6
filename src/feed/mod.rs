//! RSS 1.0 / RSS 2.0 parsing into one normalized model.
//!
//! - [`xml`] - namespace-aware element tree built with quick-xml
//! - [`parser`] - format classification and the two variant parsers
//! - [`model`] - [`Feed`] and [`Item`], with the publish-time ordering rule
//! - [`date`] - RFC 2822 (`pubDate`) and W3C-DTF (`dc:date`) timestamps
//!
//! # Example
//!
//! ```
//! use rssfetch::feed::{parse_feed_bytes, FeedFormat};
//!
//! let xml = br#"<rss version="2.0"><channel><title>Demo</title></channel></rss>"#;
//! let feed = parse_feed_bytes(xml).unwrap().unwrap();
//! assert_eq!(feed.title, "Demo");
//! assert_eq!(feed.format, FeedFormat::Rss2);
//! ```

pub mod date;
pub mod model;
pub mod parser;
pub mod xml;

pub use model::{sort_items, Feed, FeedFormat, Item, ItemStatus};
pub use parser::{classify, parse_feed, parse_feed_at, parse_feed_bytes};
pub use xml::{Document, Element};
