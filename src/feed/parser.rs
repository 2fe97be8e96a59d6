use chrono::{DateTime, Utc};
use url::Url;

use super::date::{parse_rfc2822, parse_w3cdtf};
use super::model::{Feed, FeedFormat, Item, ItemStatus};
use super::xml::{Document, Element};
use crate::convert::ConversionError;
use crate::util::{resolve_link, strip_control_chars};

pub const RSS1_NS: &str = "http://purl.org/rss/1.0/";
pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
pub const CONTENT_NS: &str = "http://purl.org/rss/1.0/modules/content/";

/// Decides which variant parser handles `doc`, from the root element alone.
///
/// - `rdf:RDF` root, or any root in the RSS 1.0 namespace → [`FeedFormat::Rss1`]
/// - `<rss>` root → [`FeedFormat::Rss2`]
/// - anything else (Atom, HTML, ...) → `None`
pub fn classify(doc: &Document) -> Option<FeedFormat> {
    let root = &doc.root;
    if root.local_name == "RDF" || root.namespace.as_deref() == Some(RSS1_NS) {
        Some(FeedFormat::Rss1)
    } else if root.local_name == "rss" {
        Some(FeedFormat::Rss2)
    } else {
        None
    }
}

/// Parses a feed with `last_checked` set to the current time.
///
/// Returns `None` when the document is not a recognized feed or lacks its
/// channel element. Missing fields inside the channel or items are tolerated.
pub fn parse_feed(doc: &Document) -> Option<Feed> {
    parse_feed_at(doc, Utc::now())
}

/// Like [`parse_feed`], with the parse time supplied by the caller.
pub fn parse_feed_at(doc: &Document, now: DateTime<Utc>) -> Option<Feed> {
    let format = match classify(doc) {
        Some(format) => format,
        None => {
            tracing::debug!(root = %doc.root.local_name, "Document is not an RSS 1.0 or 2.0 feed");
            return None;
        }
    };

    let feed = match format {
        FeedFormat::Rss1 => parse_rss1(doc, now),
        FeedFormat::Rss2 => parse_rss2(doc, now),
    };

    if feed.is_none() {
        tracing::debug!(format = ?format, "Feed has no channel element");
    }
    feed
}

/// Parses raw bytes: malformed XML is an error, a non-feed document is `None`.
pub fn parse_feed_bytes(bytes: &[u8]) -> Result<Option<Feed>, ConversionError> {
    let doc = Document::parse(bytes)?;
    Ok(parse_feed(&doc))
}

/// RSS 1.0: the channel may sit in any namespace; items are siblings of the
/// channel in the document's default namespace, dated by `dc:date`.
///
/// A root without a default namespace declaration leaves channel fields and
/// items unqualified, so they are matched without a namespace.
fn parse_rss1(doc: &Document, now: DateTime<Utc>) -> Option<Feed> {
    let root = &doc.root;
    let channel = root.descendants().find(|e| e.local_name == "channel")?;

    let ns = root.attribute("xmlns").filter(|ns| !ns.is_empty());

    let link = resolve_link(channel.child_text(ns, "link").unwrap_or_default(), None);

    let items = root
        .descendants()
        .filter(|e| e.is(ns, "item"))
        .map(|item| {
            let publish_time = dc_date(item).and_then(parse_w3cdtf);
            let fields = ItemFields {
                explicit_guid: item.attribute("rdf:about"),
                title: item.child_text(ns, "title"),
                summary: item.child_text(ns, "description"),
                content: item.child_text(Some(CONTENT_NS), "encoded"),
                link: item.child_text(ns, "link"),
                publish_time,
            };
            fields.into_item(link.as_ref())
        })
        .collect();

    Some(Feed::new(
        FeedFormat::Rss1,
        clean(channel.child_text(ns, "title")),
        clean(channel.child_text(ns, "description")),
        link,
        items,
        now,
    ))
}

/// RSS 2.0: `<channel>` must be a direct child of `<rss>`; items are
/// unqualified `<item>` elements anywhere in the document, dated by
/// `pubDate`. RSS 0.91/0.92 publishers sometimes place them beside the
/// channel rather than inside it.
fn parse_rss2(doc: &Document, now: DateTime<Utc>) -> Option<Feed> {
    let channel = doc.root.child(None, "channel")?;

    let link = resolve_link(channel.child_text(None, "link").unwrap_or_default(), None);

    let items = doc
        .root
        .descendants()
        .filter(|e| e.is(None, "item") && e.prefix.is_none())
        .map(|item| {
            let publish_time = item.child_text(None, "pubDate").and_then(parse_rfc2822);
            let fields = ItemFields {
                explicit_guid: item.child_text(None, "guid"),
                title: item.child_text(None, "title"),
                summary: item.child_text(None, "description"),
                content: item.child_text(Some(CONTENT_NS), "encoded"),
                link: item.child_text(None, "link"),
                publish_time,
            };
            fields.into_item(link.as_ref())
        })
        .collect();

    Some(Feed::new(
        FeedFormat::Rss2,
        clean(channel.child_text(None, "title")),
        clean(channel.child_text(None, "description")),
        link,
        items,
        now,
    ))
}

/// `dc:date`, also accepting a `dc` prefix that was never declared.
fn dc_date(item: &Element) -> Option<&str> {
    item.child_text(Some(DC_NS), "date").or_else(|| {
        item.children
            .iter()
            .find(|c| c.local_name == "date" && c.prefix.as_deref() == Some("dc"))
            .map(|c| c.text.as_str())
    })
}

struct ItemFields<'a> {
    explicit_guid: Option<&'a str>,
    title: Option<&'a str>,
    summary: Option<&'a str>,
    content: Option<&'a str>,
    link: Option<&'a str>,
    publish_time: Option<DateTime<Utc>>,
}

impl ItemFields<'_> {
    fn into_item(self, base: Option<&Url>) -> Item {
        let title = clean(self.title);
        let link = self.link.and_then(|raw| resolve_link(raw, base));
        let guid = Item::generate_guid(self.explicit_guid, link.as_ref(), &title, self.publish_time);

        Item {
            guid,
            title,
            summary: clean(self.summary),
            content: clean(self.content),
            link,
            publish_time: self.publish_time,
            status: ItemStatus::Unread,
        }
    }
}

fn clean(text: Option<&str>) -> String {
    text.map(|t| strip_control_chars(t.trim()).into_owned())
        .unwrap_or_default()
}
