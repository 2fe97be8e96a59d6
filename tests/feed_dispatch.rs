//! Integration tests for format dispatch and normalization.
//!
//! RSS 1.0 and RSS 2.0 documents describing the same content must produce the
//! same normalized items, apart from the format tag.

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use rssfetch::feed::{classify, parse_feed_at, parse_feed_bytes, Document};
use rssfetch::update;
use rssfetch::{FeedFormat, ItemStatus};

const RSS1: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<rdf:RDF
  xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
  xmlns:dc="http://purl.org/dc/elements/1.1/"
  xmlns:content="http://purl.org/rss/1.0/modules/content/"
  xmlns="http://purl.org/rss/1.0/">
  <channel rdf:about="https://example.com/">
    <title>Example News</title>
    <link>https://example.com/</link>
    <description>Daily news</description>
  </channel>
  <item rdf:about="https://example.com/undated">
    <title>Undated</title>
    <link>https://example.com/undated</link>
  </item>
  <item rdf:about="https://example.com/launch">
    <title>Launch</title>
    <link>https://example.com/launch</link>
    <description>We launched.</description>
    <content:encoded><![CDATA[<p>We <b>launched</b>.</p>]]></content:encoded>
    <dc:date>2020-06-01T12:00:00Z</dc:date>
  </item>
  <item rdf:about="https://example.com/plans">
    <title>Plans</title>
    <link>https://example.com/plans</link>
    <dc:date>2020-01-01T00:00:00+00:00</dc:date>
  </item>
</rdf:RDF>"#;

const RSS2: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
  <channel>
    <title>Example News</title>
    <link>https://example.com/</link>
    <description>Daily news</description>
    <item>
      <guid>https://example.com/undated</guid>
      <title>Undated</title>
      <link>https://example.com/undated</link>
    </item>
    <item>
      <guid>https://example.com/launch</guid>
      <title>Launch</title>
      <link>https://example.com/launch</link>
      <description>We launched.</description>
      <content:encoded><![CDATA[<p>We <b>launched</b>.</p>]]></content:encoded>
      <pubDate>Mon, 01 Jun 2020 12:00:00 GMT</pubDate>
    </item>
    <item>
      <guid>https://example.com/plans</guid>
      <title>Plans</title>
      <link>https://example.com/plans</link>
      <pubDate>Wed, 01 Jan 2020 00:00:00 +0000</pubDate>
    </item>
  </channel>
</rss>"#;

#[test]
fn test_classify_both_formats() {
    let rss1 = Document::parse(RSS1.as_bytes()).unwrap();
    let rss2 = Document::parse(RSS2.as_bytes()).unwrap();
    assert_eq!(classify(&rss1), Some(FeedFormat::Rss1));
    assert_eq!(classify(&rss2), Some(FeedFormat::Rss2));
}

#[test]
fn test_rss1_and_rss2_normalize_identically() {
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    let rss1 = parse_feed_at(&Document::parse(RSS1.as_bytes()).unwrap(), now).unwrap();
    let rss2 = parse_feed_at(&Document::parse(RSS2.as_bytes()).unwrap(), now).unwrap();

    assert_eq!(rss1.format, FeedFormat::Rss1);
    assert_eq!(rss2.format, FeedFormat::Rss2);
    assert_eq!(rss1.title, rss2.title);
    assert_eq!(rss1.description, rss2.description);
    assert_eq!(rss1.link, rss2.link);
    assert_eq!(rss1.last_checked, now);
    assert_eq!(rss1.last_published, rss2.last_published);
    assert_eq!(rss1.items, rss2.items);
}

#[test]
fn test_publish_time_matches_across_formats() {
    let expected = Utc.with_ymd_and_hms(2020, 6, 1, 12, 0, 0).unwrap();
    let rss1 = parse_feed_bytes(RSS1.as_bytes()).unwrap().unwrap();
    let rss2 = parse_feed_bytes(RSS2.as_bytes()).unwrap().unwrap();

    assert_eq!(rss1.items[0].publish_time, Some(expected));
    assert_eq!(rss2.items[0].publish_time, Some(expected));
}

#[test]
fn test_items_newest_first_undated_last() {
    let feed = parse_feed_bytes(RSS2.as_bytes()).unwrap().unwrap();
    let titles: Vec<&str> = feed.items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["Launch", "Plans", "Undated"]);
    assert_eq!(
        feed.last_published,
        Some(Utc.with_ymd_and_hms(2020, 6, 1, 12, 0, 0).unwrap())
    );
}

#[test]
fn test_item_fields_populated() {
    let feed = parse_feed_bytes(RSS1.as_bytes()).unwrap().unwrap();
    let launch = &feed.items[0];
    assert_eq!(launch.guid, "https://example.com/launch");
    assert_eq!(launch.summary, "We launched.");
    assert_eq!(launch.content, "<p>We <b>launched</b>.</p>");
    assert_eq!(launch.status, ItemStatus::Unread);
    assert_eq!(feed.unread_count(), 3);
}

#[test]
fn test_non_feed_documents() {
    let atom = br#"<feed xmlns="http://www.w3.org/2005/Atom"><title>x</title></feed>"#;
    assert!(parse_feed_bytes(atom).unwrap().is_none());

    let channelless = br#"<rss version="2.0"><item><title>x</title></item></rss>"#;
    assert!(parse_feed_bytes(channelless).unwrap().is_none());

    assert!(parse_feed_bytes(b"not xml at all <").is_err());
}

#[test]
fn test_update_sections_keep_document_order() {
    let body = b"\
[2.0.0]
UPDATE=0
MESSAGE=Latest
URL=https://example.com/latest

[1.0.0]
UPDATE=1
MESSAGE=Please upgrade
URL=https://example.com/upgrade
";
    let messages = update::parse(body);
    let versions: Vec<&str> = messages.iter().map(|m| m.version.as_str()).collect();
    assert_eq!(versions, vec!["2.0.0", "1.0.0"]);

    let found = update::find_version(messages, "1.0.0").unwrap();
    assert!(found.notify);
    assert_eq!(found.text, "Please upgrade");
}
