use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use url::Url;

/// Wire format a [`Feed`] was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FeedFormat {
    /// RDF-based RSS 1.0
    Rss1,
    /// RSS 2.0 (and the 0.9x formats that share its shape)
    Rss2,
}

/// Read state of an [`Item`]. Always `Unread` when freshly parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Unread,
    Read,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    /// `<guid>` or `rdf:about` when present, otherwise a content hash.
    pub guid: String,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub link: Option<Url>,
    pub publish_time: Option<DateTime<Utc>>,
    pub status: ItemStatus,
}

impl Item {
    /// Stable identifier for an item.
    ///
    /// Uses the feed-supplied identifier when it is non-blank, otherwise a
    /// SHA-256 over link, title and publish time.
    pub fn generate_guid(
        existing: Option<&str>,
        link: Option<&Url>,
        title: &str,
        publish_time: Option<DateTime<Utc>>,
    ) -> String {
        if let Some(guid) = existing.map(str::trim).filter(|g| !g.is_empty()) {
            return guid.to_string();
        }

        let input = format!(
            "{}|{}|{}",
            link.map(Url::as_str).unwrap_or(""),
            title,
            publish_time.map(|t| t.timestamp().to_string()).unwrap_or_default()
        );
        format!("{:x}", Sha256::digest(input.as_bytes()))
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feed {
    pub title: String,
    pub description: String,
    pub link: Option<Url>,
    pub format: FeedFormat,
    /// When this feed was parsed.
    pub last_checked: DateTime<Utc>,
    /// Publish time of the newest item, if any item has one.
    pub last_published: Option<DateTime<Utc>>,
    /// Newest first. See [`sort_items`].
    pub items: Vec<Item>,
}

impl Feed {
    /// Assembles a feed, ordering `items` and deriving `last_published`.
    pub fn new(
        format: FeedFormat,
        title: String,
        description: String,
        link: Option<Url>,
        mut items: Vec<Item>,
        last_checked: DateTime<Utc>,
    ) -> Self {
        sort_items(&mut items);
        let last_published = items.first().and_then(|item| item.publish_time);

        Self {
            title,
            description,
            link,
            format,
            last_checked,
            last_published,
            items,
        }
    }

    pub fn unread_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.status == ItemStatus::Unread)
            .count()
    }
}

/// Orders items newest first.
///
/// Items without a publish time sort after all dated items. The sort is
/// stable: equal timestamps and undated items keep their document order.
pub fn sort_items(items: &mut [Item]) {
    items.sort_by(|a, b| newest_first(a.publish_time, b.publish_time));
}

fn newest_first(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn item(title: &str, publish_time: Option<DateTime<Utc>>) -> Item {
        Item {
            guid: title.to_string(),
            title: title.to_string(),
            summary: String::new(),
            content: String::new(),
            link: None,
            publish_time,
            status: ItemStatus::Unread,
        }
    }

    fn day(y: i32, m: u32, d: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_sort_newest_first_absent_last() {
        let mut items = vec![
            item("jan", day(2020, 1, 1)),
            item("none", None),
            item("jun", day(2020, 6, 1)),
        ];
        sort_items(&mut items);

        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["jun", "jan", "none"]);
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let mut items = vec![
            item("a", None),
            item("b", day(2021, 3, 3)),
            item("c", None),
            item("d", day(2021, 3, 3)),
        ];
        sort_items(&mut items);

        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_feed_new_derives_last_published() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let feed = Feed::new(
            FeedFormat::Rss2,
            "t".into(),
            String::new(),
            None,
            vec![item("old", day(2019, 1, 1)), item("new", day(2023, 1, 1))],
            now,
        );
        assert_eq!(feed.last_published, day(2023, 1, 1));
        assert_eq!(feed.last_checked, now);
        assert_eq!(feed.unread_count(), 2);
    }

    #[test]
    fn test_feed_without_items_has_no_last_published() {
        let feed = Feed::new(FeedFormat::Rss1, "t".into(), String::new(), None, vec![], Utc::now());
        assert_eq!(feed.last_published, None);
    }

    #[test]
    fn test_feed_with_only_undated_items_has_no_last_published() {
        let feed = Feed::new(
            FeedFormat::Rss2,
            "t".into(),
            String::new(),
            None,
            vec![item("a", None)],
            Utc::now(),
        );
        assert_eq!(feed.last_published, None);
    }

    #[test]
    fn test_guid_prefers_existing() {
        assert_eq!(Item::generate_guid(Some("  urn:1  "), None, "t", None), "urn:1");
    }

    #[test]
    fn test_guid_hash_is_deterministic() {
        let link = Url::parse("https://example.com/a").unwrap();
        let a = Item::generate_guid(None, Some(&link), "Title", day(2020, 1, 1));
        let b = Item::generate_guid(Some("   "), Some(&link), "Title", day(2020, 1, 1));
        let c = Item::generate_guid(None, Some(&link), "Other", day(2020, 1, 1));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_display_title_fallback() {
        assert_eq!(item("", None).display_title(), "(Untitled)");
        assert_eq!(item("x", None).display_title(), "x");
    }

    proptest! {
        #[test]
        fn prop_sort_orders_and_preserves_ties(
            stamps in proptest::collection::vec(proptest::option::of(0i64..20), 0..40)
        ) {
            let mut items: Vec<Item> = stamps
                .iter()
                .enumerate()
                .map(|(i, s)| item(&i.to_string(), s.map(|d| Utc.timestamp_opt(d * 86_400, 0).unwrap())))
                .collect();
            sort_items(&mut items);

            for pair in items.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                let order = newest_first(a.publish_time, b.publish_time);
                prop_assert_ne!(order, Ordering::Greater);
                if order == Ordering::Equal {
                    let ia: usize = a.title.parse().unwrap();
                    let ib: usize = b.title.parse().unwrap();
                    prop_assert!(ia < ib);
                }
            }
        }
    }
}
