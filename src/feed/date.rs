//! Timestamp parsing for feed dates.
//!
//! Unparseable values yield `None`; a bad date never fails a feed.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parses an RSS 2.0 `pubDate` (RFC 2822), accepting RFC 3339 as a fallback
/// since some publishers emit ISO timestamps there.
pub fn parse_rfc2822(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            tracing::debug!(value = %value, "Unparseable pubDate");
            None
        })
}

/// Parses a `dc:date` in W3C-DTF, the ISO 8601 profile used by RSS 1.0.
///
/// Accepts full timestamps with offset, minute precision with offset, and
/// offset-less date-times and plain dates (both taken as UTC).
pub fn parse_w3cdtf(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    // Minute precision with a literal Z
    if let Some(stripped) = value.strip_suffix('Z') {
        if let Ok(naive) = NaiveDateTime::parse_from_str(stripped, "%Y-%m-%dT%H:%M") {
            return Some(naive.and_utc());
        }
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    tracing::debug!(value = %value, "Unparseable dc:date");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_rfc2822() {
        let expected = Utc.with_ymd_and_hms(2020, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(parse_rfc2822("Mon, 01 Jun 2020 12:00:00 GMT"), Some(expected));
        assert_eq!(parse_rfc2822("Mon, 01 Jun 2020 14:00:00 +0200"), Some(expected));
        assert_eq!(parse_rfc2822("  Mon, 01 Jun 2020 12:00:00 +0000\n"), Some(expected));
    }

    #[test]
    fn test_rfc2822_falls_back_to_rfc3339() {
        let expected = Utc.with_ymd_and_hms(2020, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(parse_rfc2822("2020-06-01T12:00:00Z"), Some(expected));
    }

    #[test]
    fn test_rfc2822_garbage() {
        assert_eq!(parse_rfc2822(""), None);
        assert_eq!(parse_rfc2822("yesterday"), None);
    }

    #[test]
    fn test_w3cdtf_variants() {
        let noon = Utc.with_ymd_and_hms(2020, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(parse_w3cdtf("2020-06-01T12:00:00Z"), Some(noon));
        assert_eq!(parse_w3cdtf("2020-06-01T13:00:00+01:00"), Some(noon));
        assert_eq!(parse_w3cdtf("2020-06-01T13:00+01:00"), Some(noon));
        assert_eq!(parse_w3cdtf("2020-06-01T12:00Z"), Some(noon));
        assert_eq!(parse_w3cdtf("2020-06-01T12:00:00"), Some(noon));
        assert_eq!(
            parse_w3cdtf("2020-06-01"),
            Some(Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_w3cdtf_garbage() {
        assert_eq!(parse_w3cdtf(""), None);
        assert_eq!(parse_w3cdtf("June 2020"), None);
    }
}
