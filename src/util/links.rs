use url::Url;

/// Returns `url` with `params` merged into its query string.
///
/// Existing parameters keep their order. A key that is already present has
/// its first occurrence overwritten and any later duplicates removed; new
/// keys are appended. Later entries in `params` win over earlier ones.
pub fn merge_query<I, K, V>(url: &Url, params: I) -> Url
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

    for (key, value) in params {
        let (key, value) = (key.as_ref(), value.as_ref());
        match pairs.iter().position(|(k, _)| k == key) {
            Some(first) => {
                pairs[first].1 = value.to_owned();
                let mut index = 0;
                pairs.retain(|(k, _)| {
                    let keep = index <= first || k != key;
                    index += 1;
                    keep
                });
            }
            None => pairs.push((key.to_owned(), value.to_owned())),
        }
    }

    let mut merged = url.clone();
    if pairs.is_empty() {
        merged.set_query(None);
    } else {
        merged.query_pairs_mut().clear().extend_pairs(pairs.iter());
    }
    merged
}

/// Parses a feed-supplied link, resolving relative references against `base`.
///
/// Blank or unresolvable links yield `None`.
pub fn resolve_link(raw: &str, base: Option<&Url>) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    match Url::parse(raw) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => base.and_then(|b| b.join(raw).ok()),
        Err(e) => {
            tracing::debug!(link = %raw, error = %e, "Ignoring unparseable link");
            None
        }
    }
}
