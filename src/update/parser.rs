use std::collections::HashMap;
use thiserror::Error;
use url::Url;

use super::UpdateMessage;

const KEY_UPDATE: &str = "UPDATE";
const KEY_MESSAGE: &str = "MESSAGE";
const KEY_URL: &str = "URL";

/// Why a section did not produce an [`UpdateMessage`].
#[derive(Debug, Error, PartialEq)]
pub enum SectionError {
    /// Key/value lines appeared before any header, or under `[]`.
    #[error("section has no version header")]
    MissingVersion,

    /// A header with no key/value lines under it.
    #[error("section [{version}] is empty")]
    Empty { version: String },

    #[error("section [{version}] is missing required key {key}")]
    MissingKey { version: String, key: &'static str },

    #[error("section [{version}] has non-integer UPDATE value {value:?}")]
    InvalidUpdateFlag { version: String, value: String },

    #[error("section [{version}] has invalid URL {value:?}: {source}")]
    InvalidUrl {
        version: String,
        value: String,
        #[source]
        source: url::ParseError,
    },
}

/// Parses an update-message document into its well-formed sections.
///
/// Malformed sections are logged at `warn` and skipped; parsing always
/// continues with the next section. The result is in document order.
pub fn parse(bytes: &[u8]) -> Vec<UpdateMessage> {
    parse_sections(bytes)
        .into_iter()
        .filter_map(|section| match section {
            Ok(message) => Some(message),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed update-message section");
                None
            }
        })
        .collect()
}

/// Parses every section, keeping the per-section outcome.
///
/// Input is decoded as UTF-8, replacing invalid sequences; a leading BOM is
/// ignored. Lines are trimmed. A header line is `[` + version + `]`; any
/// other non-blank line is split at its first `=`, and lines without `=` are
/// ignored. A repeated key overwrites the earlier value.
pub fn parse_sections(bytes: &[u8]) -> Vec<Result<UpdateMessage, SectionError>> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let mut results = Vec::new();
    let mut version: Option<String> = None;
    let mut fields: HashMap<String, String> = HashMap::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(header) = section_header(line) {
            if let Some(result) = finalize(version.take(), std::mem::take(&mut fields)) {
                results.push(result);
            }
            version = Some(header.to_owned());
            continue;
        }

        match line.split_once('=') {
            Some((key, value)) => {
                fields.insert(key.trim().to_owned(), value.trim().to_owned());
            }
            None => {
                tracing::debug!(line = %line, "Ignoring update-message line without '='");
            }
        }
    }

    if let Some(result) = finalize(version, fields) {
        results.push(result);
    }

    results
}

/// Returns the first message whose version equals `version` exactly.
pub fn find_version(messages: Vec<UpdateMessage>, version: &str) -> Option<UpdateMessage> {
    messages.into_iter().find(|m| m.version == version)
}

fn section_header(line: &str) -> Option<&str> {
    line.strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .map(str::trim)
}

/// `None` when there is nothing to report: no header was seen and no
/// key/value lines were collected.
fn finalize(
    version: Option<String>,
    mut fields: HashMap<String, String>,
) -> Option<Result<UpdateMessage, SectionError>> {
    let version = match version {
        Some(v) if !v.is_empty() => v,
        _ if fields.is_empty() => return None,
        _ => return Some(Err(SectionError::MissingVersion)),
    };

    if fields.is_empty() {
        return Some(Err(SectionError::Empty { version }));
    }

    Some(build_message(version, &mut fields))
}

fn build_message(
    version: String,
    fields: &mut HashMap<String, String>,
) -> Result<UpdateMessage, SectionError> {
    let mut take = |key: &'static str| {
        fields.remove(key).ok_or_else(|| SectionError::MissingKey {
            version: version.clone(),
            key,
        })
    };

    let update = take(KEY_UPDATE)?;
    let text = take(KEY_MESSAGE)?;
    let url = take(KEY_URL)?;

    let flag: i64 = match update.parse() {
        Ok(flag) => flag,
        Err(_) => {
            return Err(SectionError::InvalidUpdateFlag {
                version,
                value: update,
            })
        }
    };

    let uri = match Url::parse(&url) {
        Ok(uri) => uri,
        Err(source) => {
            return Err(SectionError::InvalidUrl {
                version,
                value: url,
                source,
            })
        }
    };

    Ok(UpdateMessage {
        version,
        notify: flag == 1,
        text,
        uri,
    })
}
