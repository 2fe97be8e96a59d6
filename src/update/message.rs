use serde::Serialize;
use url::Url;

/// One announcement for a specific version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateMessage {
    /// Version string from the section header, e.g. `1.0.2`.
    pub version: String,
    /// True when the section's `UPDATE` value is 1.
    pub notify: bool,
    /// The `MESSAGE` value. May be empty.
    pub text: String,
    /// The `URL` value.
    pub uri: Url,
}

impl std::fmt::Display for UpdateMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let marker = if self.notify { "update" } else { "no update" };
        write!(f, "[{}] {}", self.version, marker)?;
        if !self.text.is_empty() {
            write!(f, ": {}", self.text)?;
        }
        write!(f, " <{}>", self.uri)
    }
}
