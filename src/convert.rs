//! Byte-to-value content converters.
//!
//! A [`ContentConverter`] pairs one transform function with an [`ErrorPolicy`].
//! The transform always reports failure as a typed [`ConversionError`];
//! the policy decides whether that failure reaches the caller or is logged and
//! replaced with `T::default()`. Suppression exists so a long-running poll loop
//! survives a single malformed response.

use serde::de::DeserializeOwned;
use std::fmt;
use thiserror::Error;

use crate::feed::{self, Feed};
use crate::update::{self, UpdateMessage};

/// Errors produced by a converter's transform.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML deserialization failed: {0}")]
    XmlDe(#[from] quick_xml::de::DeError),

    /// The body is not well-formed XML.
    #[error("Malformed XML: {0}")]
    Xml(String),

    #[error("Body is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// Failure returned by a caller-supplied transform, preserved as-is.
    #[error("{0}")]
    Transform(Box<dyn std::error::Error + Send + Sync>),
}

/// Which transform a converter wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConverterKind {
    Function,
    Json,
    Xml,
    UpdateMessage,
    Feed,
}

impl fmt::Display for ConverterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConverterKind::Function => "function",
            ConverterKind::Json => "json",
            ConverterKind::Xml => "xml",
            ConverterKind::UpdateMessage => "update-message",
            ConverterKind::Feed => "feed",
        };
        f.write_str(name)
    }
}

/// What [`ContentConverter::convert`] does with a failed transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Return the failure to the caller unchanged.
    #[default]
    Propagate,
    /// Log one warning and return `T::default()`.
    Suppress,
}

type Transform<T> = Box<dyn Fn(&[u8]) -> Result<T, ConversionError> + Send + Sync>;

/// Converts a response body into `T`.
///
/// Stateless apart from the policy, so one converter can be shared across
/// concurrent calls.
pub struct ContentConverter<T> {
    kind: ConverterKind,
    policy: ErrorPolicy,
    transform: Transform<T>,
}

impl<T: 'static> ContentConverter<T> {
    fn new<F>(kind: ConverterKind, transform: F) -> Self
    where
        F: Fn(&[u8]) -> Result<T, ConversionError> + Send + Sync + 'static,
    {
        Self {
            kind,
            policy: ErrorPolicy::default(),
            transform: Box::new(transform),
        }
    }

    /// Wraps a caller-supplied transform.
    ///
    /// Errors returned by `f` surface as [`ConversionError::Transform`] and
    /// can be downcast back to the original type.
    pub fn from_fn<F, E>(f: F) -> Self
    where
        F: Fn(&[u8]) -> Result<T, E> + Send + Sync + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
    {
        Self::new(ConverterKind::Function, move |body| {
            f(body).map_err(|e| ConversionError::Transform(e.into()))
        })
    }
}

impl<T> ContentConverter<T> {
    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Shorthand for `with_policy(ErrorPolicy::Suppress)`.
    pub fn suppress_errors(self) -> Self {
        self.with_policy(ErrorPolicy::Suppress)
    }

    pub fn kind(&self) -> ConverterKind {
        self.kind
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    pub fn ignores_errors(&self) -> bool {
        self.policy == ErrorPolicy::Suppress
    }

    /// Runs the transform without applying the policy.
    pub fn try_convert(&self, body: &[u8]) -> Result<T, ConversionError> {
        (self.transform)(body)
    }
}

impl<T: Default> ContentConverter<T> {
    /// Runs the transform and applies the error policy.
    ///
    /// Under [`ErrorPolicy::Suppress`] this never fails: exactly one warning is
    /// logged per failed call and `T::default()` is returned.
    pub fn convert(&self, body: &[u8]) -> Result<T, ConversionError> {
        match self.try_convert(body) {
            Ok(value) => Ok(value),
            Err(e) => match self.policy {
                ErrorPolicy::Propagate => Err(e),
                ErrorPolicy::Suppress => {
                    tracing::warn!(
                        converter = %self.kind,
                        error = %e,
                        bytes = body.len(),
                        "Content conversion failed, substituting default value"
                    );
                    Ok(T::default())
                }
            },
        }
    }
}

impl<T: DeserializeOwned + 'static> ContentConverter<T> {
    /// Deserializes the body as JSON.
    pub fn json() -> Self {
        Self::new(ConverterKind::Json, |body| Ok(serde_json::from_slice(body)?))
    }

    /// Deserializes the body as XML through quick-xml's serde support.
    pub fn xml() -> Self {
        Self::new(ConverterKind::Xml, |body| {
            let text = std::str::from_utf8(body)?;
            Ok(quick_xml::de::from_str(text)?)
        })
    }
}

impl ContentConverter<Vec<UpdateMessage>> {
    /// Parses the update-message text format. Malformed sections are dropped,
    /// so this transform itself never fails.
    pub fn update_messages() -> Self {
        Self::new(ConverterKind::UpdateMessage, |body| Ok(update::parse(body)))
    }
}

impl ContentConverter<Option<Feed>> {
    /// Parses an RSS 1.0 or RSS 2.0 document.
    ///
    /// Malformed XML is a conversion error; a well-formed document without the
    /// expected channel structure converts to `None`.
    pub fn feed() -> Self {
        Self::new(ConverterKind::Feed, feed::parse_feed_bytes)
    }
}

impl<T> fmt::Debug for ContentConverter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentConverter")
            .field("kind", &self.kind)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
