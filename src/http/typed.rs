use serde::de::DeserializeOwned;
use url::Url;

use super::client::{ConditionalFetchClient, FetchError};
use crate::convert::ContentConverter;
use crate::feed::Feed;
use crate::update::{self, UpdateMessage};

/// Query parameter carrying the caller's version on update-message requests.
const VERSION_PARAM: &str = "ver";

impl ConditionalFetchClient {
    /// Fetches `url` and converts a successful body with `converter`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))` - 2xx response, converted (or defaulted under
    ///   [`ErrorPolicy::Suppress`](crate::convert::ErrorPolicy::Suppress))
    /// - `Ok(None)` - non-success status (including `304 Not Modified`);
    ///   the body is not inspected
    ///
    /// # Errors
    ///
    /// Transport failures as described on [`ConditionalFetchClient::fetch`],
    /// and [`FetchError::Conversion`] when the converter propagates a failure.
    pub async fn fetch_typed<T: Default>(
        &self,
        url: &Url,
        converter: &ContentConverter<T>,
    ) -> Result<Option<T>, FetchError> {
        match self.fetch_success_body(url).await? {
            Some(body) => Ok(Some(converter.convert(&body)?)),
            None => Ok(None),
        }
    }

    /// Fetches and deserializes a JSON document.
    ///
    /// Non-success status → `Ok(None)`; malformed JSON →
    /// [`FetchError::Conversion`].
    pub async fn get_json<T: DeserializeOwned + 'static>(
        &self,
        url: &Url,
    ) -> Result<Option<T>, FetchError> {
        self.fetch_deserialized(url, ContentConverter::json()).await
    }

    /// Fetches and deserializes an XML document with quick-xml's serde support.
    ///
    /// Non-success status → `Ok(None)`; malformed XML →
    /// [`FetchError::Conversion`].
    pub async fn get_xml<T: DeserializeOwned + 'static>(
        &self,
        url: &Url,
    ) -> Result<Option<T>, FetchError> {
        self.fetch_deserialized(url, ContentConverter::xml()).await
    }

    /// Fetches and parses an RSS 1.0 / 2.0 feed.
    ///
    /// `Ok(None)` covers both a non-success status and a well-formed document
    /// that is not a feed. Malformed XML is [`FetchError::Conversion`].
    pub async fn fetch_feed(&self, url: &Url) -> Result<Option<Feed>, FetchError> {
        Ok(self
            .fetch_typed(url, &ContentConverter::feed())
            .await?
            .flatten())
    }

    /// Fetches the update-message document and returns the entry for `version`.
    ///
    /// `extra_params` are merged into the query string first, then
    /// `ver=<version>` is set, so `ver` always carries `version`. Existing
    /// parameters are preserved and duplicate keys are overwritten, not
    /// repeated.
    ///
    /// Returns `Ok(None)` on a non-success status or when no section matches
    /// `version` exactly. The document is expected to be small and is scanned
    /// linearly.
    pub async fn fetch_update_message<K, V>(
        &self,
        url: &Url,
        version: &str,
        extra_params: &[(K, V)],
    ) -> Result<Option<UpdateMessage>, FetchError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let params = extra_params
            .iter()
            .map(|(k, v)| (k.as_ref(), v.as_ref()))
            .chain(std::iter::once((VERSION_PARAM, version)));
        let request_url = crate::util::merge_query(url, params);

        let messages = match self
            .fetch_typed(&request_url, &ContentConverter::update_messages())
            .await?
        {
            Some(messages) => messages,
            None => return Ok(None),
        };

        let found = update::find_version(messages, version);
        if found.is_none() {
            tracing::debug!(url = %request_url, version = %version, "No update message for version");
        }
        Ok(found)
    }

    async fn fetch_deserialized<T>(
        &self,
        url: &Url,
        converter: ContentConverter<T>,
    ) -> Result<Option<T>, FetchError> {
        match self.fetch_success_body(url).await? {
            Some(body) => Ok(Some(converter.try_convert(&body)?)),
            None => Ok(None),
        }
    }

    async fn fetch_success_body(&self, url: &Url) -> Result<Option<Vec<u8>>, FetchError> {
        let response = self.fetch(url).await?;
        if !response.is_success() {
            tracing::debug!(
                url = %url,
                status = response.status.as_u16(),
                "Non-success status, treating as no content"
            );
            return Ok(None);
        }
        Ok(Some(response.body))
    }
}
