//! Blocking client for a dirstore server.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderValue, ETAG, IF_MATCH};
use reqwest::StatusCode;
use url::Url;

use dirstore_mutation::MutationStatus;

use crate::types::{EditRequest, RemoteFile};

/// HTTP client store rooted at a base URL.
///
/// Paths are relative to the base URL; each `/`-separated segment is
/// percent-encoded on the way out.
pub struct HttpFileStore {
    client: Client,
    base_url: Url,
}

impl HttpFileStore {
    /// Create a client with a 30 second request timeout.
    pub fn new(base_url: &str) -> Result<Self, crate::Error> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, crate::Error> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(crate::Error::InvalidUrl {
                message: format!("{} cannot be a base URL", base_url),
            });
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    /// URL of a path under the base URL.
    pub fn url_for(&self, path: &str) -> Result<Url, crate::Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| crate::Error::InvalidUrl {
                message: format!("{} cannot be a base URL", self.base_url),
            })?
            .pop_if_empty()
            .extend(path.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }

    /// GET a file. `None` on 404.
    pub fn read(&self, path: &str) -> Result<Option<RemoteFile>, crate::Error> {
        let response = self.client.get(self.url_for(path)?).send()?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::unexpected(response));
        }

        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let content = response.text()?;

        Ok(Some(RemoteFile { content, etag }))
    }

    /// Create or replace a file, optionally only if its tag still matches.
    pub fn write(
        &self,
        path: &str,
        text: &str,
        if_match: Option<&str>,
    ) -> Result<MutationStatus, crate::Error> {
        let mut request = self
            .client
            .put(self.url_for(path)?)
            .json(&EditRequest::new(text));
        if let Some(tag) = if_match {
            request = request.header(IF_MATCH, HeaderValue::from_str(tag)?);
        }

        Self::status(request.send()?)
    }

    /// Delete a file, optionally only if its tag still matches.
    pub fn delete(&self, path: &str, if_match: Option<&str>) -> Result<MutationStatus, crate::Error> {
        let mut request = self.client.delete(self.url_for(path)?);
        if let Some(tag) = if_match {
            request = request.header(IF_MATCH, HeaderValue::from_str(tag)?);
        }

        Self::status(request.send()?)
    }

    fn status(response: Response) -> Result<MutationStatus, crate::Error> {
        match MutationStatus::from_code(response.status().as_u16()) {
            Some(status) => Ok(status),
            None => Err(Self::unexpected(response)),
        }
    }

    fn unexpected(response: Response) -> crate::Error {
        crate::Error::UnexpectedStatus {
            status: response.status().as_u16(),
            body: response.text().unwrap_or_default(),
        }
    }
}
