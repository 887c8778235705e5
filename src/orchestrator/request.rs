//! What a caller asks to download.

use crate::error::Error;

use reqwest::{
    header::{HeaderMap, HeaderValue, COOKIE},
    Url,
};
use std::convert::TryFrom;
use std::path::PathBuf;

/// A download request: the URL, headers forwarded to every fetch it causes,
/// and an optional install directory overriding the configured one.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: Url,
    pub headers: HeaderMap,
    pub directory: Option<PathBuf>,
}

impl DownloadRequest {
    /// Creates a new [`DownloadRequest`].
    pub fn new(url: Url) -> Self {
        Self {
            url,
            headers: HeaderMap::new(),
            directory: None,
        }
    }

    /// Add headers, replacing values of the same name.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Attach the cookie of the page that linked the download.
    pub fn with_cookie(mut self, cookie: &str) -> Result<Self, Error> {
        let value = HeaderValue::from_str(cookie)
            .map_err(|e| Error::Internal(format!("Invalid cookie header: {}", e)))?;
        self.headers.insert(COOKIE, value);
        Ok(self)
    }

    /// Install into `directory` instead of the configured one.
    pub fn with_directory(mut self, directory: PathBuf) -> Self {
        self.directory = Some(directory);
        self
    }
}

impl TryFrom<&str> for DownloadRequest {
    type Error = crate::error::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Url::parse(value)
            .map(DownloadRequest::new)
            .map_err(|e| Error::InvalidUrl(format!("The url \"{}\" cannot be parsed: {}", value, e)))
    }
}
