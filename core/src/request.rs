//! The request descriptor handed to `Client::dispatch`.

use std::fmt;
use std::io::Read;

use crate::headers::Headers;
use crate::policy::{CacheMode, CredentialsMode, Destination, RedirectMode, RequestMode};

/// A declarative description of one fetch.
///
/// Every optional field left at its default is omitted from the host's
/// option map, so the host applies its own default.
///
/// ```rust,ignore
/// let headers = Headers::new();
/// headers.set("Content-Type", "image/jpeg");
/// let res = client.dispatch(Request::new("flowers.jpg").with_headers(headers))?;
/// ```
#[derive(Default)]
pub struct Request {
    /// Empty means the host default (GET).
    pub method: String,
    /// Absolute, or relative to the host's base URL.
    pub url: String,
    pub headers: Option<Headers>,
    /// Read to the end before the host is invoked.
    pub body: Option<Box<dyn Read + Send>>,
    pub cache: Option<CacheMode>,
    pub credentials: Option<CredentialsMode>,
    pub mode: Option<RequestMode>,
    pub redirect: Option<RedirectMode>,
    /// `no-referrer`, `client`, or a URL. Empty leaves the host default.
    pub referrer: String,
    /// Subresource integrity metadata, e.g. `sha256-BpfBw7ivV8q2jLiT13fxDYAe2tJllusRSZ273h2nFSE=`.
    pub integrity: String,
    /// Recorded for the caller; the host derives the real destination itself
    /// and it is not forwarded.
    pub destination: Option<Destination>,
}

impl Request {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn with_body<R: Read + Send + 'static>(mut self, body: R) -> Self {
        self.body = Some(Box::new(body));
        self
    }

    pub fn with_cache(mut self, cache: CacheMode) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_credentials(mut self, credentials: CredentialsMode) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_redirect(mut self, redirect: RedirectMode) -> Self {
        self.redirect = Some(redirect);
        self
    }

    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = referrer.into();
        self
    }

    pub fn with_integrity(mut self, integrity: impl Into<String>) -> Self {
        self.integrity = integrity.into();
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = Some(destination);
        self
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("body", &self.body.as_ref().map(|_| "<stream>"))
            .field("cache", &self.cache)
            .field("credentials", &self.credentials)
            .field("mode", &self.mode)
            .field("redirect", &self.redirect)
            .field("referrer", &self.referrer)
            .field("integrity", &self.integrity)
            .field("destination", &self.destination)
            .finish()
    }
}
