//! The response descriptor returned by `Client::dispatch`.
//!
//! # Design
//! Everything except the body is copied out of the resolved host response
//! when the descriptor is built, so reading status or headers never blocks.
//! The body stays with the host until `text` (or `json`) is called, and that
//! read has its own continuation and its own release, independent of the
//! dispatch that produced the response.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use url::Url;

use crate::bridge;
use crate::error::FetchError;
use crate::headers::Headers;
use crate::policy::ResponseType;
use crate::primitive::{FetchPrimitive, HostValue, NativeBody, NativeResponse};

/// A response to a dispatched request.
pub struct Response {
    headers: Headers,
    ok: bool,
    redirected: bool,
    status: u16,
    status_text: String,
    response_type: ResponseType,
    url: Option<Url>,
    body: Box<dyn NativeBody>,
    primitive: Arc<dyn FetchPrimitive>,
}

impl Response {
    /// Build a descriptor from a resolved host response.
    ///
    /// An empty URL (host-synthesized responses have none) yields
    /// `url() == None`; a non-empty URL that does not parse is an error.
    /// Only absolute URLs parse: hosts report the final URL of a fetch in
    /// absolute form, so a relative one such as `/a` is `InvalidUrl`.
    pub(crate) fn from_native(
        primitive: Arc<dyn FetchPrimitive>,
        native: NativeResponse,
    ) -> Result<Self, FetchError> {
        let response_type = native
            .response_type
            .parse::<ResponseType>()
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;
        let url = if native.url.is_empty() {
            None
        } else {
            match Url::parse(&native.url) {
                Ok(u) => Some(u),
                Err(source) => {
                    return Err(FetchError::InvalidUrl {
                        url: native.url,
                        source,
                    })
                }
            }
        };
        Ok(Self {
            headers: Headers::from_native(native.headers),
            ok: native.ok,
            redirected: native.redirected,
            status: native.status,
            status_text: native.status_text,
            response_type,
            url,
            body: native.body,
            primitive,
        })
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// True for statuses 200 to 299.
    pub fn ok(&self) -> bool {
        self.ok
    }

    /// True if the host followed at least one redirect.
    pub fn redirected(&self) -> bool {
        self.redirected
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn response_type(&self) -> ResponseType {
        self.response_type
    }

    /// Final URL after redirects.
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// Read the whole body as text, blocking until the host decodes it.
    ///
    /// Host bodies are single-read: what a second call returns is up to the
    /// host.
    pub fn text(&mut self) -> Result<String, FetchError> {
        let primitive = Arc::clone(&self.primitive);
        let body = &mut self.body;
        bridge::guarded(primitive.as_ref(), |resources| {
            let value = bridge::settle(primitive.as_ref(), resources, |callback| {
                body.text().then(callback);
            })?;
            match value {
                HostValue::Text(text) => Ok(text),
                other => Err(FetchError::InvalidResponse(format!(
                    "body read settled with a {} value",
                    other.kind()
                ))),
            }
        })
    }

    /// Read the whole body and decode it as JSON.
    pub fn json<T: DeserializeOwned>(&mut self) -> Result<T, FetchError> {
        let text = self.text()?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("status_text", &self.status_text)
            .field("ok", &self.ok)
            .field("redirected", &self.redirected)
            .field("response_type", &self.response_type)
            .field("url", &self.url.as_ref().map(Url::as_str))
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}
