//! Blocking client over a host fetch.
//!
//! # Design
//! `Client` holds only the host primitive and carries no state between
//! calls. `dispatch` turns a `Request` into the host's request object, starts
//! the host fetch, and parks the calling thread until the host settles.
//!
//! Every buffer and callback the call obtains from the host lives in one
//! call-scoped resource list that is released before `dispatch` returns,
//! whichever way it returns. A panic anywhere inside the call (including
//! inside host code running on the calling thread) is caught at this
//! boundary and returned as `FetchError::Panic`.
//!
//! Because the call blocks, run it off any thread that also drives the
//! host's event loop. On a thread inside a tokio runtime (including
//! `spawn_blocking` threads) it fails with `FetchError::InsideRuntime`
//! before touching the host; use a plain `std::thread` there.

use std::io::Read;
use std::sync::Arc;

use bytes::Bytes;

use crate::bridge;
use crate::error::FetchError;
use crate::primitive::{FetchOptions, FetchPrimitive, HostValue, NativeRequest, OptionValue};
use crate::request::Request;
use crate::resource::ResourceList;
use crate::response::Response;

/// Synchronous client for a host-provided asynchronous fetch.
#[derive(Clone)]
pub struct Client {
    primitive: Arc<dyn FetchPrimitive>,
}

impl Client {
    pub fn new<P: FetchPrimitive + 'static>(primitive: Arc<P>) -> Self {
        Self { primitive }
    }

    /// Perform exactly one round trip through the host.
    ///
    /// Blocks until the host settles. There is no timeout: a host that never
    /// settles and never drops the continuation blocks this call forever.
    /// Returns `FetchError::InsideRuntime`, without invoking the host, when
    /// called from inside a tokio runtime.
    pub fn dispatch(&self, request: Request) -> Result<Response, FetchError> {
        tracing::debug!(method = %request.method, url = %request.url, "dispatching fetch");
        let primitive = self.primitive.as_ref();
        let result = bridge::guarded(primitive, |resources| {
            let native = self.start(request, resources)?;
            let value = bridge::settle(primitive, resources, |callback| {
                primitive.fetch(native).then(callback);
            })?;
            match value {
                HostValue::Response(native) => {
                    Response::from_native(Arc::clone(&self.primitive), native)
                }
                other => Err(FetchError::InvalidResponse(format!(
                    "fetch settled with a {} value",
                    other.kind()
                ))),
            }
        });
        if let Err(err) = &result {
            tracing::debug!(error = %err, "fetch failed");
        }
        result
    }

    /// Assemble the host request, materializing the body into a host buffer.
    fn start(
        &self,
        mut request: Request,
        resources: &mut ResourceList<'_>,
    ) -> Result<NativeRequest, FetchError> {
        let mut options = build_options(&request);
        if let Some(mut body) = request.body.take() {
            let mut buf = Vec::new();
            body.read_to_end(&mut buf).map_err(FetchError::Body)?;
            let handle = self.primitive.alloc_buffer(Bytes::from(buf));
            resources.push(handle);
            options.insert(FetchOptions::BODY, OptionValue::Buffer(handle));
        }
        Ok(NativeRequest::new(request.url, options))
    }
}

impl From<Arc<dyn FetchPrimitive>> for Client {
    fn from(primitive: Arc<dyn FetchPrimitive>) -> Self {
        Self { primitive }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

/// The option map for `request`, without the body.
///
/// Unset policies and empty strings are left out entirely.
pub fn build_options(request: &Request) -> FetchOptions {
    let mut options = FetchOptions::new();
    if !request.method.is_empty() {
        options.insert(FetchOptions::METHOD, OptionValue::Text(request.method.clone()));
    }
    if let Some(headers) = &request.headers {
        options.insert(FetchOptions::HEADERS, OptionValue::Headers(headers.native()));
    }
    let policies = [
        (FetchOptions::MODE, request.mode.map(|m| m.as_str())),
        (FetchOptions::CREDENTIALS, request.credentials.map(|c| c.as_str())),
        (FetchOptions::CACHE, request.cache.map(|c| c.as_str())),
        (FetchOptions::REDIRECT, request.redirect.map(|r| r.as_str())),
    ];
    for (key, wire) in policies {
        if let Some(wire) = wire {
            options.insert(key, OptionValue::Text(wire.to_string()));
        }
    }
    if !request.referrer.is_empty() {
        options.insert(FetchOptions::REFERRER, OptionValue::Text(request.referrer.clone()));
    }
    if !request.integrity.is_empty() {
        options.insert(FetchOptions::INTEGRITY, OptionValue::Text(request.integrity.clone()));
    }
    options
}
