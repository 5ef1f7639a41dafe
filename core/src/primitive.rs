//! The boundary between the core and the host's asynchronous fetch.
//!
//! # Design
//! The host owns every object that crosses this boundary. The core only ever
//! holds `Handle`s to them, the way a guest holds indices into a host object
//! table, and must hand each handle it allocated back through `release`.
//!
//! Settlement is callback-driven: the core registers a `Continuation`, gets a
//! handle for it, and attaches that handle to a `Thenable`. The host calls
//! the continuation exactly once, from whatever thread runs its event loop,
//! with either the resolved value or the rejection message.

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::headers::NativeHeaders;

/// Opaque reference to a host-side object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(pub u64);

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the host passes to a continuation on success.
pub enum HostValue {
    /// Result of a `fetch`.
    Response(NativeResponse),
    /// Result of a body `text` read.
    Text(String),
}

impl HostValue {
    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            HostValue::Response(_) => "response",
            HostValue::Text(_) => "text",
        }
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Response(r) => f.debug_tuple("Response").field(r).finish(),
            HostValue::Text(t) => f.debug_tuple("Text").field(t).finish(),
        }
    }
}

/// Outcome of a host promise: the resolved value or the rejection message.
pub type Settlement = Result<HostValue, String>;

/// A one-shot callback registered with the host.
pub type Continuation = Box<dyn FnOnce(Settlement) + Send>;

/// A pending host promise.
pub trait Thenable: Send {
    /// Attach the continuation registered under `callback` to both the
    /// resolve and reject paths.
    fn then(self: Box<Self>, callback: Handle);
}

/// The body of a resolved response, still owned by the host.
pub trait NativeBody: Send {
    /// Start decoding the body as text. Host bodies are single-read.
    fn text(&mut self) -> Box<dyn Thenable>;
}

/// A resolved host response. Every field except the body is already
/// settled when the continuation runs.
pub struct NativeResponse {
    pub ok: bool,
    pub redirected: bool,
    pub status: u16,
    pub status_text: String,
    /// Wire form of the response type, e.g. `"basic"`.
    pub response_type: String,
    pub url: String,
    pub headers: NativeHeaders,
    pub body: Box<dyn NativeBody>,
}

impl fmt::Debug for NativeResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeResponse")
            .field("ok", &self.ok)
            .field("redirected", &self.redirected)
            .field("status", &self.status)
            .field("status_text", &self.status_text)
            .field("response_type", &self.response_type)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// A value in the option map handed to the host.
#[derive(Debug, Clone)]
pub enum OptionValue {
    Text(String),
    Headers(NativeHeaders),
    Buffer(Handle),
}

impl OptionValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            OptionValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl Serialize for OptionValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            OptionValue::Text(s) => serializer.serialize_str(s),
            OptionValue::Headers(h) => {
                let map = h.snapshot();
                let mut seq = serializer.serialize_seq(Some(map.len()))?;
                for (name, value) in map.iter() {
                    let value = String::from_utf8_lossy(value.as_bytes());
                    seq.serialize_element(&[name.as_str(), &*value])?;
                }
                seq.end()
            }
            OptionValue::Buffer(handle) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("buffer", &handle.0)?;
                map.end()
            }
        }
    }
}

/// The request-init option map. Keys are the host's wire keys.
#[derive(Debug, Clone, Default, serde::Serialize)]
#[serde(transparent)]
pub struct FetchOptions(BTreeMap<&'static str, OptionValue>);

impl FetchOptions {
    pub const METHOD: &'static str = "method";
    pub const HEADERS: &'static str = "headers";
    pub const MODE: &'static str = "mode";
    pub const CREDENTIALS: &'static str = "credentials";
    pub const CACHE: &'static str = "cache";
    pub const REDIRECT: &'static str = "redirect";
    pub const REFERRER: &'static str = "referrer";
    pub const INTEGRITY: &'static str = "integrity";
    pub const BODY: &'static str = "body";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &'static str, value: OptionValue) {
        self.0.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.0.get(key)
    }

    /// Shorthand for string-valued keys.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(OptionValue::as_text)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The option map as a JSON object, for hosts that take a serialized
    /// option bag. Headers become `[name, value]` pairs and the body becomes
    /// `{"buffer": <handle>}`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// The host's request object: a URL plus, when non-empty, an option map.
#[derive(Debug, Clone)]
pub struct NativeRequest {
    pub url: String,
    /// `None` when no option was set. An empty map is never forwarded.
    pub options: Option<FetchOptions>,
}

impl NativeRequest {
    pub fn new(url: impl Into<String>, options: FetchOptions) -> Self {
        let options = if options.is_empty() { None } else { Some(options) };
        Self {
            url: url.into(),
            options,
        }
    }
}

/// A host-provided asynchronous fetch.
///
/// Implementations must be callable from any thread. Continuations may be
/// invoked on the calling thread (from inside `then`) or on the host's own
/// event loop thread.
pub trait FetchPrimitive: Send + Sync {
    /// Copy a fully materialized payload into a host buffer.
    fn alloc_buffer(&self, bytes: Bytes) -> Handle;

    /// Register a one-shot continuation.
    fn register_callback(&self, continuation: Continuation) -> Handle;

    /// Free a buffer or callback registration. Called exactly once per
    /// handle returned by `alloc_buffer` or `register_callback`.
    fn release(&self, handle: Handle);

    /// Start a request.
    fn fetch(&self, request: NativeRequest) -> Box<dyn Thenable>;
}
