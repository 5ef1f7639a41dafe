//! Header store shared between the caller and the host.
//!
//! # Design
//! `Headers` behaves like a reference to a host `Headers` object: cloning it
//! hands out another reference to the same store, and forwarding it to the
//! host (`native`) never copies the entries. Names are case-insensitive and
//! each name keeps its values in the order they were added.
//!
//! No operation reports failure. A name or value the store cannot hold is
//! dropped with a debug log, and lookups of absent names return an empty
//! string.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use http::header::{HeaderMap, HeaderName, HeaderValue};

/// Case-insensitive, multi-value header collection.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    inner: NativeHeaders,
}

/// The host-facing reference to a header store.
///
/// This is what the dispatcher places under the `headers` option key, and
/// what a host hands back as the headers of a resolved response.
#[derive(Debug, Clone, Default)]
pub struct NativeHeaders(Arc<Mutex<HeaderMap>>);

impl NativeHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current entries.
    pub fn snapshot(&self) -> HeaderMap {
        self.lock().clone()
    }

    /// True when both references point at the same store.
    pub fn ptr_eq(&self, other: &NativeHeaders) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn lock(&self) -> MutexGuard<'_, HeaderMap> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<HeaderMap> for NativeHeaders {
    fn from(map: HeaderMap) -> Self {
        NativeHeaders(Arc::new(Mutex::new(map)))
    }
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a store received from the host.
    pub fn from_native(native: NativeHeaders) -> Self {
        Self { inner: native }
    }

    /// Append `value` under `name`, keeping existing values.
    pub fn add(&self, name: &str, value: &str) {
        if let Some((name, value)) = encode(name, value) {
            self.inner.lock().append(name, value);
        }
    }

    /// Replace every value under `name` with `value`.
    pub fn set(&self, name: &str, value: &str) {
        if let Some((name, value)) = encode(name, value) {
            self.inner.lock().insert(name, value);
        }
    }

    /// All values under `name` joined with `", "`, or an empty string.
    pub fn get(&self, name: &str) -> String {
        let map = self.inner.lock();
        let values: Vec<String> = map.get_all(name).iter().map(value_string).collect();
        values.join(", ")
    }

    pub fn has(&self, name: &str) -> bool {
        self.inner.lock().contains_key(name)
    }

    /// Remove every value under `name`.
    pub fn del(&self, name: &str) {
        self.inner.lock().remove(name);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Snapshot of every `(name, value)` pair. Names are lower-case; values
    /// of one name stay in insertion order.
    pub fn entries(&self) -> Vec<(String, String)> {
        self.inner
            .lock()
            .iter()
            .map(|(name, value)| (name.as_str().to_string(), value_string(value)))
            .collect()
    }

    /// Visit entries in `entries` order until `f` returns `false`.
    pub fn range<F>(&self, mut f: F)
    where
        F: FnMut(&str, &str) -> bool,
    {
        for (name, value) in self.entries() {
            if !f(&name, &value) {
                return;
            }
        }
    }

    /// The reference forwarded to the host. Shares, never copies.
    pub fn native(&self) -> NativeHeaders {
        self.inner.clone()
    }
}

fn encode(name: &str, value: &str) -> Option<(HeaderName, HeaderValue)> {
    let parsed_name = match HeaderName::from_bytes(name.as_bytes()) {
        Ok(n) => n,
        Err(_) => {
            tracing::debug!(name, "ignoring invalid header name");
            return None;
        }
    };
    match HeaderValue::from_str(value) {
        Ok(v) => Some((parsed_name, v)),
        Err(_) => {
            tracing::debug!(name, "ignoring invalid header value");
            None
        }
    }
}

fn value_string(value: &HeaderValue) -> String {
    String::from_utf8_lossy(value.as_bytes()).into_owned()
}
