//! Blocking client for a host-provided asynchronous fetch.
//!
//! # Overview
//! The host (a browser, a JS engine embedding, a C application) owns the
//! network and exposes it as a promise-returning fetch. This crate drives
//! that fetch through the `FetchPrimitive` trait and gives the caller a
//! plain blocking call: build a `Request`, `Client::dispatch` it, get a
//! `Response` or a `FetchError`.
//!
//! # Design
//! - The core never performs I/O itself (host-does-IO pattern).
//! - Host objects are only ever referenced through `Handle`s, and every
//!   handle a call allocates is released before the call returns.
//! - Each call suspends at exactly one point: a one-shot channel fed by a
//!   continuation registered with the host.
//! - Panics inside a call are caught at the call boundary and returned as
//!   errors.
//! - A call made from inside a tokio runtime fails before the host is
//!   touched instead of parking a runtime thread.
//!
//! ```rust,ignore
//! let client = tafuta::Client::new(host);
//! let headers = tafuta::Headers::new();
//! headers.set("Accept", "application/json");
//! let mut res = client.dispatch(
//!     tafuta::Request::new("some.json")
//!         .with_headers(headers)
//!         .with_cache(tafuta::CacheMode::NoStore),
//! )?;
//! println!("{} {}", res.status(), res.text()?);
//! ```

mod bridge;
pub mod client;
pub mod error;
pub mod headers;
pub mod policy;
pub mod primitive;
pub mod request;
mod resource;
pub mod response;

pub use client::{build_options, Client};
pub use error::FetchError;
pub use headers::{Headers, NativeHeaders};
pub use policy::{
    CacheMode, CredentialsMode, Destination, RedirectMode, RequestMode, ResponseType, UnknownPolicy,
};
pub use primitive::{
    Continuation, FetchOptions, FetchPrimitive, Handle, HostValue, NativeBody, NativeRequest,
    NativeResponse, OptionValue, Settlement, Thenable,
};
pub use request::Request;
pub use response::Response;
