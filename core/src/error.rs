//! Error type for a single fetch.
//!
//! # Design
//! Every variant is local to one `dispatch` (or one body read). Nothing is
//! retried and nothing is fatal to the process. Host rejections carry only
//! the host's message text; the core does not classify them further.

use std::io;

/// Errors returned by `Client::dispatch` and the `Response` body readers.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Reading the caller's body stream failed. The host was never invoked.
    #[error("failed to read request body: {0}")]
    Body(#[source] io::Error),

    /// The host promise rejected.
    #[error("fetch rejected: {0}")]
    Rejected(String),

    /// The resolved response carried a URL that does not parse.
    #[error("malformed response url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The host settled with something other than what was asked for.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The host dropped the continuation without calling it.
    #[error("completion callback dropped before it was called")]
    Abandoned,

    /// The calling thread is inside a tokio runtime and must not block.
    /// Nothing was sent to the host.
    #[error("cannot block on a fetch from inside a tokio runtime")]
    InsideRuntime,

    /// A panic was caught at the call boundary.
    #[error("panic during fetch: {0}")]
    Panic(String),

    /// The response body is not the expected JSON.
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}
