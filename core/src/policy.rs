//! Request policies and response types as closed sets of wire strings.
//!
//! # Design
//! Each axis is a plain enum. A request field of type `Option<_>` holds at
//! most one value per axis, and `None` means "not set": the dispatcher omits
//! the option key instead of forwarding an empty string, because the host
//! treats an explicit empty option differently from an absent one.
//!
//! `as_str` is the only wire table per enum. `Display`, `FromStr` and serde
//! all go through it, so the strings cannot drift apart.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A string that matches no value of a policy table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value:?}")]
pub struct UnknownPolicy {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $wire)] $variant, )+
        }

        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The wire string forwarded to the host.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $wire, )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownPolicy;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $wire => Ok($name::$variant), )+
                    other => Err(UnknownPolicy {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

wire_enum! {
    /// How the request interacts with the host's HTTP cache.
    CacheMode, "cache mode" {
        /// Use a fresh cached match, revalidate a stale one, otherwise fetch
        /// and store.
        Default => "default",
        /// Bypass the cache entirely and do not store the result.
        NoStore => "no-store",
        /// Bypass the cache on the way out, store the result.
        Reload => "reload",
        /// Always revalidate a cached match with the server.
        NoCache => "no-cache",
        /// Prefer any cached match, fresh or stale.
        ForceCache => "force-cache",
        /// Only answer from cache; a miss yields 504. Requires
        /// `RequestMode::SameOrigin`.
        OnlyIfCached => "only-if-cached",
    }
}

wire_enum! {
    /// Whether cookies and HTTP auth travel with the request.
    CredentialsMode, "credentials mode" {
        Omit => "omit",
        SameOrigin => "same-origin",
        Include => "include",
    }
}

wire_enum! {
    /// Cross-origin behaviour of the request.
    RequestMode, "request mode" {
        SameOrigin => "same-origin",
        NoCors => "no-cors",
        Cors => "cors",
        Navigate => "navigate",
    }
}

wire_enum! {
    /// What the host does when the server answers with a redirect.
    RedirectMode, "redirect mode" {
        Follow => "follow",
        Error => "error",
        Manual => "manual",
    }
}

wire_enum! {
    /// The kind of content a request is for.
    Destination, "destination" {
        Audio => "audio",
        AudioWorklet => "audioworklet",
        Document => "document",
        Embed => "embed",
        Font => "font",
        Image => "image",
        Manifest => "manifest",
        Object => "object",
        PaintWorklet => "paintworklet",
        Report => "report",
        Script => "script",
        ServiceWorker => "serviceworker",
        SharedWorker => "sharedworker",
        Style => "style",
        Track => "track",
        Video => "video",
        Worker => "worker",
        Xslt => "xslt",
    }
}

wire_enum! {
    /// The `type` reported by a resolved response.
    ResponseType, "response type" {
        Basic => "basic",
        Cors => "cors",
        Error => "error",
        Opaque => "opaque",
        OpaqueRedirect => "opaqueredirect",
    }
}
