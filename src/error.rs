//! Crate-wide error types.
//!
//! # Responsibilities
//! - One taxonomy covering construction-time and serve-time failures
//! - Construction errors abort `Registry::build` atomically
//! - Serve-time errors name the address they belong to
//!
//! # Design Decisions
//! - Construction is fail-fast: no partial registry ever escapes
//! - A lookup miss is a distinct condition, not a panic
//! - Per-connection failures never appear here; they stay inside the
//!   connection's own task

use thiserror::Error;

/// Boxed error crossing a capability seam (handler factories).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced by registry construction and serving.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// A descriptor string failed to parse.
    #[error("invalid descriptor {descriptor:?}: {source}")]
    InvalidDescriptor {
        descriptor: String,
        #[source]
        source: url::ParseError,
    },

    /// A descriptor parsed but names no host to listen on.
    #[error("descriptor {0:?} has no listening address")]
    MissingHost(String),

    /// The handler factory refused to build a handler.
    #[error("building {scheme}://{host} handler: {source}")]
    HandlerBuild {
        scheme: String,
        host: String,
        #[source]
        source: BoxError,
    },

    /// Two handlers on one address both asked to be the fallback.
    #[error("fallback handler already registered on {address}")]
    FallbackConflict { address: String },

    /// Serving was requested for an address nobody registered.
    #[error("no host registered for address {0:?}")]
    AddressNotFound(String),

    /// The listener capability does not support the requested network.
    #[error("unsupported network {0:?}")]
    UnsupportedNetwork(String),

    /// Binding a listener failed (includes refusal after shutdown).
    #[error("listen on {address}: {source}")]
    Listen {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// An accept loop terminated on an accept failure.
    #[error("accept on {address}: {source}")]
    Accept {
        address: String,
        #[source]
        source: std::io::Error,
    },
}
