//! Multi-protocol connection dispatcher.
//!
//! Several proxy services can share one listening socket. Each service
//! is named by a descriptor string
//! `scheme://[user[:pass]@]host[:port][?query]`. The registry merges
//! descriptors by listening address, builds a
//! protocol handler per (scheme, host) through an external factory, and
//! routes each accepted connection to the right handler by its leading
//! bytes.
//!
//! # Architecture Overview
//!
//! ```text
//!  descriptors ──▶ descriptor (parse, group credentials/queries)
//!       │
//!       ▼
//!  registry::build ──▶ HandlerFactory (external) ──▶ handlers
//!       │                                                │
//!       ▼                                                ▼
//!  address ──▶ Host ──▶ PatternMux (prefixes + one fallback)
//!
//!  serve_one / run ──▶ ListenerFactory ──▶ accept loops
//!       │                                      │
//!       ▼                                      ▼
//!  Shutdown (observable cancellation)    one task per connection
//! ```
//!
//! Everything is built before serving starts and never mutated after, so
//! dispatch is lock-free.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod handler;
pub mod host;
pub mod lifecycle;
pub mod mux;
pub mod net;
pub mod registry;

pub use config::Config;
pub use descriptor::{AddressSpec, Credential};
pub use error::{BoxError, ProxyError};
pub use handler::{Conn, ConnHandler, HandlerFactory, Routing, Service};
pub use host::Host;
pub use lifecycle::Shutdown;
pub use mux::PatternMux;
pub use net::{ListenerFactory, TcpBinder};
pub use registry::Registry;
