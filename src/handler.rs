//! Handler capability seams.
//!
//! # Data Flow
//! ```text
//! Registry::build
//!     → HandlerFactory::build(scheme, host, per-group Config)
//!     → Service { handler, routing, upstream_urls }
//!     → registered into the address's PatternMux
//!
//! At serve time:
//!     PatternMux::dispatch → ConnHandler::serve(conn, peer)
//! ```
//!
//! # Design Decisions
//! - Handlers receive a boxed stream, not a bare TcpStream, so the mux
//!   can replay the bytes it peeked during routing
//! - Upstream URLs are a plain list on the return value: zero, one, or
//!   many as a single shape, no runtime capability probing
//! - A factory error aborts registry construction entirely

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::config::Config;
use crate::error::BoxError;

/// Byte stream handed to a protocol handler.
pub trait Conn: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin + ?Sized> Conn for T {}

/// One protocol handler serving accepted connections.
///
/// Errors are per-connection: the dispatcher logs them and moves on,
/// they never reach the orchestrator.
#[async_trait]
pub trait ConnHandler: Send + Sync {
    async fn serve(&self, conn: Box<dyn Conn>, peer: SocketAddr) -> std::io::Result<()>;
}

/// How a handler wants connections routed to it on its shared socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routing {
    /// Route connections whose leading bytes start with one of these
    /// prefixes. An empty list means the same as `Fallback`.
    Prefixes(Vec<String>),
    /// Take every connection no other handler matched. At most one
    /// handler per address may ask for this.
    Fallback,
}

/// What a factory returns for one (scheme, host) pair.
pub struct Service {
    pub handler: Arc<dyn ConnHandler>,
    pub routing: Routing,
    /// Upstream proxy URLs this handler relays through, for
    /// introspection. Order is preserved, duplicates included.
    pub upstream_urls: Vec<String>,
}

/// Capability that builds a protocol handler for one (scheme, host)
/// pair with its group-scoped configuration.
#[async_trait]
pub trait HandlerFactory: Send + Sync {
    async fn build(&self, scheme: &str, host: &str, conf: &Config) -> Result<Service, BoxError>;
}
