//! Per-address host state.
//!
//! # Design Decisions
//! - One Host per distinct listening address; every scheme registered on
//!   that address shares its mux
//! - Immutable once the registry is built: accept loops and connection
//!   tasks share it by `Arc` with no locking

use std::net::SocketAddr;

use tokio::net::TcpStream;

use crate::mux::PatternMux;

/// One listening address with its connection dispatcher and the upstream
/// proxy URLs of every handler registered on it.
pub struct Host {
    pub(crate) mux: PatternMux,
    pub(crate) upstream_urls: Vec<String>,
}

impl Host {
    pub(crate) fn new() -> Self {
        Self {
            mux: PatternMux::new(),
            upstream_urls: Vec::new(),
        }
    }

    /// Upstream proxy URLs aggregated in registration order, duplicates
    /// included.
    pub fn upstream_urls(&self) -> &[String] {
        &self.upstream_urls
    }

    /// Route one accepted connection to its handler.
    pub async fn serve_conn(&self, stream: TcpStream, peer: SocketAddr) {
        self.mux.dispatch(stream, peer).await;
    }
}
