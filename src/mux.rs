//! Prefix-pattern connection dispatch.
//!
//! # Data Flow
//! ```text
//! Accepted connection
//!     → read leading bytes (buffered, never lost)
//!     → first registered prefix that fully matches wins
//!     → no match: fallback handler, if one is registered
//!     → neither: connection is dropped
//!     → selected handler gets the stream with the buffered bytes
//!       replayed in front (RewoundConn)
//! ```
//!
//! # Design Decisions
//! - Registration order is priority order; first match wins
//! - Selection is deterministic for the same leading bytes
//! - An earlier prefix that is still possible blocks later matches until
//!   enough bytes arrive to decide it
//! - EOF before a decision routes to the fallback: a silent client is
//!   exactly what fallback protocols (e.g. server-speaks-first) expect

use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::{Buf, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, ReadBuf};

use crate::handler::{Conn, ConnHandler};

/// A second fallback registration was attempted.
#[derive(Debug, Error)]
#[error("fallback handler already registered")]
pub struct FallbackTaken;

struct Route {
    prefix: Vec<u8>,
    handler: Arc<dyn ConnHandler>,
}

enum Selection {
    Route(usize),
    Fallback,
    Undecided,
}

/// Routes connections to handlers by their leading bytes.
///
/// Built during registry construction, immutable afterwards; dispatch
/// takes `&self` and needs no locking.
#[derive(Default)]
pub struct PatternMux {
    routes: Vec<Route>,
    fallback: Option<Arc<dyn ConnHandler>>,
}

impl PatternMux {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for every prefix in `prefixes`, keeping
    /// registration order as match priority.
    pub fn handle_prefix(&mut self, handler: Arc<dyn ConnHandler>, prefixes: Vec<String>) {
        for prefix in prefixes {
            self.routes.push(Route {
                prefix: prefix.into_bytes(),
                handler: Arc::clone(&handler),
            });
        }
    }

    /// Register the fallback handler. At most one per mux.
    pub fn set_fallback(&mut self, handler: Arc<dyn ConnHandler>) -> Result<(), FallbackTaken> {
        if self.fallback.is_some() {
            return Err(FallbackTaken);
        }
        self.fallback = Some(handler);
        Ok(())
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    fn select(&self, leading: &[u8]) -> Selection {
        for (idx, route) in self.routes.iter().enumerate() {
            let n = leading.len().min(route.prefix.len());
            if leading[..n] != route.prefix[..n] {
                continue;
            }
            if leading.len() >= route.prefix.len() {
                return Selection::Route(idx);
            }
            // Still possible; its priority blocks everything after it.
            return Selection::Undecided;
        }
        Selection::Fallback
    }

    /// Inspect the connection's leading bytes and hand it, bytes
    /// replayed, to the selected handler. Handler errors are logged
    /// here and go no further.
    pub async fn dispatch<S>(&self, mut stream: S, peer: SocketAddr)
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let mut leading = BytesMut::new();
        let handler = loop {
            match self.select(&leading) {
                Selection::Route(idx) => break Some(Arc::clone(&self.routes[idx].handler)),
                Selection::Fallback => break self.fallback.clone(),
                Selection::Undecided => match stream.read_buf(&mut leading).await {
                    Ok(0) => break self.fallback.clone(),
                    Ok(_) => {}
                    Err(error) => {
                        tracing::debug!(peer = %peer, %error, "Read failed while sniffing");
                        return;
                    }
                },
            }
        };

        let Some(handler) = handler else {
            tracing::warn!(peer = %peer, "No handler matched and no fallback; dropping connection");
            return;
        };

        let conn: Box<dyn Conn> = Box::new(RewoundConn {
            leading,
            inner: stream,
        });
        if let Err(error) = handler.serve(conn, peer).await {
            tracing::warn!(peer = %peer, %error, "Connection handler failed");
        }
    }
}

/// Stream adapter that replays sniffed bytes before the live stream.
struct RewoundConn<S> {
    leading: BytesMut,
    inner: S,
}

impl<S: AsyncRead + Unpin> AsyncRead for RewoundConn<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if !this.leading.is_empty() {
            let n = this.leading.len().min(buf.remaining());
            buf.put_slice(&this.leading[..n]);
            this.leading.advance(n);
            return Poll::Ready(Ok(()));
        }
        Pin::new(&mut this.inner).poll_read(cx, buf)
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for RewoundConn<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}
