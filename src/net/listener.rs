//! Listener opening.
//!
//! # Responsibilities
//! - Define the listener-opening capability consumed by the orchestrator
//! - Provide the default OS-level implementation (`TcpBinder`)
//! - Normalize port-only addresses (":9000") for the OS bind call

use std::io;

use async_trait::async_trait;
use tokio::net::TcpListener;

use crate::error::ProxyError;
use crate::lifecycle::Shutdown;

/// Capability that opens listening sockets for the orchestrator.
#[async_trait]
pub trait ListenerFactory: Send + Sync {
    /// Open one listener on `network`/`address`, or refuse if `shutdown`
    /// has already been triggered.
    async fn listen(
        &self,
        shutdown: &Shutdown,
        network: &str,
        address: &str,
    ) -> Result<TcpListener, ProxyError>;
}

/// Default listener factory: a plain OS-level TCP bind.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpBinder;

#[async_trait]
impl ListenerFactory for TcpBinder {
    async fn listen(
        &self,
        shutdown: &Shutdown,
        network: &str,
        address: &str,
    ) -> Result<TcpListener, ProxyError> {
        if network != "tcp" {
            return Err(ProxyError::UnsupportedNetwork(network.to_string()));
        }
        if shutdown.is_triggered() {
            return Err(ProxyError::Listen {
                address: address.to_string(),
                source: io::Error::new(io::ErrorKind::Interrupted, "shutdown triggered"),
            });
        }

        // ":9000" means every interface; the OS wants an explicit host.
        let bind_target = if address.starts_with(':') {
            format!("0.0.0.0{address}")
        } else {
            address.to_string()
        };

        let listener = TcpListener::bind(&bind_target)
            .await
            .map_err(|source| ProxyError::Listen {
                address: address.to_string(),
                source,
            })?;

        if let Ok(local) = listener.local_addr() {
            tracing::info!(address = %local, "Listener bound");
        }
        Ok(listener)
    }
}
