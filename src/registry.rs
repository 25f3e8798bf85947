//! Registry construction and the serving orchestrator.
//!
//! # Data Flow
//! ```text
//! Construction (Registry::build):
//!     descriptors → AddressSpec::parse → SpecGroups (credentials)
//!         → HandlerFactory::build per descriptor
//!         → register into the address's Host (prefixes or fallback)
//!     → frozen address → Host map
//!
//! Serving (serve_one / run):
//!     ListenerFactory::listen per address
//!         → accept loop (one task per address)
//!         → one task per accepted connection → Host::serve_conn
//! ```
//!
//! # Design Decisions
//! - Construction is atomic: the first parse, factory, or registration
//!   failure aborts and no partial registry escapes
//! - Everything is frozen before serving starts, so dispatch never locks
//! - `run` starts listeners in sorted address order; a bind failure
//!   aborts and drops what was already started, which closes those
//!   listeners and aborts their accept loops
//! - The first accept-loop failure decides `run`'s result

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinSet;

use crate::config::Config;
use crate::descriptor::{AddressSpec, SpecGroups};
use crate::error::ProxyError;
use crate::handler::{HandlerFactory, Routing};
use crate::host::Host;
use crate::lifecycle::Shutdown;

/// The address → Host mapping plus the shared configuration.
///
/// Built once, read-only afterwards; shared by reference across every
/// accept loop and connection task.
pub struct Registry {
    hosts: HashMap<String, Arc<Host>>,
    conf: Config,
}

impl Registry {
    /// Build the full registry from descriptor strings.
    ///
    /// Descriptors sharing a `host:port` merge into one Host and share
    /// its dispatcher; per-(scheme,host) credentials are accumulated in
    /// descriptor order and scoped, with the descriptor's own query,
    /// into the configuration each factory call receives.
    pub async fn build<I, S>(
        descriptors: I,
        conf: Config,
        factory: &dyn HandlerFactory,
    ) -> Result<Self, ProxyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut groups = SpecGroups::default();
        let mut hosts: HashMap<String, Host> = HashMap::new();

        for raw in descriptors {
            let spec = AddressSpec::parse(raw.as_ref())?;
            groups.observe(&spec);
            let scoped = groups.scoped_config(&spec, &conf);

            let service = factory
                .build(&spec.scheme, &spec.host, &scoped)
                .await
                .map_err(|source| ProxyError::HandlerBuild {
                    scheme: spec.scheme.clone(),
                    host: spec.host.clone(),
                    source,
                })?;

            let host = hosts.entry(spec.host.clone()).or_insert_with(Host::new);
            host.upstream_urls.extend(service.upstream_urls);
            match service.routing {
                Routing::Prefixes(prefixes) if !prefixes.is_empty() => {
                    host.mux.handle_prefix(service.handler, prefixes);
                }
                // An empty prefix list means the same as the explicit
                // marker: this handler is the address's fallback.
                Routing::Prefixes(_) | Routing::Fallback => {
                    host.mux
                        .set_fallback(service.handler)
                        .map_err(|_| ProxyError::FallbackConflict {
                            address: spec.host.clone(),
                        })?;
                }
            }
            tracing::debug!(
                scheme = %spec.scheme,
                address = %spec.host,
                "Registered proxy service"
            );
        }

        Ok(Self {
            hosts: hosts
                .into_iter()
                .map(|(address, host)| (address, Arc::new(host)))
                .collect(),
            conf,
        })
    }

    /// The Host for an exact address string, if registered.
    pub fn lookup(&self, address: &str) -> Option<Arc<Host>> {
        self.hosts.get(address).cloned()
    }

    /// Every registered address, sorted ascending. Recomputed on demand;
    /// independent of descriptor order.
    pub fn addresses(&self) -> Vec<String> {
        let mut addresses: Vec<String> = self.hosts.keys().cloned().collect();
        addresses.sort();
        addresses
    }

    /// Serve a single registered address until its accept loop fails.
    ///
    /// Fails with `AddressNotFound` before any listener is opened if the
    /// address was never registered.
    pub async fn serve_one(&self, network: &str, address: &str) -> Result<(), ProxyError> {
        let host = self
            .lookup(address)
            .ok_or_else(|| ProxyError::AddressNotFound(address.to_string()))?;
        let shutdown = Shutdown::new();
        let listener = self.conf.listen.listen(&shutdown, network, address).await?;
        accept_loop(listener, address.to_string(), host, shutdown).await
    }

    /// Open a listener for every registered address, in sorted order,
    /// and run their accept loops concurrently.
    ///
    /// Returns the first accept-loop failure, a bind failure, or `Ok`
    /// once `shutdown` is triggered and every loop has wound down.
    pub async fn run(&self, shutdown: &Shutdown) -> Result<(), ProxyError> {
        let mut loops: JoinSet<Result<(), ProxyError>> = JoinSet::new();
        for address in self.addresses() {
            let Some(host) = self.lookup(&address) else {
                continue;
            };
            // A bind failure returns here; dropping `loops` aborts the
            // accept loops already running and closes their listeners.
            let listener = self.conf.listen.listen(shutdown, "tcp", &address).await?;
            loops.spawn(accept_loop(listener, address, host, shutdown.clone()));
        }

        while let Some(joined) = loops.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(error)) => return Err(error),
                Err(join_error) if join_error.is_cancelled() => {}
                Err(join_error) => {
                    tracing::error!(%join_error, "Accept loop task failed abnormally");
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("addresses", &self.addresses())
            .finish_non_exhaustive()
    }
}

/// Opened → Accepting → (Terminated: error | Cancelled). One task per
/// accepted connection; connection failures stay in that task.
async fn accept_loop(
    listener: TcpListener,
    address: String,
    host: Arc<Host>,
    shutdown: Shutdown,
) -> Result<(), ProxyError> {
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        tracing::debug!(address = %address, peer = %peer, "Connection accepted");
                        let host = Arc::clone(&host);
                        tokio::spawn(async move {
                            host.serve_conn(stream, peer).await;
                        });
                    }
                    Err(source) => {
                        return Err(ProxyError::Accept { address, source });
                    }
                }
            }
            _ = shutdown.triggered() => {
                tracing::info!(address = %address, "Accept loop stopped by shutdown");
                return Ok(());
            }
        }
    }
}
