//! Shared configuration.
//!
//! # Design Decisions
//! - One `Config` value is shared by the whole registry; per-group copies
//!   are derived from it during construction and discarded afterwards
//! - The listener-opening capability lives here because it is global and
//!   shared, not per-host
//! - `users` and `raw_queries` are order-significant and never deduped

use std::fmt;
use std::sync::Arc;

use crate::descriptor::Credential;
use crate::net::{ListenerFactory, TcpBinder};

/// Process-wide options plus the two accumulating lists scoped per
/// (scheme,host) group when a handler is built.
#[derive(Clone)]
pub struct Config {
    /// Default credentials appended after any group-accumulated ones.
    pub users: Vec<Credential>,
    /// Raw query strings; group queries are appended after these.
    pub raw_queries: Vec<String>,
    /// Capability that opens listening sockets.
    pub listen: Arc<dyn ListenerFactory>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            users: Vec::new(),
            raw_queries: Vec::new(),
            listen: Arc::new(TcpBinder),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("users", &self.users)
            .field("raw_queries", &self.raw_queries)
            .finish_non_exhaustive()
    }
}
