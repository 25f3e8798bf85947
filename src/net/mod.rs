//! Network layer.
//!
//! # Data Flow
//! ```text
//! serve_one / run
//!     → ListenerFactory::listen (capability; default: TcpBinder)
//!     → tokio TcpListener
//!     → accept loop in registry.rs
//! ```
//!
//! # Design Decisions
//! - Listener opening is a capability so callers can substitute bound,
//!   instrumented, or pre-opened listeners
//! - The capability sees the shutdown signal: a triggered signal refuses
//!   the bind, which is the cancellation point `run` relies on

pub mod listener;

pub use listener::{ListenerFactory, TcpBinder};
