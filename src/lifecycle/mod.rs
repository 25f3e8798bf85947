//! Lifecycle management.
//!
//! # Data Flow
//! ```text
//! Shutdown trigger (caller, signal handler, test)
//!     → watch channel flips to true
//!     → pending listener binds refuse (TcpBinder checks first)
//!     → running accept loops observe the flip and exit cleanly
//! ```
//!
//! # Design Decisions
//! - Cancellation is explicit and observable: accept loops select on the
//!   signal instead of relying on bind-time checks alone
//! - A dropped trigger handle counts as shutdown, never as a hang

pub mod shutdown;

pub use shutdown::Shutdown;
