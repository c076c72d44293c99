//! Purpose: Define the public Rust API boundary for popcol.
//! Exports: Records, message log, errors, the data access service, and the listing view.
//! Role: Public surface used by the CLI and integration tests.
//! Invariants: Transport failures are absorbed by `PopService`; callers see defaults.
//! Invariants: The transport is a trait seam so tests can script replies.

#[cfg(test)]
pub(crate) mod fake;
mod service;
mod transport;
mod view;

pub use crate::core::error::{Error, ErrorKind, to_exit_code};
pub use crate::core::messages::MessageLog;
pub use crate::core::pop::{Pop, PopCollection};
pub use service::{Ack, ApiResult, DEFAULT_BASE_URL, PopService};
pub use transport::{HttpTransport, Method, Reply, Request, Transport};
pub use view::{LoadState, PopsView};
