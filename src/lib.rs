//! Purpose: Library crate backing the `popcol` CLI and tests.
//! Exports: `core` (records, message log, errors), `api` (service, view, transport),
//! `notice` (stderr notice schema).
//! Role: Client for a remote REST collection of Pop records.
//! Invariants: Transport failures never escape `api::PopService` except strict not-found.
//! Invariants: Shared state is passed explicitly; there are no process-global singletons.
pub mod api;
pub mod core;
pub mod notice;
