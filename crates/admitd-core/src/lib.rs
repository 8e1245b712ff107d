//! admitd core: transport-agnostic admission types, error codes, and wire formats.
//!
//! This crate defines the contracts shared by the gateway binary, its tests,
//! and any caller that wants to speak the admission protocol. It carries no
//! runtime or store dependencies so it can be reused from other services.
//!
//! # Defensive guarantees
//! Panics, `unwrap` and `expect` are compile-denied here. All fallible paths
//! surface as `AdmitError`/`Result` so malformed gateway input never crashes
//! the process.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{AdmitError, Classification, Result};
