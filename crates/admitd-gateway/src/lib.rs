//! admitd gateway library entry.
//!
//! This crate wires config, counter store clients, the policy validator and
//! rate limiter, and the HTTP surface into one admission service. It is
//! consumed by the binary (`main.rs`) and by integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod admission;
pub mod app_state;
pub mod config;
pub mod obs;
pub mod ops;
pub mod policy;
pub mod router;
pub mod store;
pub mod transport;
