//! Top-level facade crate for admitd.
//!
//! Re-exports core types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use admitd_core::*;
}

pub mod gateway {
    pub use admitd_gateway::*;
}
