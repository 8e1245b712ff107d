//! Transport layer (HTTP).
//!
//! Exposes the admission endpoint. Decoding happens once here; the pipeline
//! only ever sees a well-formed descriptor.

pub mod http;
