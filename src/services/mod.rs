//! Services layer (ports + adapters).
//!
//! - `ports`: transport, runtime and config contracts.
//! - `adapters`: tokio-backed implementations of those contracts.

pub mod adapters;
pub mod ports;
