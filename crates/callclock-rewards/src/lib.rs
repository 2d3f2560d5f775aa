//! Rewarded-ad mediation for callclock
//!
//! This crate defines the interface to ad networks, a simulated network for
//! local runs and tests, and the service that tries networks in order.

mod network;
mod service;
mod simulated;

pub use network::*;
pub use service::*;
pub use simulated::*;
