//! Shared types for callclock
//!
//! This crate defines the stable surface between the countdown core and
//! whatever embeds it (a call view, the simulator, tests):
//! - Entitlement and call-category inputs
//! - Session snapshots for display
//! - Events (countdown -> owner)
//! - Versioning

mod events;
mod types;

pub use events::*;
pub use types::*;

/// Current API version
pub const API_VERSION: u32 = 1;
