//! Shared utilities for callclock
//!
//! This crate provides:
//! - ID types (SessionId, CallId)
//! - Time utilities (wall clock, countdown formatting)
//! - Default paths for the configuration file

mod ids;
mod paths;
mod time;

pub use ids::*;
pub use paths::*;
pub use time::*;
