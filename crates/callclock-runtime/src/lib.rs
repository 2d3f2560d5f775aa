//! Tick driver for callclock
//!
//! Provides:
//! - A single tokio task per call that owns the `CallSession`
//! - A per-session tick interval, created on connect and dropped on disconnect
//! - Command/ack messaging so that once `disconnect()` returns no tick can fire
//! - Event delivery to the owner over an mpsc channel

mod driver;

pub use driver::*;

use thiserror::Error;

/// Driver errors
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Driver task has stopped")]
    Closed,
}

pub type DriverResult<T> = Result<T, DriverError>;
