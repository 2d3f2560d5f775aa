//! Session countdown state machine and call controller for callclock
//!
//! This crate is the heart of callclock, containing:
//! - The per-call countdown (Idle -> Running -> Expired -> Idle)
//! - The one-time mid-session decision point and expiry notifications
//! - The call controller that maps connection, entitlement and category
//!   inputs onto the countdown
//! - Pure display derivations (M:SS text, severity band, progress)

mod call;
mod countdown;
mod display;
mod events;

pub use call::*;
pub use countdown::*;
pub use display::*;
pub use events::*;
