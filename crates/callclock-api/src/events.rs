//! Event types for countdown -> owner delivery

use callclock_util::SessionId;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::{API_VERSION, CallCategory, EntitlementTier, SessionEndReason, SessionSnapshot};

/// Event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub api_version: u32,
    pub timestamp: DateTime<Local>,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            api_version: API_VERSION,
            timestamp: callclock_util::now(),
            payload,
        }
    }
}

/// All events a running countdown reports to its owner
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// Call connected and the countdown started
    SessionStarted {
        session_id: SessionId,
        tier: EntitlementTier,
        category: CallCategory,
        max_seconds: u32,
    },

    /// The one-time decision point was reached
    MidSessionReached {
        session_id: SessionId,
        remaining_seconds: u32,
    },

    /// The countdown reached zero
    SessionExpired {
        session_id: SessionId,
    },

    /// The session was stopped
    SessionEnded {
        session_id: SessionId,
        reason: SessionEndReason,
        elapsed_seconds: u32,
    },

    /// Full snapshot, sent after changes the owner did not trigger by tick
    StateChanged(SessionSnapshot),

    /// The driver is shutting down
    Shutdown,
}
