//! Shared types for the callclock API

use callclock_util::SessionId;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Entitlement tier, which decides the maximum session length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitlementTier {
    #[default]
    Standard,
    Extended,
}

/// Which side of the call provides the extended entitlement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitlementSource {
    /// Neither participant holds premium
    None,
    /// The local user holds premium
    Own,
    /// Only the counterpart holds premium
    Partner,
}

/// Premium flags for both participants of a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Entitlements {
    pub self_premium: bool,
    pub partner_premium: bool,
}

impl Entitlements {
    pub fn new(self_premium: bool, partner_premium: bool) -> Self {
        Self {
            self_premium,
            partner_premium,
        }
    }

    /// Build from possibly-missing flags. A missing flag counts as not premium.
    pub fn from_flags(self_premium: Option<bool>, partner_premium: Option<bool>) -> Self {
        Self {
            self_premium: self_premium.unwrap_or(false),
            partner_premium: partner_premium.unwrap_or(false),
        }
    }

    /// Extended if either participant holds premium
    pub fn tier(&self) -> EntitlementTier {
        if self.self_premium || self.partner_premium {
            EntitlementTier::Extended
        } else {
            EntitlementTier::Standard
        }
    }

    pub fn source(&self) -> EntitlementSource {
        if self.self_premium {
            EntitlementSource::Own
        } else if self.partner_premium {
            EntitlementSource::Partner
        } else {
            EntitlementSource::None
        }
    }
}

/// Call category as reported by the signaling layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallCategory {
    /// A freshly matched stranger
    #[default]
    Random,
    /// A call with an established contact
    Friend,
}

impl CallCategory {
    /// Exempt calls never reach the mid-session decision point
    pub fn is_exempt(&self) -> bool {
        matches!(self, CallCategory::Friend)
    }

    pub fn from_exempt(exempt: bool) -> Self {
        if exempt {
            CallCategory::Friend
        } else {
            CallCategory::Random
        }
    }
}

/// Severity band derived from the remaining fraction of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityBand {
    /// More than half left
    Nominal,
    /// Between a quarter and a half left
    Warning,
    /// Less than a quarter left
    Critical,
}

/// Countdown lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountdownState {
    /// Not connected; showing the full duration for the current tier
    Idle,
    /// Decrementing once per tick
    Running,
    /// Reached zero; waits for the call to disconnect
    Expired,
}

/// Why a countdown session ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEndReason {
    /// The call disconnected
    Disconnected,
    /// The owning view or driver was torn down
    Shutdown,
}

/// Display snapshot of a call's countdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Present once a session has started, cleared on disconnect
    pub session_id: Option<SessionId>,
    pub state: CountdownState,
    pub tier: EntitlementTier,
    pub entitlement_source: EntitlementSource,
    pub category: CallCategory,
    pub remaining_seconds: u32,
    pub max_seconds: u32,
    /// `M:SS`
    pub remaining_text: String,
    pub band: SeverityBand,
    /// Remaining fraction in `[0.0, 1.0]`
    pub progress: f64,
    pub mid_session_fired: bool,
    /// Whether the "time to decide" prompt should be shown
    pub decision_prompt_visible: bool,
    /// Whether the upgrade prompt should be shown
    pub upsell_visible: bool,
    pub started_at: Option<DateTime<Local>>,
}
