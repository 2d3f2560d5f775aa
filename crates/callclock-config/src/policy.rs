//! Validated policy structures

use crate::schema::{RawConfig, RawDurations, RawMidSession, RawRewards, RawRuntime, RawUpsell};
use callclock_api::EntitlementTier;
use std::time::Duration;

pub const DEFAULT_STANDARD_SECONDS: u32 = 15 * 60;
pub const DEFAULT_EXTENDED_SECONDS: u32 = 30 * 60;
pub const DEFAULT_MID_SESSION_THRESHOLD_SECONDS: u32 = 7 * 60;
pub const DEFAULT_UPSELL_THRESHOLD_SECONDS: u32 = 5 * 60;
pub const DEFAULT_TICK_MILLIS: u64 = 1000;
pub const DEFAULT_REWARD_AMOUNT: u32 = 10;
pub const DEFAULT_SIMULATED_LATENCY_MILLIS: u64 = 1000;
pub const SIMULATED_NETWORK: &str = "simulated";

/// Validated policy ready for use by the countdown core and driver
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimerPolicy {
    pub durations: DurationPolicy,
    pub mid_session: MidSessionPolicy,
    pub upsell: UpsellPolicy,
    pub runtime: RuntimePolicy,
    pub rewards: RewardsPolicy,
}

impl TimerPolicy {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            durations: DurationPolicy::from_raw(&raw.durations),
            mid_session: MidSessionPolicy::from_raw(&raw.mid_session),
            upsell: UpsellPolicy::from_raw(&raw.upsell),
            runtime: RuntimePolicy::from_raw(&raw.runtime),
            rewards: RewardsPolicy::from_raw(raw.rewards),
        }
    }

    /// Session length for a tier, in seconds
    pub fn max_seconds(&self, tier: EntitlementTier) -> u32 {
        self.durations.for_tier(tier)
    }

    /// The decision-point threshold, or None when disabled
    pub fn mid_session_threshold(&self) -> Option<u32> {
        self.mid_session
            .enabled
            .then_some(self.mid_session.threshold_seconds)
    }
}

/// Session length per tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationPolicy {
    pub standard_seconds: u32,
    pub extended_seconds: u32,
}

impl DurationPolicy {
    fn from_raw(raw: &RawDurations) -> Self {
        Self {
            standard_seconds: raw.standard_seconds.unwrap_or(DEFAULT_STANDARD_SECONDS),
            extended_seconds: raw.extended_seconds.unwrap_or(DEFAULT_EXTENDED_SECONDS),
        }
    }

    pub fn for_tier(&self, tier: EntitlementTier) -> u32 {
        match tier {
            EntitlementTier::Standard => self.standard_seconds,
            EntitlementTier::Extended => self.extended_seconds,
        }
    }
}

impl Default for DurationPolicy {
    fn default() -> Self {
        Self {
            standard_seconds: DEFAULT_STANDARD_SECONDS,
            extended_seconds: DEFAULT_EXTENDED_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidSessionPolicy {
    pub threshold_seconds: u32,
    pub enabled: bool,
}

impl MidSessionPolicy {
    fn from_raw(raw: &RawMidSession) -> Self {
        Self {
            threshold_seconds: raw
                .threshold_seconds
                .unwrap_or(DEFAULT_MID_SESSION_THRESHOLD_SECONDS),
            enabled: raw.enabled.unwrap_or(true),
        }
    }
}

impl Default for MidSessionPolicy {
    fn default() -> Self {
        Self {
            threshold_seconds: DEFAULT_MID_SESSION_THRESHOLD_SECONDS,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsellPolicy {
    pub threshold_seconds: u32,
}

impl UpsellPolicy {
    fn from_raw(raw: &RawUpsell) -> Self {
        Self {
            threshold_seconds: raw
                .threshold_seconds
                .unwrap_or(DEFAULT_UPSELL_THRESHOLD_SECONDS),
        }
    }
}

impl Default for UpsellPolicy {
    fn default() -> Self {
        Self {
            threshold_seconds: DEFAULT_UPSELL_THRESHOLD_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimePolicy {
    pub tick_interval: Duration,
}

impl RuntimePolicy {
    fn from_raw(raw: &RawRuntime) -> Self {
        Self {
            tick_interval: Duration::from_millis(raw.tick_millis.unwrap_or(DEFAULT_TICK_MILLIS)),
        }
    }
}

impl Default for RuntimePolicy {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(DEFAULT_TICK_MILLIS),
        }
    }
}

/// Rewarded-ad service settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardsPolicy {
    pub enabled: bool,
    /// Waterfall order
    pub networks: Vec<String>,
    pub reward_amount: u32,
    pub simulated_latency: Duration,
}

impl RewardsPolicy {
    fn from_raw(raw: RawRewards) -> Self {
        Self {
            enabled: raw.enabled.unwrap_or(true),
            networks: raw
                .networks
                .unwrap_or_else(|| vec![SIMULATED_NETWORK.to_string()]),
            reward_amount: raw.reward_amount.unwrap_or(DEFAULT_REWARD_AMOUNT),
            simulated_latency: Duration::from_millis(
                raw.simulated_latency_millis
                    .unwrap_or(DEFAULT_SIMULATED_LATENCY_MILLIS),
            ),
        }
    }
}

impl Default for RewardsPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            networks: vec![SIMULATED_NETWORK.to_string()],
            reward_amount: DEFAULT_REWARD_AMOUNT,
            simulated_latency: Duration::from_millis(DEFAULT_SIMULATED_LATENCY_MILLIS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = TimerPolicy::default();
        assert_eq!(policy.max_seconds(EntitlementTier::Standard), 900);
        assert_eq!(policy.max_seconds(EntitlementTier::Extended), 1800);
        assert_eq!(policy.mid_session_threshold(), Some(420));
        assert_eq!(policy.upsell.threshold_seconds, 300);
        assert_eq!(policy.runtime.tick_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_from_raw_matches_default() {
        let raw: RawConfig = toml::from_str("config_version = 1").unwrap();
        assert_eq!(TimerPolicy::from_raw(raw), TimerPolicy::default());
    }

    #[test]
    fn test_disabled_mid_session() {
        let mut policy = TimerPolicy::default();
        policy.mid_session.enabled = false;
        assert_eq!(policy.mid_session_threshold(), None);
    }
}
