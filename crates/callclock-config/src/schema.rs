//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Session length per entitlement tier
    #[serde(default)]
    pub durations: RawDurations,

    /// Mid-session decision point
    #[serde(default)]
    pub mid_session: RawMidSession,

    /// Upgrade prompt
    #[serde(default)]
    pub upsell: RawUpsell,

    /// Tick driver settings
    #[serde(default)]
    pub runtime: RawRuntime,

    /// Rewarded-ad service
    #[serde(default)]
    pub rewards: RawRewards,
}

/// Session durations, in seconds
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawDurations {
    /// Standard tier (default 900)
    pub standard_seconds: Option<u32>,

    /// Extended tier (default 1800)
    pub extended_seconds: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawMidSession {
    /// Remaining seconds at which the decision point fires (default 420)
    pub threshold_seconds: Option<u32>,

    /// Set to false to never fire the decision point
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawUpsell {
    /// Show the upgrade prompt once fewer than this many seconds remain (default 300)
    pub threshold_seconds: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawRuntime {
    /// Tick period in milliseconds (default 1000)
    pub tick_millis: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawRewards {
    /// Enable the rewarded-ad service
    pub enabled: Option<bool>,

    /// Networks to try, in waterfall order
    pub networks: Option<Vec<String>>,

    /// Reward granted by the simulated network
    pub reward_amount: Option<u32>,

    /// Latency of the simulated network, in milliseconds
    pub simulated_latency_millis: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
            config_version = 1

            [durations]
            standard_seconds = 600
            extended_seconds = 1200

            [mid_session]
            threshold_seconds = 300
            enabled = true

            [upsell]
            threshold_seconds = 120

            [runtime]
            tick_millis = 250

            [rewards]
            enabled = false
            networks = ["simulated", "backup"]
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.durations.standard_seconds, Some(600));
        assert_eq!(config.mid_session.threshold_seconds, Some(300));
        assert_eq!(config.runtime.tick_millis, Some(250));
        assert_eq!(config.rewards.networks.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn sections_are_optional() {
        let config: RawConfig = toml::from_str("config_version = 1").unwrap();
        assert!(config.durations.standard_seconds.is_none());
        assert!(config.rewards.enabled.is_none());
    }
}
