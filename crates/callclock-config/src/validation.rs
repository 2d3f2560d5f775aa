//! Configuration validation

use crate::policy::{
    DEFAULT_EXTENDED_SECONDS, DEFAULT_MID_SESSION_THRESHOLD_SECONDS, DEFAULT_STANDARD_SECONDS,
    DEFAULT_TICK_MILLIS, DEFAULT_UPSELL_THRESHOLD_SECONDS,
};
use crate::schema::{RawConfig, RawRewards};
use std::collections::HashSet;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Duration '{field}' must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("Extended duration {extended}s is shorter than standard duration {standard}s")]
    ExtendedShorterThanStandard { standard: u32, extended: u32 },

    #[error("Mid-session threshold {threshold}s must be less than the shortest session {min_session}s")]
    ThresholdNotBelowSession { threshold: u32, min_session: u32 },

    #[error("Upsell threshold {threshold}s exceeds standard duration {standard}s")]
    UpsellExceedsSession { threshold: u32, standard: u32 },

    #[error("Tick period must be greater than zero")]
    ZeroTick,

    #[error("Reward network name cannot be empty")]
    EmptyNetworkName,

    #[error("Duplicate reward network: {0}")]
    DuplicateNetwork(String),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let standard = config
        .durations
        .standard_seconds
        .unwrap_or(DEFAULT_STANDARD_SECONDS);
    let extended = config
        .durations
        .extended_seconds
        .unwrap_or(DEFAULT_EXTENDED_SECONDS);

    if standard == 0 {
        errors.push(ValidationError::ZeroDuration {
            field: "standard_seconds",
        });
    }
    if extended == 0 {
        errors.push(ValidationError::ZeroDuration {
            field: "extended_seconds",
        });
    }
    if extended < standard {
        errors.push(ValidationError::ExtendedShorterThanStandard { standard, extended });
    }

    // The decision point has to land inside every session, including the shortest.
    // A disabled decision point is still checked so re-enabling it is safe.
    let threshold = config
        .mid_session
        .threshold_seconds
        .unwrap_or(DEFAULT_MID_SESSION_THRESHOLD_SECONDS);
    let min_session = standard.min(extended);
    if min_session > 0 && threshold >= min_session {
        errors.push(ValidationError::ThresholdNotBelowSession {
            threshold,
            min_session,
        });
    }

    let upsell = config
        .upsell
        .threshold_seconds
        .unwrap_or(DEFAULT_UPSELL_THRESHOLD_SECONDS);
    if standard > 0 && upsell > standard {
        errors.push(ValidationError::UpsellExceedsSession {
            threshold: upsell,
            standard,
        });
    }

    if config.runtime.tick_millis.unwrap_or(DEFAULT_TICK_MILLIS) == 0 {
        errors.push(ValidationError::ZeroTick);
    }

    errors.extend(validate_rewards(&config.rewards));

    errors
}

fn validate_rewards(rewards: &RawRewards) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let Some(networks) = &rewards.networks else {
        return errors;
    };

    let mut seen = HashSet::new();
    for name in networks {
        if name.trim().is_empty() {
            errors.push(ValidationError::EmptyNetworkName);
        } else if !seen.insert(name.as_str()) {
            errors.push(ValidationError::DuplicateNetwork(name.clone()));
        }
    }

    errors
}
