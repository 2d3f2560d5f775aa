//! Session countdown state machine

use callclock_api::{CountdownState, EntitlementTier};
use callclock_config::TimerPolicy;

use crate::{CountdownEvent, CountdownObserver};

/// Durations and threshold a countdown is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownConfig {
    pub standard_seconds: u32,
    pub extended_seconds: u32,
    /// Remaining seconds at which the decision point fires. None disables it.
    pub mid_session_threshold: Option<u32>,
}

impl CountdownConfig {
    pub fn max_seconds(&self, tier: EntitlementTier) -> u32 {
        match tier {
            EntitlementTier::Standard => self.standard_seconds,
            EntitlementTier::Extended => self.extended_seconds,
        }
    }
}

impl From<&TimerPolicy> for CountdownConfig {
    fn from(policy: &TimerPolicy) -> Self {
        Self {
            standard_seconds: policy.durations.standard_seconds,
            extended_seconds: policy.durations.extended_seconds,
            mid_session_threshold: policy.mid_session_threshold(),
        }
    }
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self::from(&TimerPolicy::default())
    }
}

/// Remaining-time countdown for one call.
///
/// The countdown does not own a clock. Whoever owns it calls [`tick`] once per
/// period while [`is_active`] is true; ticks on an inactive countdown are
/// ignored.
///
/// [`tick`]: SessionCountdown::tick
/// [`is_active`]: SessionCountdown::is_active
#[derive(Debug, Clone)]
pub struct SessionCountdown {
    config: CountdownConfig,
    tier: EntitlementTier,
    remaining_seconds: u32,
    max_seconds: u32,
    active: bool,
    expired: bool,
    exempt: bool,
    mid_session_fired: bool,
}

impl SessionCountdown {
    /// Create an idle countdown showing the full duration for `tier`
    pub fn new(config: CountdownConfig, tier: EntitlementTier) -> Self {
        let max_seconds = config.max_seconds(tier);
        Self {
            config,
            tier,
            remaining_seconds: max_seconds,
            max_seconds,
            active: false,
            expired: false,
            exempt: false,
            mid_session_fired: false,
        }
    }

    /// Begin a session. The duration is fixed here until the next start.
    pub fn start(&mut self, tier: EntitlementTier, exempt: bool) {
        self.tier = tier;
        self.max_seconds = self.config.max_seconds(tier);
        self.remaining_seconds = self.max_seconds;
        self.active = true;
        self.expired = false;
        self.exempt = exempt;
        self.mid_session_fired = false;
    }

    /// End the session and reset to the full duration for `tier`
    pub fn stop(&mut self, tier: EntitlementTier) {
        self.tier = tier;
        self.max_seconds = self.config.max_seconds(tier);
        self.remaining_seconds = self.max_seconds;
        self.active = false;
        self.expired = false;
        self.mid_session_fired = false;
    }

    /// Advance by one second.
    ///
    /// Returns the events that fired, decision point first.
    pub fn tick(&mut self) -> Vec<CountdownEvent> {
        let mut events = Vec::new();

        if !self.active {
            return events;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);

        if let Some(threshold) = self.config.mid_session_threshold
            && !self.exempt
            && !self.mid_session_fired
            && self.remaining_seconds <= threshold
        {
            self.mid_session_fired = true;
            events.push(CountdownEvent::MidSessionReached {
                remaining_seconds: self.remaining_seconds,
            });
        }

        if self.remaining_seconds == 0 {
            self.active = false;
            self.expired = true;
            events.push(CountdownEvent::Expired);
        }

        events
    }

    /// Advance by one second and notify `observer` of each event as it fires
    pub fn tick_with(&mut self, observer: &mut impl CountdownObserver) -> Vec<CountdownEvent> {
        let events = self.tick();
        for event in &events {
            match event {
                CountdownEvent::MidSessionReached { .. } => observer.on_mid_session_reached(),
                CountdownEvent::Expired => observer.on_session_expired(),
            }
        }
        events
    }

    pub fn state(&self) -> CountdownState {
        if self.active {
            CountdownState::Running
        } else if self.expired {
            CountdownState::Expired
        } else {
            CountdownState::Idle
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_exempt(&self) -> bool {
        self.exempt
    }

    pub fn tier(&self) -> EntitlementTier {
        self.tier
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn max_seconds(&self) -> u32 {
        self.max_seconds
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.max_seconds - self.remaining_seconds
    }

    pub fn mid_session_fired(&self) -> bool {
        self.mid_session_fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard() -> SessionCountdown {
        SessionCountdown::new(CountdownConfig::default(), EntitlementTier::Standard)
    }

    #[test]
    fn test_new_is_idle_at_full_duration() {
        let countdown = standard();
        assert_eq!(countdown.state(), CountdownState::Idle);
        assert_eq!(countdown.remaining_seconds(), 900);
        assert_eq!(countdown.max_seconds(), 900);
        assert!(!countdown.is_active());
    }

    #[test]
    fn test_start_sets_duration_by_tier() {
        let mut countdown = standard();
        countdown.start(EntitlementTier::Extended, false);

        assert!(countdown.is_active());
        assert_eq!(countdown.max_seconds(), 1800);
        assert_eq!(countdown.remaining_seconds(), 1800);
        assert!(!countdown.mid_session_fired());
    }

    #[test]
    fn test_standard_session_scenario() {
        let mut countdown = standard();
        countdown.start(EntitlementTier::Standard, false);

        for tick in 1..=479 {
            let events = countdown.tick();
            assert!(events.is_empty(), "unexpected event at tick {tick}");
        }

        // Tick 480 lands on 420 remaining
        let events = countdown.tick();
        assert_eq!(countdown.remaining_seconds(), 420);
        assert_eq!(
            events,
            vec![CountdownEvent::MidSessionReached {
                remaining_seconds: 420
            }]
        );

        for _ in 481..=899 {
            assert!(countdown.tick().is_empty());
        }
        assert_eq!(countdown.remaining_seconds(), 1);

        let events = countdown.tick();
        assert_eq!(events, vec![CountdownEvent::Expired]);
        assert_eq!(countdown.remaining_seconds(), 0);
        assert!(!countdown.is_active());
        assert_eq!(countdown.state(), CountdownState::Expired);
    }

    #[test]
    fn test_extended_threshold_is_absolute() {
        let mut countdown = standard();
        countdown.start(EntitlementTier::Extended, false);

        let mut fired_at = None;
        for tick in 1..=1800u32 {
            let events = countdown.tick();
            if events.contains(&CountdownEvent::MidSessionReached {
                remaining_seconds: 420,
            }) {
                assert!(fired_at.is_none());
                fired_at = Some(tick);
            }
        }

        assert_eq!(fired_at, Some(1380));
    }

    #[test]
    fn test_exempt_never_fires_mid_session() {
        let mut countdown = standard();
        countdown.start(EntitlementTier::Standard, true);

        let mut all = Vec::new();
        for _ in 0..1000 {
            all.extend(countdown.tick());
        }

        assert_eq!(all, vec![CountdownEvent::Expired]);
        assert!(!countdown.mid_session_fired());
    }

    #[test]
    fn test_bounds_hold_after_every_tick() {
        let mut countdown = standard();
        countdown.start(EntitlementTier::Standard, false);

        for _ in 0..950 {
            countdown.tick();
            assert!(countdown.remaining_seconds() <= countdown.max_seconds());
        }
        assert_eq!(countdown.remaining_seconds(), 0);
    }

    #[test]
    fn test_expiry_fires_once() {
        let mut countdown = standard();
        countdown.start(EntitlementTier::Standard, true);

        let expired = (0..2000)
            .flat_map(|_| countdown.tick())
            .filter(|e| *e == CountdownEvent::Expired)
            .count();
        assert_eq!(expired, 1);
    }

    #[test]
    fn test_ticks_after_stop_are_ignored() {
        let mut countdown = standard();
        countdown.start(EntitlementTier::Standard, false);
        for _ in 0..100 {
            countdown.tick();
        }

        countdown.stop(EntitlementTier::Standard);
        assert_eq!(countdown.remaining_seconds(), 900);
        assert_eq!(countdown.state(), CountdownState::Idle);

        for _ in 0..1000 {
            assert!(countdown.tick().is_empty());
        }
        assert_eq!(countdown.remaining_seconds(), 900);
        assert!(!countdown.mid_session_fired());
    }

    #[test]
    fn test_stop_recomputes_from_current_tier() {
        let mut countdown = standard();
        countdown.start(EntitlementTier::Standard, false);
        countdown.stop(EntitlementTier::Extended);

        assert_eq!(countdown.max_seconds(), 1800);
        assert_eq!(countdown.remaining_seconds(), 1800);
    }

    #[test]
    fn test_restart_resets_mid_session_guard() {
        let mut countdown = standard();
        countdown.start(EntitlementTier::Standard, false);
        for _ in 0..480 {
            countdown.tick();
        }
        assert!(countdown.mid_session_fired());

        countdown.start(EntitlementTier::Standard, false);
        assert!(!countdown.mid_session_fired());
        assert_eq!(countdown.remaining_seconds(), 900);
    }

    #[test]
    fn test_threshold_disabled() {
        let config = CountdownConfig {
            mid_session_threshold: None,
            ..CountdownConfig::default()
        };
        let mut countdown = SessionCountdown::new(config, EntitlementTier::Standard);
        countdown.start(EntitlementTier::Standard, false);

        let events: Vec<_> = (0..900).flat_map(|_| countdown.tick()).collect();
        assert_eq!(events, vec![CountdownEvent::Expired]);
    }

    #[test]
    fn test_mid_session_precedes_expiry_on_same_tick() {
        let config = CountdownConfig {
            standard_seconds: 3,
            extended_seconds: 6,
            mid_session_threshold: Some(0),
        };
        let mut countdown = SessionCountdown::new(config, EntitlementTier::Standard);
        countdown.start(EntitlementTier::Standard, false);

        countdown.tick();
        countdown.tick();
        let events = countdown.tick();
        assert_eq!(
            events,
            vec![
                CountdownEvent::MidSessionReached {
                    remaining_seconds: 0
                },
                CountdownEvent::Expired
            ]
        );
    }

    #[test]
    fn test_tick_with_observer() {
        struct Recorder(Vec<&'static str>);

        impl CountdownObserver for Recorder {
            fn on_mid_session_reached(&mut self) {
                self.0.push("mid");
            }

            fn on_session_expired(&mut self) {
                self.0.push("expired");
            }
        }

        let mut countdown = standard();
        countdown.start(EntitlementTier::Standard, false);

        let mut recorder = Recorder(Vec::new());
        for _ in 0..900 {
            countdown.tick_with(&mut recorder);
        }

        assert_eq!(recorder.0, vec!["mid", "expired"]);
    }
}
