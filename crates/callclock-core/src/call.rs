//! Call controller: maps signaling and entitlement inputs onto a countdown

use callclock_api::{
    CallCategory, CountdownState, EntitlementTier, Entitlements, SessionEndReason,
    SessionSnapshot,
};
use callclock_config::TimerPolicy;
use callclock_util::{CallId, SessionId};
use chrono::{DateTime, Local};
use tracing::{debug, info};

use crate::{
    CoreEvent, CountdownConfig, CountdownEvent, CountdownObserver, SessionCountdown,
    format_countdown, progress, severity_band,
};

/// Owns the countdown for one call view
#[derive(Debug)]
pub struct CallSession {
    call_id: Option<CallId>,
    countdown: SessionCountdown,
    upsell_threshold_seconds: u32,
    entitlements: Entitlements,
    category: CallCategory,
    connected: bool,
    session_id: Option<SessionId>,
    started_at: Option<DateTime<Local>>,
}

impl CallSession {
    /// Create an idle call controller
    pub fn new(policy: &TimerPolicy) -> Self {
        let entitlements = Entitlements::default();
        Self {
            call_id: None,
            countdown: SessionCountdown::new(CountdownConfig::from(policy), entitlements.tier()),
            upsell_threshold_seconds: policy.upsell.threshold_seconds,
            entitlements,
            category: CallCategory::default(),
            connected: false,
            session_id: None,
            started_at: None,
        }
    }

    pub fn with_call_id(mut self, call_id: CallId) -> Self {
        self.call_id = Some(call_id);
        self
    }

    pub fn with_entitlements(mut self, entitlements: Entitlements) -> Self {
        self.set_entitlements(entitlements);
        self
    }

    pub fn with_category(mut self, category: CallCategory) -> Self {
        self.category = category;
        self
    }

    /// Apply a connection-state change from the signaling layer.
    ///
    /// Repeating the current state is a no-op.
    pub fn set_connected(&mut self, connected: bool) -> Vec<CoreEvent> {
        if connected == self.connected {
            return Vec::new();
        }

        if connected {
            vec![self.start()]
        } else {
            self.end(SessionEndReason::Disconnected).into_iter().collect()
        }
    }

    pub fn connect(&mut self) -> Vec<CoreEvent> {
        self.set_connected(true)
    }

    pub fn disconnect(&mut self) -> Vec<CoreEvent> {
        self.set_connected(false)
    }

    /// Update premium flags.
    ///
    /// A running or expired session keeps the duration it started with; the
    /// new tier is picked up by the next connect.
    pub fn set_entitlements(&mut self, entitlements: Entitlements) {
        if entitlements == self.entitlements {
            return;
        }

        self.entitlements = entitlements;

        if self.connected {
            debug!(
                call_id = ?self.call_id,
                tier = ?entitlements.tier(),
                "Entitlements changed mid-session, applying on next connect"
            );
        } else {
            self.countdown.stop(entitlements.tier());
        }
    }

    /// Update the call category used by the next connect
    pub fn set_category(&mut self, category: CallCategory) {
        self.category = category;
    }

    /// Advance the countdown by one second
    pub fn tick(&mut self) -> Vec<CoreEvent> {
        let Some(session_id) = self.session_id.clone() else {
            return Vec::new();
        };

        self.countdown
            .tick()
            .into_iter()
            .map(|event| match event {
                CountdownEvent::MidSessionReached { remaining_seconds } => {
                    info!(
                        session_id = %session_id,
                        remaining_secs = remaining_seconds,
                        "Mid-session decision point reached"
                    );
                    CoreEvent::MidSessionReached {
                        session_id: session_id.clone(),
                        remaining_seconds,
                    }
                }
                CountdownEvent::Expired => {
                    info!(session_id = %session_id, "Session time is up");
                    CoreEvent::SessionExpired {
                        session_id: session_id.clone(),
                    }
                }
            })
            .collect()
    }

    /// Advance by one second and notify `observer` as each event fires
    pub fn tick_with(&mut self, observer: &mut impl CountdownObserver) -> Vec<CoreEvent> {
        let events = self.tick();
        for event in &events {
            event.dispatch(observer);
        }
        events
    }

    /// Stop any running session because the owner is going away
    pub fn shutdown(&mut self) -> Option<CoreEvent> {
        self.end(SessionEndReason::Shutdown)
    }

    fn start(&mut self) -> CoreEvent {
        let tier = self.entitlements.tier();
        let session_id = SessionId::new();

        self.countdown.start(tier, self.category.is_exempt());
        self.connected = true;
        self.session_id = Some(session_id.clone());
        self.started_at = Some(callclock_util::now());

        info!(
            session_id = %session_id,
            call_id = ?self.call_id,
            tier = ?tier,
            category = ?self.category,
            max_secs = self.countdown.max_seconds(),
            "Session started"
        );

        CoreEvent::SessionStarted {
            session_id,
            tier,
            category: self.category,
            max_seconds: self.countdown.max_seconds(),
        }
    }

    fn end(&mut self, reason: SessionEndReason) -> Option<CoreEvent> {
        self.connected = false;
        let session_id = self.session_id.take()?;
        let elapsed_seconds = self.countdown.elapsed_seconds();

        self.countdown.stop(self.entitlements.tier());
        self.started_at = None;

        info!(
            session_id = %session_id,
            reason = ?reason,
            elapsed_secs = elapsed_seconds,
            "Session ended"
        );

        Some(CoreEvent::SessionEnded {
            session_id,
            reason,
            elapsed_seconds,
        })
    }

    /// Category of the running session, or of the next one when idle
    fn effective_category(&self) -> CallCategory {
        if self.session_id.is_some() {
            CallCategory::from_exempt(self.countdown.is_exempt())
        } else {
            self.category
        }
    }

    /// Whether the upgrade prompt should be shown
    pub fn upsell_visible(&self) -> bool {
        !self.effective_category().is_exempt()
            && self.countdown.tier() == EntitlementTier::Standard
            && self.countdown.is_active()
            && self.countdown.remaining_seconds() < self.upsell_threshold_seconds
    }

    /// Whether the "time to decide" prompt should be shown
    pub fn decision_prompt_visible(&self) -> bool {
        !self.effective_category().is_exempt()
            && self.countdown.mid_session_fired()
            && self.countdown.remaining_seconds() > 0
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let remaining = self.countdown.remaining_seconds();
        let max = self.countdown.max_seconds();

        SessionSnapshot {
            session_id: self.session_id.clone(),
            state: self.countdown.state(),
            tier: self.countdown.tier(),
            entitlement_source: self.entitlements.source(),
            category: self.effective_category(),
            remaining_seconds: remaining,
            max_seconds: max,
            remaining_text: format_countdown(remaining),
            band: severity_band(remaining, max),
            progress: progress(remaining, max),
            mid_session_fired: self.countdown.mid_session_fired(),
            decision_prompt_visible: self.decision_prompt_visible(),
            upsell_visible: self.upsell_visible(),
            started_at: self.started_at,
        }
    }

    pub fn state(&self) -> CountdownState {
        self.countdown.state()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_counting(&self) -> bool {
        self.countdown.is_active()
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn entitlements(&self) -> Entitlements {
        self.entitlements
    }

    pub fn category(&self) -> CallCategory {
        self.category
    }

    pub fn countdown(&self) -> &SessionCountdown {
        &self.countdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callclock_api::{EntitlementSource, SeverityBand};

    fn make_session() -> CallSession {
        CallSession::new(&TimerPolicy::default()).with_call_id(CallId::new("call-1"))
    }

    fn tick_n(session: &mut CallSession, n: u32) -> Vec<CoreEvent> {
        (0..n).flat_map(|_| session.tick()).collect()
    }

    #[test]
    fn test_connect_starts_countdown() {
        let mut session = make_session();
        let events = session.connect();

        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            CoreEvent::SessionStarted {
                tier: EntitlementTier::Standard,
                max_seconds: 900,
                ..
            }
        ));
        assert!(session.is_counting());
        assert!(session.session_id().is_some());
    }

    #[test]
    fn test_repeated_connect_is_noop() {
        let mut session = make_session();
        session.connect();
        tick_n(&mut session, 10);

        assert!(session.connect().is_empty());
        assert_eq!(session.countdown().remaining_seconds(), 890);
    }

    #[test]
    fn test_disconnect_resets_and_reports_elapsed() {
        let mut session = make_session();
        session.connect();
        tick_n(&mut session, 42);

        let events = session.disconnect();
        assert!(matches!(
            events.as_slice(),
            [CoreEvent::SessionEnded {
                reason: SessionEndReason::Disconnected,
                elapsed_seconds: 42,
                ..
            }]
        ));
        assert_eq!(session.state(), CountdownState::Idle);
        assert_eq!(session.countdown().remaining_seconds(), 900);
        assert!(session.session_id().is_none());

        // Ticks after disconnect do nothing
        assert!(tick_n(&mut session, 1000).is_empty());
        assert_eq!(session.countdown().remaining_seconds(), 900);
    }

    #[test]
    fn test_disconnect_while_idle_is_noop() {
        let mut session = make_session();
        assert!(session.disconnect().is_empty());
        assert!(session.shutdown().is_none());
    }

    #[test]
    fn test_partner_premium_extends() {
        let mut session = make_session().with_entitlements(Entitlements::new(false, true));
        assert_eq!(session.countdown().max_seconds(), 1800);

        session.connect();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.tier, EntitlementTier::Extended);
        assert_eq!(snapshot.entitlement_source, EntitlementSource::Partner);
        assert_eq!(snapshot.remaining_text, "30:00");
    }

    #[test]
    fn test_entitlement_change_mid_session_waits_for_next_start() {
        let mut session = make_session();
        session.connect();
        tick_n(&mut session, 5);

        session.set_entitlements(Entitlements::new(true, false));
        assert_eq!(session.countdown().max_seconds(), 900);
        assert_eq!(session.countdown().remaining_seconds(), 895);

        session.disconnect();
        assert_eq!(session.countdown().max_seconds(), 1800);

        session.connect();
        assert_eq!(session.countdown().remaining_seconds(), 1800);
    }

    #[test]
    fn test_entitlement_change_while_idle_updates_display() {
        let mut session = make_session();
        session.set_entitlements(Entitlements::new(true, false));
        assert_eq!(session.snapshot().remaining_text, "30:00");
    }

    #[test]
    fn test_friend_call_is_exempt() {
        let mut session = make_session().with_category(CallCategory::Friend);
        session.connect();

        let events = tick_n(&mut session, 900);
        assert!(matches!(events.as_slice(), [CoreEvent::SessionExpired { .. }]));
        assert!(!session.decision_prompt_visible());
        assert_eq!(session.state(), CountdownState::Expired);
    }

    #[test]
    fn test_full_standard_call() {
        let mut session = make_session();
        session.connect();

        let events = tick_n(&mut session, 480);
        assert!(matches!(
            events.as_slice(),
            [CoreEvent::MidSessionReached {
                remaining_seconds: 420,
                ..
            }]
        ));
        assert!(session.decision_prompt_visible());

        let events = tick_n(&mut session, 420);
        assert!(matches!(events.as_slice(), [CoreEvent::SessionExpired { .. }]));
        assert!(!session.decision_prompt_visible());

        // Still connected until the signaling layer says otherwise
        assert!(session.is_connected());
        assert!(tick_n(&mut session, 10).is_empty());
    }

    #[test]
    fn test_upsell_visibility() {
        let mut session = make_session();
        session.connect();

        tick_n(&mut session, 600);
        assert!(!session.upsell_visible()); // exactly 300 left

        tick_n(&mut session, 1);
        assert!(session.upsell_visible());
        assert_eq!(session.snapshot().band, SeverityBand::Warning);

        let mut premium = make_session().with_entitlements(Entitlements::new(true, false));
        premium.connect();
        tick_n(&mut premium, 1700);
        assert!(!premium.upsell_visible());
    }

    #[test]
    fn test_tick_with_observer_counts() {
        let mut mid = 0;
        let mut expired = 0;
        let mut session = make_session();
        session.connect();

        {
            let mut callbacks = crate::CountdownCallbacks::new(|| mid += 1, || expired += 1);
            for _ in 0..2000 {
                session.tick_with(&mut callbacks);
            }
        }

        assert_eq!(mid, 1);
        assert_eq!(expired, 1);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut session = make_session();
        session.connect();
        let json = serde_json::to_string(&session.snapshot()).unwrap();
        assert!(json.contains("\"state\":\"running\""));
        assert!(json.contains("\"remaining_text\":\"15:00\""));
    }
}
