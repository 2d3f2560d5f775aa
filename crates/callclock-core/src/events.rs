//! Core events emitted by the countdown and the call controller

use callclock_api::{CallCategory, EntitlementTier, EventPayload, SessionEndReason};
use callclock_util::SessionId;

/// Events emitted by a single `tick()` of the countdown, in firing order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    /// Remaining time crossed the decision-point threshold
    MidSessionReached { remaining_seconds: u32 },

    /// Remaining time went from 1 to 0
    Expired,
}

/// Synchronous receiver of countdown notifications.
///
/// Methods are called from inside `tick()`, in the order the events fire.
pub trait CountdownObserver {
    fn on_mid_session_reached(&mut self) {}

    fn on_session_expired(&mut self) {}
}

impl CountdownObserver for () {}

impl<T: CountdownObserver + ?Sized> CountdownObserver for Box<T> {
    fn on_mid_session_reached(&mut self) {
        (**self).on_mid_session_reached()
    }

    fn on_session_expired(&mut self) {
        (**self).on_session_expired()
    }
}

/// Observer built from two closures
pub struct CountdownCallbacks<M, E>
where
    M: FnMut(),
    E: FnMut(),
{
    on_mid_session: M,
    on_expired: E,
}

impl<M, E> CountdownCallbacks<M, E>
where
    M: FnMut(),
    E: FnMut(),
{
    pub fn new(on_mid_session: M, on_expired: E) -> Self {
        Self {
            on_mid_session,
            on_expired,
        }
    }
}

impl<M, E> CountdownObserver for CountdownCallbacks<M, E>
where
    M: FnMut(),
    E: FnMut(),
{
    fn on_mid_session_reached(&mut self) {
        (self.on_mid_session)()
    }

    fn on_session_expired(&mut self) {
        (self.on_expired)()
    }
}

/// Events emitted by the call controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreEvent {
    /// Call connected, countdown running
    SessionStarted {
        session_id: SessionId,
        tier: EntitlementTier,
        category: CallCategory,
        max_seconds: u32,
    },

    /// Decision point reached
    MidSessionReached {
        session_id: SessionId,
        remaining_seconds: u32,
    },

    /// Countdown reached zero
    SessionExpired { session_id: SessionId },

    /// Session stopped
    SessionEnded {
        session_id: SessionId,
        reason: SessionEndReason,
        elapsed_seconds: u32,
    },
}

impl CoreEvent {
    /// Forward this event to an observer, if it maps to a callback
    pub fn dispatch(&self, observer: &mut impl CountdownObserver) {
        match self {
            CoreEvent::MidSessionReached { .. } => observer.on_mid_session_reached(),
            CoreEvent::SessionExpired { .. } => observer.on_session_expired(),
            CoreEvent::SessionStarted { .. } | CoreEvent::SessionEnded { .. } => {}
        }
    }
}

impl From<CoreEvent> for EventPayload {
    fn from(event: CoreEvent) -> Self {
        match event {
            CoreEvent::SessionStarted {
                session_id,
                tier,
                category,
                max_seconds,
            } => EventPayload::SessionStarted {
                session_id,
                tier,
                category,
                max_seconds,
            },
            CoreEvent::MidSessionReached {
                session_id,
                remaining_seconds,
            } => EventPayload::MidSessionReached {
                session_id,
                remaining_seconds,
            },
            CoreEvent::SessionExpired { session_id } => EventPayload::SessionExpired { session_id },
            CoreEvent::SessionEnded {
                session_id,
                reason,
                elapsed_seconds,
            } => EventPayload::SessionEnded {
                session_id,
                reason,
                elapsed_seconds,
            },
        }
    }
}
