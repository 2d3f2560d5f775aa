//! Countdown driver task

use callclock_api::{CallCategory, Entitlements, Event, EventPayload, SessionSnapshot};
use callclock_config::TimerPolicy;
use callclock_core::{CallSession, CoreEvent, CountdownObserver};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{DriverError, DriverResult};

/// Observer invoked on the driver task
pub type BoxedObserver = Box<dyn CountdownObserver + Send>;

/// Requests from the handle to the driver task
enum DriverCommand {
    SetConnected {
        connected: bool,
        ack: oneshot::Sender<()>,
    },
    SetEntitlements {
        entitlements: Entitlements,
        ack: oneshot::Sender<()>,
    },
    SetCategory {
        category: CallCategory,
        ack: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Shutdown {
        ack: oneshot::Sender<()>,
    },
}

/// Handle to the task that ticks one call's countdown.
///
/// Every method waits until the task has applied the request, so after
/// `disconnect().await` returns the stopped session can no longer tick.
/// Use [`shutdown`] to tear down deterministically: it returns only after the
/// task has exited. Dropping the handle marks the driver cancelled, so no tick
/// that has not yet started will run, and then aborts the task.
///
/// [`shutdown`]: CountdownDriver::shutdown
pub struct CountdownDriver {
    command_tx: mpsc::UnboundedSender<DriverCommand>,
    cancelled: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl CountdownDriver {
    /// Spawn a driver for `session`, ticking every `tick_interval` while counting
    pub fn spawn(
        session: CallSession,
        tick_interval: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<Event>) {
        Self::spawn_with_observer(session, tick_interval, Box::new(()))
    }

    /// Spawn a driver using the policy's tick period
    pub fn from_policy(
        session: CallSession,
        policy: &TimerPolicy,
    ) -> (Self, mpsc::UnboundedReceiver<Event>) {
        Self::spawn(session, policy.runtime.tick_interval)
    }

    /// Spawn a driver that also calls `observer` synchronously from each tick
    pub fn spawn_with_observer(
        session: CallSession,
        tick_interval: Duration,
        observer: BoxedObserver,
    ) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let cancelled = Arc::new(AtomicBool::new(false));

        let worker = DriverTask {
            cancelled: cancelled.clone(),
            session,
            tick_interval,
            observer,
            events: event_tx,
            ticker: None,
        };

        let task = tokio::spawn(worker.run(command_rx));
        debug!(tick_ms = tick_interval.as_millis() as u64, "Countdown driver spawned");

        (
            Self {
                command_tx,
                cancelled,
                task: Some(task),
            },
            event_rx,
        )
    }

    /// Forward a connection-state change
    pub async fn set_connected(&self, connected: bool) -> DriverResult<()> {
        let (ack, done) = oneshot::channel();
        self.send(DriverCommand::SetConnected { connected, ack })?;
        done.await.map_err(|_| DriverError::Closed)
    }

    pub async fn connect(&self) -> DriverResult<()> {
        self.set_connected(true).await
    }

    /// Stop the running session; no tick fires for it once this returns
    pub async fn disconnect(&self) -> DriverResult<()> {
        self.set_connected(false).await
    }

    pub async fn set_entitlements(&self, entitlements: Entitlements) -> DriverResult<()> {
        let (ack, done) = oneshot::channel();
        self.send(DriverCommand::SetEntitlements { entitlements, ack })?;
        done.await.map_err(|_| DriverError::Closed)
    }

    pub async fn set_category(&self, category: CallCategory) -> DriverResult<()> {
        let (ack, done) = oneshot::channel();
        self.send(DriverCommand::SetCategory { category, ack })?;
        done.await.map_err(|_| DriverError::Closed)
    }

    pub async fn snapshot(&self) -> DriverResult<SessionSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(DriverCommand::Snapshot { reply })?;
        rx.await.map_err(|_| DriverError::Closed)
    }

    /// Stop any running session and wait for the task to exit
    pub async fn shutdown(mut self) -> DriverResult<()> {
        let (ack, done) = oneshot::channel();
        self.send(DriverCommand::Shutdown { ack })?;
        done.await.map_err(|_| DriverError::Closed)?;

        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!(error = %e, "Countdown driver task failed");
        }

        Ok(())
    }

    fn send(&self, command: DriverCommand) -> DriverResult<()> {
        self.command_tx.send(command).map_err(|_| DriverError::Closed)
    }
}

impl Drop for CountdownDriver {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct DriverTask {
    /// Set by the handle's `Drop`
    cancelled: Arc<AtomicBool>,
    session: CallSession,
    tick_interval: Duration,
    observer: BoxedObserver,
    events: mpsc::UnboundedSender<Event>,
    /// Present only while the countdown is running
    ticker: Option<Interval>,
}

impl DriverTask {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<DriverCommand>) {
        loop {
            tokio::select! {
                // Commands win over a tick that is ready at the same time
                biased;

                command = commands.recv() => {
                    let Some(command) = command else {
                        debug!("Driver handle dropped, stopping");
                        self.shutdown_session();
                        break;
                    };

                    if !self.handle_command(command) {
                        break;
                    }
                }

                _ = next_tick(&mut self.ticker), if self.ticker.is_some() => {
                    if self.cancelled.load(Ordering::SeqCst) {
                        debug!("Driver cancelled, dropping tick");
                        break;
                    }

                    let events = self.session.tick_with(&mut self.observer);
                    self.publish(events);

                    if !self.session.is_counting() {
                        self.ticker = None;
                    }
                }
            }
        }

        info!("Countdown driver stopped");
    }

    /// Returns false when the task should exit
    fn handle_command(&mut self, command: DriverCommand) -> bool {
        match command {
            DriverCommand::SetConnected { connected, ack } => {
                let was_counting = self.session.is_counting();
                let events = self.session.set_connected(connected);
                // A repeated connect must not restart the running interval
                if was_counting != self.session.is_counting() {
                    self.sync_ticker();
                }
                self.publish(events);
                let _ = ack.send(());
            }

            DriverCommand::SetEntitlements { entitlements, ack } => {
                self.session.set_entitlements(entitlements);
                self.publish_state();
                let _ = ack.send(());
            }

            DriverCommand::SetCategory { category, ack } => {
                self.session.set_category(category);
                self.publish_state();
                let _ = ack.send(());
            }

            DriverCommand::Snapshot { reply } => {
                let _ = reply.send(self.session.snapshot());
            }

            DriverCommand::Shutdown { ack } => {
                self.shutdown_session();
                let _ = ack.send(());
                return false;
            }
        }

        true
    }

    /// Create or drop the interval to match the countdown
    fn sync_ticker(&mut self) {
        if self.session.is_counting() {
            // The first tick lands one full period after the start
            let mut ticker = tokio::time::interval_at(
                Instant::now() + self.tick_interval,
                self.tick_interval,
            );
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            self.ticker = Some(ticker);
        } else {
            self.ticker = None;
        }
    }

    fn shutdown_session(&mut self) {
        self.ticker = None;
        if let Some(event) = self.session.shutdown() {
            self.publish(vec![event]);
        }
        let _ = self.events.send(Event::new(EventPayload::Shutdown));
    }

    fn publish(&self, events: Vec<CoreEvent>) {
        for event in events {
            // The owner may have stopped listening; the countdown keeps going
            let _ = self.events.send(Event::new(event.into()));
        }
    }

    fn publish_state(&self) {
        let _ = self
            .events
            .send(Event::new(EventPayload::StateChanged(self.session.snapshot())));
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
