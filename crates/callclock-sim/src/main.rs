//! callclock-sim - run a call countdown from the command line
//!
//! Wires together:
//! - Configuration loading
//! - The call controller and its tick driver
//! - The rewarded-ad service (optional)

use anyhow::{Context, Result};
use clap::Parser;
use callclock_api::{CallCategory, Entitlements, Event, EventPayload, SessionEndReason};
use callclock_config::{TimerPolicy, load_config};
use callclock_core::CallSession;
use callclock_rewards::RewardService;
use callclock_runtime::CountdownDriver;
use callclock_util::{CallId, default_config_path, format_countdown};
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// callclock-sim - simulate a timed video call
#[derive(Parser, Debug)]
#[command(name = "callclock-sim")]
#[command(about = "Simulate a timed video call countdown", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/callclock/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// This user has premium
    #[arg(long)]
    premium: bool,

    /// The other participant has premium
    #[arg(long)]
    partner_premium: bool,

    /// Treat the call as a friend call (no decision point)
    #[arg(long)]
    friend: bool,

    /// Tick period override in milliseconds (or set CALLCLOCK_TICK_MILLIS)
    #[arg(long, env = "CALLCLOCK_TICK_MILLIS")]
    tick_millis: Option<u64>,

    /// Hang up after this many ticks
    #[arg(long)]
    disconnect_after: Option<u32>,

    /// Watch a rewarded ad when the decision point is reached
    #[arg(long)]
    watch_ad: bool,

    /// Print events as JSON lines
    #[arg(long)]
    json: bool,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Resolve the policy for this run
fn load_policy(args: &Args) -> Result<TimerPolicy> {
    let mut policy = if args.config.exists() {
        let policy = load_config(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;
        info!(config_path = %args.config.display(), "Configuration loaded");
        policy
    } else {
        info!(config_path = %args.config.display(), "No config file, using defaults");
        TimerPolicy::default()
    };

    if let Some(millis) = args.tick_millis {
        anyhow::ensure!(millis > 0, "--tick-millis must be greater than zero");
        policy.runtime.tick_interval = Duration::from_millis(millis);
    }

    Ok(policy)
}

/// Time until the simulated hang-up, if one was requested
fn hangup_delay(tick_interval: Duration, ticks: Option<u32>) -> Result<Option<Duration>> {
    ticks
        .map(|ticks| {
            tick_interval
                .checked_mul(ticks)
                .context("--disconnect-after is too large for the tick period")
        })
        .transpose()
}

struct Simulator {
    policy: TimerPolicy,
    driver: CountdownDriver,
    events: mpsc::UnboundedReceiver<Event>,
    rewards: Option<RewardService>,
    disconnect_after: Option<u32>,
    json: bool,
}

impl Simulator {
    fn new(args: &Args) -> Result<Self> {
        let policy = load_policy(args)?;

        let session = CallSession::new(&policy)
            .with_call_id(CallId::new("sim"))
            .with_entitlements(Entitlements::new(args.premium, args.partner_premium))
            .with_category(CallCategory::from_exempt(args.friend));

        let (driver, events) = CountdownDriver::from_policy(session, &policy);

        let rewards = if args.watch_ad {
            let service = RewardService::from_policy(&policy.rewards);
            match service.initialize() {
                Ok(()) => Some(service),
                Err(e) => {
                    warn!(error = %e, "Rewarded ads unavailable");
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            policy,
            driver,
            events,
            rewards,
            disconnect_after: args.disconnect_after,
            json: args.json,
        })
    }

    async fn run(mut self) -> Result<()> {
        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;

        let hangup = hangup_delay(self.policy.runtime.tick_interval, self.disconnect_after)?;
        let mut hangup_pending = hangup.is_some();
        let hangup_timer = tokio::time::sleep(hangup.unwrap_or(Duration::MAX));
        tokio::pin!(hangup_timer);

        self.driver.connect().await?;
        info!(tick_ms = self.policy.runtime.tick_interval.as_millis() as u64, "Call connected");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, hanging up");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, hanging up");
                    break;
                }

                _ = &mut hangup_timer, if hangup_pending => {
                    hangup_pending = false;
                    info!("Hang-up timer elapsed");
                    self.driver.disconnect().await?;
                }

                event = self.events.recv() => {
                    let Some(event) = event else {
                        warn!("Driver stopped unexpectedly");
                        break;
                    };

                    self.print(&event)?;

                    if self.handle_event(&event.payload).await? {
                        break;
                    }
                }
            }
        }

        self.finish().await
    }

    /// Returns true when the simulation is over
    async fn handle_event(&self, payload: &EventPayload) -> Result<bool> {
        match payload {
            EventPayload::MidSessionReached { .. } => {
                if let Some(rewards) = &self.rewards {
                    let outcome = rewards.show_rewarded().await;
                    if outcome.success {
                        println!("Ad watched on {}: +{} credits", outcome.network, outcome.reward);
                    } else {
                        println!("No ad available");
                    }
                }
                Ok(false)
            }
            EventPayload::SessionExpired { .. } => Ok(true),
            EventPayload::SessionEnded {
                reason: SessionEndReason::Disconnected,
                ..
            } => Ok(true),
            EventPayload::SessionStarted { .. }
            | EventPayload::SessionEnded { .. }
            | EventPayload::StateChanged(_)
            | EventPayload::Shutdown => Ok(false),
        }
    }

    fn print(&self, event: &Event) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(event)?);
            return Ok(());
        }

        let line = match &event.payload {
            EventPayload::SessionStarted {
                tier,
                category,
                max_seconds,
                ..
            } => format!(
                "Call started: {:?} tier, {:?} call, {} on the clock",
                tier,
                category,
                format_countdown(*max_seconds)
            ),
            EventPayload::MidSessionReached {
                remaining_seconds, ..
            } => format!(
                "Time to decide: {} left",
                format_countdown(*remaining_seconds)
            ),
            EventPayload::SessionExpired { .. } => "Time is up".to_string(),
            EventPayload::SessionEnded {
                reason,
                elapsed_seconds,
                ..
            } => format!(
                "Call ended ({:?}) after {}",
                reason,
                format_countdown(*elapsed_seconds)
            ),
            EventPayload::StateChanged(snapshot) => {
                format!("State: {:?}, {} left", snapshot.state, snapshot.remaining_text)
            }
            EventPayload::Shutdown => return Ok(()),
        };

        println!("[{}] {}", event.timestamp.format("%H:%M:%S"), line);
        Ok(())
    }

    async fn finish(self) -> Result<()> {
        let snapshot = self.driver.snapshot().await?;
        debug!(state = ?snapshot.state, remaining = snapshot.remaining_seconds, "Final state");

        self.driver.shutdown().await?;

        if let Some(rewards) = &self.rewards {
            let metrics = rewards.metrics();
            info!(
                total_rewards = metrics.total_rewards,
                best_network = ?metrics.best_network,
                "Reward metrics"
            );
            rewards.shutdown();
        }

        info!("Simulation complete");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "callclock-sim starting");

    let simulator = Simulator::new(&args)?;
    simulator.run().await
}
