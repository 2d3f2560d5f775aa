//! Mediation service: tries each network in order until one rewards

use callclock_config::RewardsPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, info, warn};

use crate::{AdNetwork, RewardError, RewardResult, SimulatedNetwork};

/// Network name reported when no ad was shown
pub const NO_NETWORK: &str = "none";

/// Result of a rewarded-ad request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardOutcome {
    pub success: bool,
    pub reward: u32,
    pub network: String,
}

impl RewardOutcome {
    fn rewarded(network: &str, reward: u32) -> Self {
        Self {
            success: true,
            reward,
            network: network.to_string(),
        }
    }

    fn failed() -> Self {
        Self {
            success: false,
            reward: 0,
            network: NO_NETWORK.to_string(),
        }
    }
}

/// Per-network counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkMetrics {
    pub requests: u64,
    pub impressions: u64,
    pub failures: u64,
    pub rewards: u64,
}

/// Snapshot of mediation counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediationMetrics {
    pub total_rewards: u64,
    pub networks: BTreeMap<String, NetworkMetrics>,
    /// Network with the most impressions, if any ad was shown
    pub best_network: Option<String>,
}

#[derive(Default)]
struct Counters {
    requests: AtomicU64,
    impressions: AtomicU64,
    failures: AtomicU64,
    rewards: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> NetworkMetrics {
        NetworkMetrics {
            requests: self.requests.load(Ordering::Relaxed),
            impressions: self.impressions.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            rewards: self.rewards.load(Ordering::Relaxed),
        }
    }
}

struct Slot {
    network: Arc<dyn AdNetwork>,
    counters: Counters,
}

/// Rewarded-ad mediation across a waterfall of networks.
///
/// The service must be initialised before it will show anything; requests
/// made before `initialize()` or after `shutdown()` report failure.
pub struct RewardService {
    enabled: bool,
    slots: Vec<Slot>,
    ready: AtomicBool,
}

impl RewardService {
    /// Create a service over `networks`, tried in the given order
    pub fn new(policy: &RewardsPolicy, networks: Vec<Arc<dyn AdNetwork>>) -> Self {
        let slots = networks
            .into_iter()
            .map(|network| Slot {
                network,
                counters: Counters::default(),
            })
            .collect();

        Self {
            enabled: policy.enabled,
            slots,
            ready: AtomicBool::new(false),
        }
    }

    /// Create a service with one simulated network per configured name
    pub fn from_policy(policy: &RewardsPolicy) -> Self {
        let networks = policy
            .networks
            .iter()
            .map(|name| Arc::new(SimulatedNetwork::named(name.as_str(), policy)) as Arc<dyn AdNetwork>)
            .collect();

        Self::new(policy, networks)
    }

    /// Make the service ready to show ads
    pub fn initialize(&self) -> RewardResult<()> {
        if !self.enabled {
            return Err(RewardError::Disabled);
        }
        if self.slots.is_empty() {
            return Err(RewardError::NoNetworks);
        }

        self.ready.store(true, Ordering::SeqCst);
        info!(networks = ?self.network_names(), "Reward service initialized");
        Ok(())
    }

    pub fn shutdown(&self) {
        if self.ready.swap(false, Ordering::SeqCst) {
            info!("Reward service shut down");
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn network_names(&self) -> Vec<&str> {
        self.slots.iter().map(|slot| slot.network.name()).collect()
    }

    /// Show a rewarded ad from the first network that completes one
    pub async fn show_rewarded(&self) -> RewardOutcome {
        if !self.is_ready() {
            debug!("Rewarded ad requested before initialization");
            return RewardOutcome::failed();
        }

        for slot in &self.slots {
            if !slot.network.is_available() {
                debug!(network = %slot.network.name(), "Skipping unavailable network");
                continue;
            }

            slot.counters.requests.fetch_add(1, Ordering::Relaxed);

            match slot.network.show_rewarded().await {
                Ok(reward) => {
                    slot.counters.impressions.fetch_add(1, Ordering::Relaxed);
                    slot.counters
                        .rewards
                        .fetch_add(u64::from(reward), Ordering::Relaxed);

                    info!(network = %slot.network.name(), reward, "Rewarded ad completed");
                    return RewardOutcome::rewarded(slot.network.name(), reward);
                }
                Err(e) => {
                    slot.counters.failures.fetch_add(1, Ordering::Relaxed);
                    warn!(network = %slot.network.name(), error = %e, "Rewarded ad failed, trying next network");
                }
            }
        }

        warn!("No network could show a rewarded ad");
        RewardOutcome::failed()
    }

    pub fn metrics(&self) -> MediationMetrics {
        let networks: BTreeMap<String, NetworkMetrics> = self
            .slots
            .iter()
            .map(|slot| (slot.network.name().to_string(), slot.counters.snapshot()))
            .collect();

        let total_rewards = networks.values().map(|m| m.rewards).sum();
        let best_network = networks
            .iter()
            .filter(|(_, m)| m.impressions > 0)
            .max_by_key(|(_, m)| m.impressions)
            .map(|(name, _)| name.clone());

        MediationMetrics {
            total_rewards,
            networks,
            best_network,
        }
    }
}
