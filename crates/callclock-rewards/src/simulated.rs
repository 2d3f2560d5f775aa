//! Simulated ad network for local runs and testing

use async_trait::async_trait;
use callclock_config::{RewardsPolicy, SIMULATED_NETWORK};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

use crate::{AdNetwork, RewardError, RewardResult};

/// Network that waits a fixed latency, then grants a fixed reward
pub struct SimulatedNetwork {
    name: String,
    latency: Duration,
    reward: u32,
    shown: AtomicU64,

    /// Configure show to report no fill
    pub fail_show: AtomicBool,
}

impl SimulatedNetwork {
    pub fn new(name: impl Into<String>, latency: Duration, reward: u32) -> Self {
        Self {
            name: name.into(),
            latency,
            reward,
            shown: AtomicU64::new(0),
            fail_show: AtomicBool::new(false),
        }
    }

    /// Build the default simulated network from the rewards policy
    pub fn from_policy(policy: &RewardsPolicy) -> Self {
        Self::named(SIMULATED_NETWORK, policy)
    }

    /// Build a simulated network with a custom name and policy values
    pub fn named(name: impl Into<String>, policy: &RewardsPolicy) -> Self {
        Self::new(name, policy.simulated_latency, policy.reward_amount)
    }

    /// A network that never fills
    pub fn failing(name: impl Into<String>) -> Self {
        let network = Self::new(name, Duration::ZERO, 0);
        network.fail_show.store(true, Ordering::SeqCst);
        network
    }

    /// Number of completed ads
    pub fn shown_count(&self) -> u64 {
        self.shown.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AdNetwork for SimulatedNetwork {
    fn name(&self) -> &str {
        &self.name
    }

    async fn show_rewarded(&self) -> RewardResult<u32> {
        if self.fail_show.load(Ordering::SeqCst) {
            return Err(RewardError::NoFill {
                network: self.name.clone(),
            });
        }

        debug!(network = %self.name, latency_ms = self.latency.as_millis() as u64, "Showing simulated ad");
        tokio::time::sleep(self.latency).await;

        self.shown.fetch_add(1, Ordering::SeqCst);
        Ok(self.reward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn simulated_waits_then_rewards() {
        let network = SimulatedNetwork::from_policy(&RewardsPolicy::default());
        let started = Instant::now();

        let reward = network.show_rewarded().await.unwrap();

        assert_eq!(reward, 10);
        assert_eq!(started.elapsed(), Duration::from_secs(1));
        assert_eq!(network.shown_count(), 1);
        assert_eq!(network.name(), "simulated");
    }

    #[tokio::test]
    async fn failing_network_reports_no_fill() {
        let network = SimulatedNetwork::failing("flaky");

        let result = network.show_rewarded().await;

        assert!(matches!(result, Err(RewardError::NoFill { network }) if network == "flaky"));
        assert_eq!(network.shown_count(), 0);
    }
}
