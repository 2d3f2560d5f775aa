//! Ad network trait

use async_trait::async_trait;
use thiserror::Error;

/// Errors from showing a rewarded ad
#[derive(Debug, Error)]
pub enum RewardError {
    #[error("No fill from {network}")]
    NoFill { network: String },

    #[error("Rewarded ads are disabled")]
    Disabled,

    #[error("No ad networks configured")]
    NoNetworks,
}

pub type RewardResult<T> = Result<T, RewardError>;

/// One ad network in the mediation waterfall
#[async_trait]
pub trait AdNetwork: Send + Sync {
    /// Name used in outcomes and metrics
    fn name(&self) -> &str;

    /// Show a rewarded ad to completion and return the reward granted
    async fn show_rewarded(&self) -> RewardResult<u32>;

    /// Optional: whether the network can currently serve ads
    fn is_available(&self) -> bool {
        true
    }
}
