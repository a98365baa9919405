//! Signal ingestion module
//!
//! Vote types, the source capability interface, and per-cycle normalization

mod aggregator;
mod types;

pub use aggregator::{DropReason, SignalAggregator};
pub use types::{Direction, MarketSnapshot, Vote};

use async_trait::async_trait;

/// Trait for external vote sources
///
/// Implementations are registered with the engine; how many and which kinds
/// exist is invisible to consensus.
#[async_trait]
pub trait SignalSource: Send + Sync {
    /// Stable identifier used for weighting and logging
    fn id(&self) -> &str;

    /// Produce at most one vote for the cycle; `Ok(None)` means no opinion
    /// and is not an error
    async fn vote(&self, snapshot: &MarketSnapshot) -> anyhow::Result<Option<Vote>>;
}
