//! Order placement and settlement boundary
//!
//! The venue adapters live behind these traits so the decision loop never
//! knows which exchange, simulator, or replay harness sits on the other side.

mod paper;
mod types;

pub use paper::PaperBroker;
pub use types::{OrderId, PlacedOrder, Settlement, TradeOrder};

use async_trait::async_trait;
use rust_decimal::Decimal;

/// Trait for venues that accept orders and report market resolutions
#[async_trait]
pub trait OrderPlacer: Send + Sync {
    /// Place an order
    async fn place(&self, order: TradeOrder) -> anyhow::Result<PlacedOrder>;
    /// Drain resolutions that finalized since the last poll
    async fn poll_settlements(&self) -> anyhow::Result<Vec<Settlement>>;
}

/// Trait for sources of the externally settled account balance
#[async_trait]
pub trait BalanceSource: Send + Sync {
    /// Cash the venue says the account holds after all settlements
    async fn settled_balance(&self) -> anyhow::Result<Decimal>;
}
