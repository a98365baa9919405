//! Paper broker with scripted settlements

use super::{BalanceSource, OrderPlacer, PlacedOrder, Settlement, TradeOrder};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Paper broker that accepts every order and settles on request
///
/// Tests and dry runs script resolutions through `push_settlement`; each
/// poll drains whatever was queued.
pub struct PaperBroker {
    placed: Arc<RwLock<Vec<PlacedOrder>>>,
    pending_settlements: Arc<RwLock<VecDeque<Settlement>>>,
    balance: Arc<RwLock<Decimal>>,
}

impl PaperBroker {
    /// Create a paper broker reporting the given settled balance
    pub fn new(balance: Decimal) -> Self {
        Self {
            placed: Arc::new(RwLock::new(vec![])),
            pending_settlements: Arc::new(RwLock::new(VecDeque::new())),
            balance: Arc::new(RwLock::new(balance)),
        }
    }

    /// Queue a resolution for the next settlement poll
    pub async fn push_settlement(&self, settlement: Settlement) {
        let mut pending = self.pending_settlements.write().await;
        pending.push_back(settlement);
    }

    /// Orders accepted so far
    pub async fn placed_orders(&self) -> Vec<PlacedOrder> {
        let placed = self.placed.read().await;
        placed.clone()
    }

    /// Move the reported settled balance
    pub async fn set_balance(&self, balance: Decimal) {
        let mut current = self.balance.write().await;
        *current = balance;
    }
}

#[async_trait]
impl OrderPlacer for PaperBroker {
    async fn place(&self, order: TradeOrder) -> anyhow::Result<PlacedOrder> {
        let placed = PlacedOrder {
            order_id: Uuid::new_v4(),
            market_id: order.market_id,
            direction: order.direction,
            price: order.price,
            size: order.size,
            placed_at: Utc::now(),
        };

        let mut orders = self.placed.write().await;
        orders.push(placed.clone());

        tracing::info!(
            order_id = ?placed.order_id,
            market = %placed.market_id,
            direction = %placed.direction,
            size = %placed.size,
            "Paper order placed"
        );
        Ok(placed)
    }

    async fn poll_settlements(&self) -> anyhow::Result<Vec<Settlement>> {
        let mut pending = self.pending_settlements.write().await;
        Ok(pending.drain(..).collect())
    }
}

#[async_trait]
impl BalanceSource for PaperBroker {
    async fn settled_balance(&self) -> anyhow::Result<Decimal> {
        let balance = self.balance.read().await;
        Ok(*balance)
    }
}
