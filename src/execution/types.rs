//! Order and settlement types

use crate::signal::Direction;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order identifier
pub type OrderId = Uuid;

/// A bet to be placed on one market
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeOrder {
    /// Market identifier
    pub market_id: String,
    /// Side being bought
    pub direction: Direction,
    /// Share price for that side, in (0, 1)
    pub price: Decimal,
    /// Stake in currency units
    pub size: Decimal,
}

/// Acknowledgement of a placed order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub market_id: String,
    pub direction: Direction,
    pub price: Decimal,
    pub size: Decimal,
    pub placed_at: DateTime<Utc>,
}

/// Final resolution of one market
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settlement {
    pub market_id: String,
    /// Side that resolved to 1.0
    pub winning_direction: Direction,
    pub resolved_at: DateTime<Utc>,
}
