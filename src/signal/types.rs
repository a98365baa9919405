//! Vote and market-context types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bet direction on an up/down market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Price resolves above the open
    Up,
    /// Price resolves at or below the open
    Down,
}

impl Direction {
    /// The losing side when this side wins
    pub fn opposite(&self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "Up"),
            Direction::Down => write!(f, "Down"),
        }
    }
}

/// One directional vote from an independent signal source
///
/// Votes live for a single decision cycle and are discarded after consensus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    /// Stable source identifier, used for base weighting
    pub source_id: String,
    /// Voted direction
    pub direction: Direction,
    /// Source conviction in [0, 1]
    pub confidence: Decimal,
    /// Source self-assessed input quality in [0, 1]
    pub quality: Decimal,
    /// When the source formed the vote
    pub timestamp: DateTime<Utc>,
}

impl Vote {
    /// Create a vote stamped with the current time
    pub fn new(
        source_id: impl Into<String>,
        direction: Direction,
        confidence: Decimal,
        quality: Decimal,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            direction,
            confidence,
            quality,
            timestamp: Utc::now(),
        }
    }
}

/// Market context handed to every signal source once per decision cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Market the cycle is deciding on
    pub market_id: String,
    /// Quoted price of the Up side, in (0, 1)
    pub up_price: Decimal,
    /// Cycle timestamp; vote staleness is judged against this
    pub cycle_ts: DateTime<Utc>,
    /// Externally reported volatility regime percentile, when available
    pub volatility_percentile: Option<Decimal>,
}

impl MarketSnapshot {
    /// Entry price for a side; the Down side is the binary complement
    pub fn price_for(&self, direction: Direction) -> Decimal {
        match direction {
            Direction::Up => self.up_price,
            Direction::Down => Decimal::ONE - self.up_price,
        }
    }
}
