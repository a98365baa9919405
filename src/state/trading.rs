//! Account and risk state bookkeeping
//!
//! `TradingState` is the single mutable entity of the process. The decision
//! loop is its only writer; every mutation is followed by an atomic save.

use crate::risk::RiskMode;
use crate::signal::Direction;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Most recent settled outcomes kept for win-rate windows
pub const ROLLING_OUTCOME_CAP: usize = 100;

/// Version tag on the persisted record
pub const SCHEMA_VERSION: u32 = 1;

/// Result of a settled trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeOutcome {
    Win,
    Loss,
}

/// Settlement status of a position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Loss,
    Pending,
}

impl From<TradeOutcome> for Outcome {
    fn from(outcome: TradeOutcome) -> Self {
        match outcome {
            TradeOutcome::Win => Outcome::Win,
            TradeOutcome::Loss => Outcome::Loss,
        }
    }
}

/// One open or settled bet on a single market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Market the bet is on; at most one open position per market
    pub market_id: String,
    pub direction: Direction,
    /// Share price paid, in (0, 1)
    pub entry_price: Decimal,
    /// Committed stake in currency units
    pub size: Decimal,
    pub opened_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    pub outcome: Outcome,
}

impl Position {
    /// Open a new pending position
    pub fn open(
        market_id: impl Into<String>,
        direction: Direction,
        entry_price: Decimal,
        size: Decimal,
        opened_at: DateTime<Utc>,
    ) -> Self {
        Self {
            market_id: market_id.into(),
            direction,
            entry_price,
            size,
            opened_at,
            resolved_at: None,
            outcome: Outcome::Pending,
        }
    }

    /// Realized cash delta if the position settles with the given outcome
    ///
    /// Binary contracts pay 1.0 per share: a win returns the stake divided
    /// by the entry price, a loss forfeits the stake.
    pub fn payout(&self, outcome: TradeOutcome) -> Decimal {
        match outcome {
            TradeOutcome::Win => self.size / self.entry_price - self.size,
            TradeOutcome::Loss => -self.size,
        }
    }
}

/// The account state threaded through every decision cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingState {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Realized cash, including funds committed to open positions
    pub cash_balance: Decimal,
    /// Highest realized cash ever observed; never includes open position value
    pub peak_cash_balance: Decimal,
    #[serde(default)]
    pub open_positions: Vec<Position>,
    #[serde(default)]
    pub mode: RiskMode,
    /// Reason for the current blocking mode, kept for external tooling
    #[serde(default)]
    pub halt_reason: Option<String>,
    #[serde(default)]
    pub consecutive_losses: u32,
    #[serde(default)]
    pub daily_pnl: Decimal,
    pub day_start_balance: Decimal,
    pub day_started_at: DateTime<Utc>,
    #[serde(default)]
    pub rolling_outcomes: VecDeque<TradeOutcome>,
    /// Sizing ratchet raised by scale-up events; never reverts on its own
    #[serde(default = "default_scale_multiplier")]
    pub scale_multiplier: Decimal,
    /// Consecutive cycles without a halt or pause
    #[serde(default)]
    pub clean_cycles: u32,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

fn default_scale_multiplier() -> Decimal {
    Decimal::ONE
}

impl TradingState {
    /// Fresh state seeded with an opening balance
    pub fn new(seed_balance: Decimal, now: DateTime<Utc>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            cash_balance: seed_balance,
            peak_cash_balance: seed_balance,
            open_positions: Vec::new(),
            mode: RiskMode::Normal,
            halt_reason: None,
            consecutive_losses: 0,
            daily_pnl: Decimal::ZERO,
            day_start_balance: seed_balance,
            day_started_at: now,
            rolling_outcomes: VecDeque::new(),
            scale_multiplier: Decimal::ONE,
            clean_cycles: 0,
        }
    }

    /// Funds committed to open positions
    pub fn committed(&self) -> Decimal {
        self.open_positions.iter().map(|p| p.size).sum()
    }

    /// Funds not committed to any open position
    pub fn available(&self) -> Decimal {
        self.cash_balance - self.committed()
    }

    /// Fractional loss from the realized-cash peak
    pub fn drawdown(&self) -> Decimal {
        if self.peak_cash_balance == Decimal::ZERO {
            return Decimal::ZERO;
        }
        (self.peak_cash_balance - self.cash_balance) / self.peak_cash_balance
    }

    /// Committed stake in one direction as a share of cash
    pub fn directional_exposure(&self, direction: Direction) -> Decimal {
        if self.cash_balance == Decimal::ZERO {
            return Decimal::ZERO;
        }
        let committed: Decimal = self
            .open_positions
            .iter()
            .filter(|p| p.direction == direction)
            .map(|p| p.size)
            .sum();
        committed / self.cash_balance
    }

    /// Win rate over the most recent `window` outcomes, `None` when empty
    pub fn win_rate(&self, window: usize) -> Option<Decimal> {
        if self.rolling_outcomes.is_empty() || window == 0 {
            return None;
        }
        let take = self.rolling_outcomes.len().min(window);
        let wins = self
            .rolling_outcomes
            .iter()
            .rev()
            .take(take)
            .filter(|o| matches!(o, TradeOutcome::Win))
            .count();
        Some(Decimal::from(wins as u64) / Decimal::from(take as u64))
    }

    /// True when the trailing `count` outcomes all settled as wins
    pub fn trailing_wins(&self, count: usize) -> bool {
        if count == 0 {
            return true;
        }
        if self.rolling_outcomes.len() < count {
            return false;
        }
        self.rolling_outcomes
            .iter()
            .rev()
            .take(count)
            .all(|o| matches!(o, TradeOutcome::Win))
    }

    /// Commit funds to a new position
    pub fn open_position(&mut self, position: Position) {
        tracing::info!(
            market = %position.market_id,
            direction = %position.direction,
            size = %position.size,
            entry_price = %position.entry_price,
            "Position opened"
        );
        self.open_positions.push(position);
    }

    /// Settle the open position on `market_id` against the winning side
    ///
    /// Returns the settled position and the realized cash delta, or `None`
    /// when no position is open on that market.
    pub fn settle_market(
        &mut self,
        market_id: &str,
        winning_direction: Direction,
        resolved_at: DateTime<Utc>,
    ) -> Option<(Position, Decimal)> {
        let index = self
            .open_positions
            .iter()
            .position(|p| p.market_id == market_id)?;
        let mut position = self.open_positions.remove(index);

        let outcome = if position.direction == winning_direction {
            TradeOutcome::Win
        } else {
            TradeOutcome::Loss
        };
        let delta = position.payout(outcome);
        position.outcome = outcome.into();
        position.resolved_at = Some(resolved_at);

        self.cash_balance += delta;
        self.daily_pnl += delta;
        if self.cash_balance > self.peak_cash_balance {
            self.peak_cash_balance = self.cash_balance;
        }
        match outcome {
            TradeOutcome::Win => self.consecutive_losses = 0,
            TradeOutcome::Loss => self.consecutive_losses += 1,
        }
        self.rolling_outcomes.push_back(outcome);
        while self.rolling_outcomes.len() > ROLLING_OUTCOME_CAP {
            self.rolling_outcomes.pop_front();
        }

        tracing::info!(
            market = %market_id,
            outcome = ?outcome,
            delta = %delta,
            cash = %self.cash_balance,
            "Position settled"
        );
        Some((position, delta))
    }

    /// Re-anchor the daily window when the UTC day changes
    pub fn roll_day_if_needed(&mut self, now: DateTime<Utc>) -> bool {
        if now.date_naive() <= self.day_started_at.date_naive() {
            return false;
        }
        self.day_start_balance = self.cash_balance;
        self.daily_pnl = Decimal::ZERO;
        self.day_started_at = now;
        tracing::info!(day_start = %self.day_start_balance, "Daily window rolled");
        true
    }

    /// Clear a halt by explicit external action
    ///
    /// The account re-enters trading in Recovery at a re-based peak; keeping
    /// the old peak or streak would re-trigger the same halt immediately.
    pub fn reset_halt(&mut self, now: DateTime<Utc>) {
        self.mode = RiskMode::Recovery;
        self.halt_reason = None;
        self.consecutive_losses = 0;
        self.peak_cash_balance = self.cash_balance;
        self.day_start_balance = self.cash_balance;
        self.daily_pnl = Decimal::ZERO;
        self.day_started_at = now;
        self.clean_cycles = 0;
        tracing::warn!(cash = %self.cash_balance, "Halt cleared, resuming in recovery");
    }

    /// First structural problem with this state, if any
    pub fn validation_error(&self) -> Option<String> {
        if self.cash_balance < Decimal::ZERO {
            return Some(format!("negative cash balance {}", self.cash_balance));
        }
        if self.peak_cash_balance < self.cash_balance {
            return Some(format!(
                "peak balance {} below cash balance {}",
                self.peak_cash_balance, self.cash_balance
            ));
        }
        if self.day_start_balance < Decimal::ZERO {
            return Some(format!(
                "negative day start balance {}",
                self.day_start_balance
            ));
        }
        if self.rolling_outcomes.len() > ROLLING_OUTCOME_CAP {
            return Some(format!(
                "rolling outcomes over cap: {}",
                self.rolling_outcomes.len()
            ));
        }
        if self.committed() > self.cash_balance {
            return Some(format!(
                "open positions commit {} against cash {}",
                self.committed(),
                self.cash_balance
            ));
        }
        for position in &self.open_positions {
            if position.size <= Decimal::ZERO {
                return Some(format!(
                    "position on {} has non-positive size {}",
                    position.market_id, position.size
                ));
            }
            if position.entry_price <= Decimal::ZERO || position.entry_price >= Decimal::ONE {
                return Some(format!(
                    "position on {} has entry price {} outside (0, 1)",
                    position.market_id, position.entry_price
                ));
            }
            if position.outcome != Outcome::Pending {
                return Some(format!(
                    "settled position on {} still listed as open",
                    position.market_id
                ));
            }
        }
        None
    }
}
