//! Risk governor verdict types

use crate::signal::Direction;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operating mode of the account, persisted between runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskMode {
    #[default]
    Normal,
    /// Reduced sizing after early losses
    Conservative,
    /// Heavily reduced sizing near the halt line
    Defensive,
    /// Post-reset probation until a run of wins
    Recovery,
    /// No new positions until the trigger clears
    Paused,
    /// No new positions until an explicit reset
    Halted,
}

impl RiskMode {
    /// True when new positions may be opened in this mode
    pub fn allows_trading(&self) -> bool {
        !matches!(self, RiskMode::Paused | RiskMode::Halted)
    }
}

impl fmt::Display for RiskMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskMode::Normal => "NORMAL",
            RiskMode::Conservative => "CONSERVATIVE",
            RiskMode::Defensive => "DEFENSIVE",
            RiskMode::Recovery => "RECOVERY",
            RiskMode::Paused => "PAUSED",
            RiskMode::Halted => "HALTED",
        };
        write!(f, "{label}")
    }
}

fn pct(value: Decimal) -> Decimal {
    (value * dec!(100)).round_dp(2).normalize()
}

/// Condition that stops trading until an operator resets the account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HaltReason {
    /// Drawdown from the realized peak crossed the hard limit
    DrawdownExceeded { drawdown: Decimal, limit: Decimal },
    /// Too many consecutive losing settlements
    LossStreak { losses: u32, limit: u32 },
    /// Daily realized loss crossed the day's limit
    DailyLossExceeded { daily_pnl: Decimal, limit: Decimal },
    /// Cash fell under the smallest balance worth operating with
    BalanceBelowMinimum { balance: Decimal, minimum: Decimal },
    /// Collaborators failed too often inside the rolling window
    ErrorBurst { failures: u32, limit: u32 },
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HaltReason::DrawdownExceeded { drawdown, limit } => {
                write!(f, "drawdown {}% over {}% limit", pct(*drawdown), pct(*limit))
            }
            HaltReason::LossStreak { losses, limit } => {
                write!(f, "{losses} consecutive losses at limit {limit}")
            }
            HaltReason::DailyLossExceeded { daily_pnl, limit } => {
                write!(f, "daily pnl {daily_pnl} beyond loss limit {limit}")
            }
            HaltReason::BalanceBelowMinimum { balance, minimum } => {
                write!(f, "balance {balance} under operating minimum {minimum}")
            }
            HaltReason::ErrorBurst { failures, limit } => {
                write!(f, "{failures} collaborator failures at limit {limit}")
            }
        }
    }
}

/// Condition that suspends new positions until it clears on its own
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PauseReason {
    /// Recent win rate runs under the breakeven floor
    WinRateBelowBreakeven { win_rate: Decimal, threshold: Decimal },
    /// Market volatility ranks above the tolerated percentile
    ExtremeVolatility { percentile: Decimal, limit: Decimal },
    /// Concurrent position cap reached
    MaxPositionsOpen { open: usize, limit: usize },
    /// Too much stake committed to one side
    DirectionalExposure {
        direction: Direction,
        exposure: Decimal,
        limit: Decimal,
    },
}

impl fmt::Display for PauseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PauseReason::WinRateBelowBreakeven { win_rate, threshold } => {
                write!(f, "win rate {}% under {}% floor", pct(*win_rate), pct(*threshold))
            }
            PauseReason::ExtremeVolatility { percentile, limit } => {
                write!(
                    f,
                    "volatility percentile {}% over {}%",
                    pct(*percentile),
                    pct(*limit)
                )
            }
            PauseReason::MaxPositionsOpen { open, limit } => {
                write!(f, "{open} open positions at limit {limit}")
            }
            PauseReason::DirectionalExposure {
                direction,
                exposure,
                limit,
            } => {
                write!(
                    f,
                    "{direction} exposure {}% over {}% cap",
                    pct(*exposure),
                    pct(*limit)
                )
            }
        }
    }
}

/// Evidence that earned a sizing ratchet step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScaleUpReason {
    /// Sustained win rate with the balance at a milestone
    WinRateMilestone { win_rate: Decimal, balance: Decimal },
    /// Long run of cycles without a halt or pause
    CleanCycles { cycles: u32 },
}

impl fmt::Display for ScaleUpReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleUpReason::WinRateMilestone { win_rate, balance } => {
                write!(f, "win rate {}% at balance {balance}", pct(*win_rate))
            }
            ScaleUpReason::CleanCycles { cycles } => {
                write!(f, "{cycles} clean cycles")
            }
        }
    }
}

/// Per-cycle facts the governor needs beyond the account state
#[derive(Debug, Clone, Copy)]
pub struct CycleContext {
    pub now: DateTime<Utc>,
    /// Volatility rank in [0, 1] when the snapshot carries one
    pub volatility_percentile: Option<Decimal>,
    /// Collaborator failures recorded inside the burst window
    pub collaborator_failures: u32,
}

impl CycleContext {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            volatility_percentile: None,
            collaborator_failures: 0,
        }
    }

    pub fn with_volatility(mut self, percentile: Decimal) -> Self {
        self.volatility_percentile = Some(percentile);
        self
    }

    pub fn with_failures(mut self, failures: u32) -> Self {
        self.collaborator_failures = failures;
        self
    }
}

/// Outcome of one governor evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub mode: RiskMode,
    pub halt: Option<HaltReason>,
    pub pause: Option<PauseReason>,
    pub scale_up: Option<ScaleUpReason>,
}

impl Assessment {
    /// Human-readable trigger when the assessment blocks trading
    pub fn reason(&self) -> Option<String> {
        if let Some(halt) = &self.halt {
            return Some(halt.to_string());
        }
        self.pause.as_ref().map(|pause| pause.to_string())
    }
}
