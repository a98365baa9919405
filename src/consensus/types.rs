//! Consensus outcome types

use crate::signal::Direction;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Why consensus stood aside instead of trading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AbstainReason {
    /// No votes survived normalization
    NoVotes,
    /// Every vote carried zero effective weight
    NoWeight,
    /// Weighted scores cancelled exactly
    TiedScore,
    /// Aggregate confidence under the consensus threshold
    BelowThreshold(Decimal),
    /// No single source met the individual confidence floor
    NoConfidentSource,
}

/// Directional verdict for one decision cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Verdict {
    /// Trade in the given direction
    Trade(Direction),
    /// Stand aside this cycle
    Abstain(AbstainReason),
}

impl Verdict {
    /// Direction to trade, if any
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Verdict::Trade(direction) => Some(*direction),
            Verdict::Abstain(_) => None,
        }
    }

    /// True when the verdict commits to a trade
    pub fn is_trade(&self) -> bool {
        matches!(self, Verdict::Trade(_))
    }
}

/// Result of combining one cycle's votes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    /// Trade or abstain
    pub verdict: Verdict,
    /// Absolute normalized score in [0, 1]
    pub aggregate_confidence: Decimal,
    /// Votes that entered the weighting
    pub participating_votes: usize,
    /// Share of effective weight on the losing side
    pub dissent_ratio: Decimal,
}
