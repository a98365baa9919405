//! Weighted-vote consensus
//!
//! `decide` is pure and deterministic: identical vote sets always produce
//! identical results, with no randomness and no state across calls.

use super::{AbstainReason, ConsensusResult, Verdict};
use crate::config::ConsensusConfig;
use crate::signal::{Direction, Vote};
use rust_decimal::Decimal;

/// Combines one cycle's votes into a single directional verdict
pub struct ConsensusEngine {
    config: ConsensusConfig,
}

impl ConsensusEngine {
    /// Create an engine with the given thresholds and base weights
    pub fn new(config: ConsensusConfig) -> Self {
        Self { config }
    }

    /// Base weight for a source, 1 unless configured otherwise
    fn base_weight(&self, source_id: &str) -> Decimal {
        self.config
            .base_weights
            .get(source_id)
            .copied()
            .unwrap_or(Decimal::ONE)
    }

    /// Combine votes into a verdict with aggregate confidence
    ///
    /// Effective weight per vote is `base_weight * confidence * quality`.
    /// The signed sum is normalized by total weight; an exact zero score
    /// abstains rather than defaulting to a direction.
    pub fn decide(&self, votes: &[Vote]) -> ConsensusResult {
        if votes.is_empty() {
            return ConsensusResult {
                verdict: Verdict::Abstain(AbstainReason::NoVotes),
                aggregate_confidence: Decimal::ZERO,
                participating_votes: 0,
                dissent_ratio: Decimal::ZERO,
            };
        }

        let mut total_weight = Decimal::ZERO;
        let mut up_weight = Decimal::ZERO;
        let mut down_weight = Decimal::ZERO;
        for vote in votes {
            let weight = self.base_weight(&vote.source_id) * vote.confidence * vote.quality;
            total_weight += weight;
            match vote.direction {
                Direction::Up => up_weight += weight,
                Direction::Down => down_weight += weight,
            }
        }

        if total_weight == Decimal::ZERO {
            return ConsensusResult {
                verdict: Verdict::Abstain(AbstainReason::NoWeight),
                aggregate_confidence: Decimal::ZERO,
                participating_votes: votes.len(),
                dissent_ratio: Decimal::ZERO,
            };
        }

        let aggregate_score = (up_weight - down_weight) / total_weight;
        let aggregate_confidence = aggregate_score.abs();
        let dissent_ratio = up_weight.min(down_weight) / total_weight;

        let direction = if aggregate_score > Decimal::ZERO {
            Direction::Up
        } else if aggregate_score < Decimal::ZERO {
            Direction::Down
        } else {
            return ConsensusResult {
                verdict: Verdict::Abstain(AbstainReason::TiedScore),
                aggregate_confidence,
                participating_votes: votes.len(),
                dissent_ratio,
            };
        };

        let verdict = if aggregate_confidence < self.config.consensus_threshold {
            Verdict::Abstain(AbstainReason::BelowThreshold(aggregate_confidence))
        } else if !votes
            .iter()
            .any(|v| v.confidence >= self.config.min_individual_confidence)
        {
            Verdict::Abstain(AbstainReason::NoConfidentSource)
        } else {
            Verdict::Trade(direction)
        };

        ConsensusResult {
            verdict,
            aggregate_confidence,
            participating_votes: votes.len(),
            dissent_ratio,
        }
    }
}
