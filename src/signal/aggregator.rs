//! Per-cycle vote normalization
//!
//! Stateless by design: nothing survives past one decision cycle, so a bad
//! input can never poison a later cycle.

use super::Vote;
use crate::config::AggregatorConfig;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Reason a raw vote was discarded before consensus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DropReason {
    /// Vote older than the staleness window
    Stale { age_secs: i64 },
    /// Vote timestamped ahead of the cycle beyond the skew allowance
    FromFuture { skew_secs: i64 },
    /// Confidence outside [0, 1]
    ConfidenceOutOfRange(Decimal),
    /// Quality outside [0, 1]
    QualityOutOfRange(Decimal),
}

/// Normalizes one cycle's raw votes into a clean batch
pub struct SignalAggregator {
    staleness: Duration,
    future_skew: Duration,
}

impl SignalAggregator {
    /// Create an aggregator with explicit windows
    pub fn new(staleness: Duration, future_skew: Duration) -> Self {
        Self {
            staleness,
            future_skew,
        }
    }

    /// Create from configuration
    pub fn from_config(config: &AggregatorConfig) -> Self {
        Self::new(
            Duration::seconds(config.staleness_secs as i64),
            Duration::seconds(config.future_skew_secs as i64),
        )
    }

    /// Drop stale and malformed votes, logging each discard with its reason
    pub fn normalize(&self, raw: Vec<Vote>, cycle_ts: DateTime<Utc>) -> Vec<Vote> {
        let mut clean = Vec::with_capacity(raw.len());
        for vote in raw {
            match self.check(&vote, cycle_ts) {
                None => clean.push(vote),
                Some(reason) => {
                    tracing::warn!(
                        source = %vote.source_id,
                        reason = ?reason,
                        "Dropping vote"
                    );
                }
            }
        }
        clean
    }

    fn check(&self, vote: &Vote, cycle_ts: DateTime<Utc>) -> Option<DropReason> {
        let age = cycle_ts - vote.timestamp;
        if age > self.staleness {
            return Some(DropReason::Stale {
                age_secs: age.num_seconds(),
            });
        }
        if vote.timestamp - cycle_ts > self.future_skew {
            return Some(DropReason::FromFuture {
                skew_secs: (vote.timestamp - cycle_ts).num_seconds(),
            });
        }
        if vote.confidence < Decimal::ZERO || vote.confidence > Decimal::ONE {
            return Some(DropReason::ConfidenceOutOfRange(vote.confidence));
        }
        if vote.quality < Decimal::ZERO || vote.quality > Decimal::ONE {
            return Some(DropReason::QualityOutOfRange(vote.quality));
        }
        None
    }
}
