//! Consensus module
//!
//! Deterministic weighted voting across signal sources

mod engine;
mod types;

pub use engine::ConsensusEngine;
pub use types::{AbstainReason, ConsensusResult, Verdict};
