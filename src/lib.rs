//! quorum-trader: consensus-driven decision engine for short-horizon up/down markets
//!
//! This library provides the core components for:
//! - Normalizing directional votes from independent signal sources
//! - Deterministic weighted consensus with abstain-by-default thresholds
//! - A risk state machine (halt / pause / scale-up) evaluated every cycle
//! - Win-rate-aware tiered position sizing
//! - Crash-safe persistence and reconciliation of account state
//! - Paper order placement for tests and dry runs
//! - Structured logging and metrics

pub mod cli;
pub mod config;
pub mod consensus;
pub mod engine;
pub mod execution;
pub mod risk;
pub mod signal;
pub mod state;
pub mod telemetry;
