//! Crash-safe persistence for `TradingState`
//!
//! Saves write the full JSON document to a sibling temp file, fsync it, and
//! rename over the live path so a crash leaves either the old record or the
//! new one. Loads that hit missing, unreadable, or structurally invalid
//! records fall back to a fresh seeded state rather than refusing to start.

use crate::config::StateConfig;
use crate::state::{Position, TradingState};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("state encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Record of a reconcile that moved the account to an external balance
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    pub previous_cash: Decimal,
    pub corrected_cash: Decimal,
    pub previous_peak: Decimal,
    /// Positions dropped because the corrected cash no longer covers them
    pub dropped_positions: Vec<Position>,
}

/// Durable home of the trading state
pub struct StateStore {
    path: PathBuf,
    seed_balance: Decimal,
    tolerance: Decimal,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>, seed_balance: Decimal, tolerance: Decimal) -> Self {
        Self {
            path: path.into(),
            seed_balance,
            tolerance,
        }
    }

    pub fn from_config(config: &StateConfig) -> Self {
        Self::new(
            config.path.clone(),
            config.seed_balance,
            config.reconcile_tolerance,
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted state, falling back to a fresh seed on any defect
    pub fn load(&self, now: DateTime<Utc>) -> TradingState {
        match self.try_load() {
            Ok(Some(state)) => {
                if let Some(problem) = state.validation_error() {
                    tracing::warn!(
                        path = %self.path.display(),
                        %problem,
                        "Persisted state failed validation, starting fresh"
                    );
                    TradingState::new(self.seed_balance, now)
                } else {
                    tracing::info!(
                        path = %self.path.display(),
                        cash = %state.cash_balance,
                        open_positions = state.open_positions.len(),
                        mode = %state.mode,
                        "Loaded persisted state"
                    );
                    state
                }
            }
            Ok(None) => {
                tracing::info!(
                    path = %self.path.display(),
                    seed = %self.seed_balance,
                    "No persisted state, seeding new account"
                );
                TradingState::new(self.seed_balance, now)
            }
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "Persisted state unreadable, starting fresh"
                );
                TradingState::new(self.seed_balance, now)
            }
        }
    }

    fn try_load(&self) -> Result<Option<TradingState>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        let state = serde_json::from_str(&raw)?;
        Ok(Some(state))
    }

    /// Persist the state atomically
    pub fn save(&self, state: &TradingState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let encoded = serde_json::to_string_pretty(state)?;
        let tmp_path = self.path.with_extension("json.tmp");

        let mut file = File::create(&tmp_path)?;
        file.write_all(encoded.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, &self.path)?;

        tracing::debug!(path = %self.path.display(), bytes = encoded.len(), "State saved");
        Ok(())
    }

    /// Force the account onto an externally observed settled balance
    ///
    /// A correction within tolerance is ignored. Otherwise the external
    /// figure wins: cash, peak, and the daily window all re-anchor to it,
    /// and open positions the corrected cash can no longer cover are
    /// dropped oldest-first as already settled elsewhere.
    pub fn reconcile(
        &self,
        state: &mut TradingState,
        external_balance: Decimal,
        now: DateTime<Utc>,
    ) -> Option<Correction> {
        let diff = (external_balance - state.cash_balance).abs();
        if diff <= self.tolerance {
            tracing::debug!(
                internal = %state.cash_balance,
                external = %external_balance,
                "Reconcile within tolerance"
            );
            return None;
        }

        let previous_cash = state.cash_balance;
        let previous_peak = state.peak_cash_balance;

        state.cash_balance = external_balance;
        state.peak_cash_balance = external_balance;
        state.day_start_balance = external_balance;
        state.daily_pnl = Decimal::ZERO;
        state.day_started_at = now;

        let mut dropped_positions = Vec::new();
        while state.committed() > state.cash_balance && !state.open_positions.is_empty() {
            let position = state.open_positions.remove(0);
            tracing::warn!(
                market = %position.market_id,
                size = %position.size,
                "Dropping position no longer covered after reconcile"
            );
            dropped_positions.push(position);
        }

        tracing::warn!(
            previous = %previous_cash,
            corrected = %external_balance,
            dropped = dropped_positions.len(),
            "Reconciled to external balance"
        );
        Some(Correction {
            previous_cash,
            corrected_cash: external_balance,
            previous_peak,
            dropped_positions,
        })
    }
}
