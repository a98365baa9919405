//! Position sizing
//!
//! Bet size is `balance * tier_pct * kelly_factor * mode_multiplier`:
//! a balance-bracket base percentage, scaled by fractional Kelly on the
//! recent win rate, scaled again by the risk mode. The result is clipped
//! to the configured bet range and refused outright when it would commit
//! more than the uncommitted balance.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::config::SizingConfig;
use crate::risk::RiskMode;
use crate::state::TradingState;

/// Recent outcomes window for the Kelly win-rate estimate
const KELLY_WIN_RATE_WINDOW: usize = 50;

pub struct PositionSizer {
    config: SizingConfig,
}

impl PositionSizer {
    /// Create a sizer; tiers are kept sorted by descending bracket floor
    pub fn new(mut config: SizingConfig) -> Self {
        config
            .tiers
            .sort_by(|a, b| b.min_balance.cmp(&a.min_balance));
        Self { config }
    }

    /// Bet size for the current account state, zero when no trade should go out
    pub fn size(&self, state: &TradingState) -> Decimal {
        let multiplier = self.mode_multiplier(state);
        let raw = state.cash_balance * self.tier_pct(state.cash_balance) * self.kelly_factor(state)
            * multiplier;
        if raw <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let clipped = raw.min(self.config.max_bet_cap).max(self.config.min_bet);
        if clipped > state.available() {
            tracing::debug!(
                size = %clipped,
                available = %state.available(),
                "Sized bet exceeds uncommitted balance, skipping"
            );
            return Decimal::ZERO;
        }
        clipped
    }

    /// Base percentage for the balance bracket
    ///
    /// Brackets thin out as capital grows, so a small account risks a larger
    /// share per bet and a grown account a smaller one.
    fn tier_pct(&self, balance: Decimal) -> Decimal {
        self.config
            .tiers
            .iter()
            .find(|tier| balance >= tier.min_balance)
            .map(|tier| tier.pct)
            .unwrap_or(Decimal::ZERO)
    }

    /// Fractional Kelly on the recent win rate
    ///
    /// Until enough settlements exist the configured assumed rate stands in,
    /// otherwise a fresh account could never place its first bet.
    fn kelly_factor(&self, state: &TradingState) -> Decimal {
        let win_rate = if state.rolling_outcomes.len() < self.config.kelly_min_samples {
            self.config.assumed_win_rate
        } else {
            state
                .win_rate(KELLY_WIN_RATE_WINDOW)
                .unwrap_or(self.config.assumed_win_rate)
        };

        let edge = (dec!(2) * win_rate - Decimal::ONE)
            .min(Decimal::ONE)
            .max(Decimal::ZERO);
        edge * self.config.kelly_fraction
    }

    fn mode_multiplier(&self, state: &TradingState) -> Decimal {
        match state.mode {
            RiskMode::Normal => state.scale_multiplier,
            RiskMode::Conservative => self.config.conservative_multiplier,
            RiskMode::Defensive => self.config.defensive_multiplier,
            RiskMode::Recovery => self.config.recovery_multiplier,
            RiskMode::Paused | RiskMode::Halted => Decimal::ZERO,
        }
    }
}
