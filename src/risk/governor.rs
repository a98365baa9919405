//! Hard gate between consensus and order placement
//!
//! The governor inspects the account state once per cycle and decides the
//! operating mode. `evaluate` is a pure read so the same state always yields
//! the same assessment; `apply` is the one place the verdict mutates state.
//!
//! Checks run in severity order. A halt outranks every pause, a pause
//! outranks the graded modes, and scale-up is only considered from Normal.

use crate::config::RiskConfig;
use crate::risk::types::{
    Assessment, CycleContext, HaltReason, PauseReason, RiskMode, ScaleUpReason,
};
use crate::signal::Direction;
use crate::state::TradingState;

/// Recent outcomes window for the pause-side win rate
const PAUSE_WIN_RATE_WINDOW: usize = 50;
/// Recent outcomes window for the scale-up win rate
const SCALE_UP_WIN_RATE_WINDOW: usize = 100;

pub struct RiskGovernor {
    config: RiskConfig,
}

impl RiskGovernor {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// Assess the account without mutating it
    ///
    /// A halted account stays halted regardless of how healthy the numbers
    /// look; only an explicit reset leaves that mode.
    pub fn evaluate(&self, state: &TradingState, ctx: &CycleContext) -> Assessment {
        if state.mode == RiskMode::Halted {
            return Assessment {
                mode: RiskMode::Halted,
                halt: None,
                pause: None,
                scale_up: None,
            };
        }

        if let Some(halt) = self.check_halt(state, ctx) {
            return Assessment {
                mode: RiskMode::Halted,
                halt: Some(halt),
                pause: None,
                scale_up: None,
            };
        }

        if let Some(pause) = self.check_pause(state, ctx) {
            return Assessment {
                mode: RiskMode::Paused,
                halt: None,
                pause: Some(pause),
                scale_up: None,
            };
        }

        let mode = self.graded_mode(state);
        let scale_up = if mode == RiskMode::Normal {
            self.check_scale_up(state)
        } else {
            None
        };
        Assessment {
            mode,
            halt: None,
            pause: None,
            scale_up,
        }
    }

    /// Write the assessment back into the state
    pub fn apply(&self, state: &mut TradingState, assessment: &Assessment) {
        if assessment.mode != state.mode {
            if assessment.mode == RiskMode::Halted {
                tracing::error!(
                    from = %state.mode,
                    reason = %assessment.reason().unwrap_or_default(),
                    "Trading halted"
                );
            } else {
                tracing::info!(from = %state.mode, to = %assessment.mode, "Risk mode changed");
            }
        }
        state.mode = assessment.mode;

        match assessment.mode {
            RiskMode::Halted | RiskMode::Paused => {
                if let Some(reason) = assessment.reason() {
                    state.halt_reason = Some(reason);
                }
                state.clean_cycles = 0;
            }
            _ => {
                state.halt_reason = None;
                state.clean_cycles = state.clean_cycles.saturating_add(1);
            }
        }

        if let Some(scale_up) = &assessment.scale_up {
            let next = (state.scale_multiplier * self.config.scale_up_step)
                .min(self.config.scale_multiplier_cap);
            tracing::info!(multiplier = %next, trigger = %scale_up, "Sizing ratchet raised");
            state.scale_multiplier = next;
            state.clean_cycles = 0;
        }
    }

    fn check_halt(&self, state: &TradingState, ctx: &CycleContext) -> Option<HaltReason> {
        let drawdown = state.drawdown();
        if drawdown > self.config.max_drawdown_pct {
            return Some(HaltReason::DrawdownExceeded {
                drawdown,
                limit: self.config.max_drawdown_pct,
            });
        }

        if state.consecutive_losses >= self.config.max_consecutive_losses {
            return Some(HaltReason::LossStreak {
                losses: state.consecutive_losses,
                limit: self.config.max_consecutive_losses,
            });
        }

        // The daily limit is whichever is looser, so small accounts get the
        // absolute floor and large accounts the percentage
        let daily_limit = self
            .config
            .daily_loss_limit_abs
            .max(self.config.daily_loss_limit_pct * state.day_start_balance);
        if state.daily_pnl < -daily_limit {
            return Some(HaltReason::DailyLossExceeded {
                daily_pnl: state.daily_pnl,
                limit: daily_limit,
            });
        }

        if state.cash_balance < self.config.min_operating_balance {
            return Some(HaltReason::BalanceBelowMinimum {
                balance: state.cash_balance,
                minimum: self.config.min_operating_balance,
            });
        }

        if ctx.collaborator_failures >= self.config.error_burst_halt_count {
            return Some(HaltReason::ErrorBurst {
                failures: ctx.collaborator_failures,
                limit: self.config.error_burst_halt_count,
            });
        }

        None
    }

    fn check_pause(&self, state: &TradingState, ctx: &CycleContext) -> Option<PauseReason> {
        // The win-rate check only arms once enough settlements accumulated
        if state.rolling_outcomes.len() >= self.config.win_rate_min_samples {
            if let Some(win_rate) = state.win_rate(PAUSE_WIN_RATE_WINDOW) {
                if win_rate < self.config.min_win_rate_50 {
                    return Some(PauseReason::WinRateBelowBreakeven {
                        win_rate,
                        threshold: self.config.min_win_rate_50,
                    });
                }
            }
        }

        if let Some(percentile) = ctx.volatility_percentile {
            if percentile > self.config.extreme_volatility_pct {
                return Some(PauseReason::ExtremeVolatility {
                    percentile,
                    limit: self.config.extreme_volatility_pct,
                });
            }
        }

        if state.open_positions.len() >= self.config.max_positions {
            return Some(PauseReason::MaxPositionsOpen {
                open: state.open_positions.len(),
                limit: self.config.max_positions,
            });
        }

        for direction in [Direction::Up, Direction::Down] {
            let exposure = state.directional_exposure(direction);
            if exposure > self.config.max_directional_exposure_pct {
                return Some(PauseReason::DirectionalExposure {
                    direction,
                    exposure,
                    limit: self.config.max_directional_exposure_pct,
                });
            }
        }

        None
    }

    fn graded_mode(&self, state: &TradingState) -> RiskMode {
        // Recovery is left through a run of wins, not through clean numbers
        if state.mode == RiskMode::Recovery && !state.trailing_wins(self.config.recovery_exit_wins)
        {
            return RiskMode::Recovery;
        }

        let drawdown = state.drawdown();
        if drawdown > self.config.defensive_drawdown_pct
            || state.consecutive_losses >= self.config.defensive_loss_streak
        {
            return RiskMode::Defensive;
        }
        if drawdown > self.config.conservative_drawdown_pct
            || state.consecutive_losses >= self.config.conservative_loss_streak
        {
            return RiskMode::Conservative;
        }
        RiskMode::Normal
    }

    fn check_scale_up(&self, state: &TradingState) -> Option<ScaleUpReason> {
        if state.scale_multiplier >= self.config.scale_multiplier_cap {
            return None;
        }

        if state.rolling_outcomes.len() >= self.config.scale_up_min_samples {
            if let Some(win_rate) = state.win_rate(SCALE_UP_WIN_RATE_WINDOW) {
                // Both balance marks must hold: the absolute milestone and
                // the day-start multiple
                let at_milestone = state.cash_balance >= self.config.scale_up_balance_milestone
                    && state.cash_balance
                        >= self.config.scale_up_day_multiple * state.day_start_balance;
                if win_rate > self.config.scale_up_win_rate_100 && at_milestone {
                    return Some(ScaleUpReason::WinRateMilestone {
                        win_rate,
                        balance: state.cash_balance,
                    });
                }
            }
        }

        if state.clean_cycles >= self.config.scale_up_clean_cycles {
            return Some(ScaleUpReason::CleanCycles {
                cycles: state.clean_cycles,
            });
        }

        None
    }
}
