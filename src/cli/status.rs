//! Status command implementation

use crate::config::Config;
use crate::state::StateStore;
use chrono::Utc;
use clap::Args;
use rust_decimal_macros::dec;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print the raw persisted state as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let store = StateStore::from_config(&config.state);
        let state = store.load(Utc::now());

        if self.json {
            println!("{}", serde_json::to_string_pretty(&state)?);
            return Ok(());
        }

        println!("mode:               {}", state.mode);
        if let Some(reason) = &state.halt_reason {
            println!("blocked by:         {reason}");
        }
        println!("cash balance:       {}", state.cash_balance);
        println!("peak balance:       {}", state.peak_cash_balance);
        println!(
            "drawdown:           {}%",
            (state.drawdown() * dec!(100)).round_dp(2)
        );
        println!("daily pnl:          {}", state.daily_pnl);
        println!("consecutive losses: {}", state.consecutive_losses);
        if let Some(win_rate) = state.win_rate(50) {
            println!(
                "win rate (last 50): {}%",
                (win_rate * dec!(100)).round_dp(1)
            );
        }
        println!("scale multiplier:   {}", state.scale_multiplier);
        println!("open positions:     {}", state.open_positions.len());
        for position in &state.open_positions {
            println!(
                "  {} {} {} @ {}",
                position.market_id, position.direction, position.size, position.entry_price
            );
        }
        Ok(())
    }
}
