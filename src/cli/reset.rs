//! Reset command implementation

use crate::config::Config;
use crate::risk::RiskMode;
use crate::state::StateStore;
use chrono::Utc;
use clap::Args;

#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Operator note recorded in the log
    #[arg(long)]
    pub note: Option<String>,
}

impl ResetArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let store = StateStore::from_config(&config.state);
        let mut state = store.load(Utc::now());

        if state.mode != RiskMode::Halted {
            println!("Account is {}, only a halted account can be reset", state.mode);
            return Ok(());
        }

        let reason = state
            .halt_reason
            .clone()
            .unwrap_or_else(|| "unrecorded".to_string());
        state.reset_halt(Utc::now());
        store.save(&state)?;

        tracing::info!(%reason, note = ?self.note, "Halt reset by operator");
        println!("Halt cleared ({reason}), resuming in RECOVERY");
        Ok(())
    }
}
