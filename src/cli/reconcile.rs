//! Reconcile command implementation

use crate::config::Config;
use crate::state::StateStore;
use chrono::Utc;
use clap::Args;
use rust_decimal::Decimal;

#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Settled balance reported by the venue
    pub balance: Decimal,
}

impl ReconcileArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let store = StateStore::from_config(&config.state);
        let mut state = store.load(Utc::now());

        match store.reconcile(&mut state, self.balance, Utc::now()) {
            Some(correction) => {
                store.save(&state)?;
                println!(
                    "Corrected {} -> {} ({} positions dropped)",
                    correction.previous_cash,
                    correction.corrected_cash,
                    correction.dropped_positions.len()
                );
            }
            None => {
                println!("Balance within tolerance, nothing to correct");
            }
        }
        Ok(())
    }
}
