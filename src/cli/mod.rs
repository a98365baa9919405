//! CLI interface for quorum-trader
//!
//! Provides subcommands for:
//! - `status`: Show the persisted account state
//! - `reset`: Clear a halt and resume in recovery
//! - `reconcile`: Force the state onto a venue-reported balance
//! - `config`: Show the effective configuration

mod reconcile;
mod reset;
mod status;

pub use reconcile::ReconcileArgs;
pub use reset::ResetArgs;
pub use status::StatusArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "quorum-trader")]
#[command(about = "Consensus-driven decision engine for short-horizon up/down markets")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the persisted account state
    Status(StatusArgs),
    /// Clear a halt and resume in recovery
    Reset(ResetArgs),
    /// Force the state onto a venue-reported balance
    Reconcile(ReconcileArgs),
    /// Show the effective configuration
    Config,
}
