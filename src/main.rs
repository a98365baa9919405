use clap::Parser;
use quorum_trader::cli::{Cli, Commands};
use quorum_trader::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        toml::from_str(include_str!("../config.toml.example")).expect("Invalid default config")
    });

    // Initialize telemetry
    quorum_trader::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Status(args) => {
            args.execute(&config).await?;
        }
        Commands::Reset(args) => {
            args.execute(&config).await?;
        }
        Commands::Reconcile(args) => {
            args.execute(&config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!(
                "  Consensus: threshold={}, min individual={}",
                config.consensus.consensus_threshold, config.consensus.min_individual_confidence
            );
            println!(
                "  Risk: max drawdown={}%, loss streak={}, max positions={}",
                config.risk.max_drawdown_pct * rust_decimal_macros::dec!(100),
                config.risk.max_consecutive_losses,
                config.risk.max_positions
            );
            println!(
                "  Sizing: {} tiers, Kelly fraction={}, bet range=[{}, {}]",
                config.sizing.tiers.len(),
                config.sizing.kelly_fraction,
                config.sizing.min_bet,
                config.sizing.max_bet_cap
            );
            println!("  State: {}", config.state.path.display());
        }
    }

    Ok(())
}
