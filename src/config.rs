//! Configuration types for quorum-trader
//!
//! Every option has a working default, so an empty file boots a paper-sized
//! account with the standard limits. Each field's effect lives with the code
//! that reads it.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub consensus: ConsensusConfig,
    #[serde(default)]
    pub aggregator: AggregatorConfig,
    #[serde(default)]
    pub sizing: SizingConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Consensus engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ConsensusConfig {
    /// Minimum aggregate confidence before a trade is eligible
    #[serde(default = "default_consensus_threshold")]
    pub consensus_threshold: Decimal,

    /// At least one vote must carry this much confidence on its own
    #[serde(default = "default_min_individual_confidence")]
    pub min_individual_confidence: Decimal,

    /// Per-source weight overrides; unlisted sources weigh 1.0
    #[serde(default)]
    pub base_weights: HashMap<String, Decimal>,
}

fn default_consensus_threshold() -> Decimal {
    Decimal::new(70, 2) // 0.70
}
fn default_min_individual_confidence() -> Decimal {
    Decimal::new(60, 2) // 0.60
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            consensus_threshold: default_consensus_threshold(),
            min_individual_confidence: default_min_individual_confidence(),
            base_weights: HashMap::new(),
        }
    }
}

/// Vote normalization configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AggregatorConfig {
    /// Votes older than this many seconds are dropped
    #[serde(default = "default_staleness_secs")]
    pub staleness_secs: u64,

    /// Tolerated clock skew for votes stamped ahead of the cycle
    #[serde(default = "default_future_skew_secs")]
    pub future_skew_secs: u64,
}

fn default_staleness_secs() -> u64 {
    5
}
fn default_future_skew_secs() -> u64 {
    2
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            staleness_secs: default_staleness_secs(),
            future_skew_secs: default_future_skew_secs(),
        }
    }
}

/// One balance bracket of the sizing tier table
#[derive(Debug, Clone, Deserialize)]
pub struct SizeTier {
    /// Bracket applies from this balance upward
    pub min_balance: Decimal,
    /// Base percentage of balance per bet
    pub pct: Decimal,
}

/// Position sizing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SizingConfig {
    /// Balance brackets; the highest matching bracket wins
    #[serde(default = "default_tiers")]
    pub tiers: Vec<SizeTier>,

    /// Fraction of full Kelly to actually bet
    #[serde(default = "default_kelly_fraction")]
    pub kelly_fraction: Decimal,

    /// Settled outcomes required before the live win rate is trusted
    #[serde(default = "default_kelly_min_samples")]
    pub kelly_min_samples: usize,

    /// Win rate assumed while history is shorter than the minimum
    #[serde(default = "default_assumed_win_rate")]
    pub assumed_win_rate: Decimal,

    /// Smallest bet worth placing
    #[serde(default = "default_min_bet")]
    pub min_bet: Decimal,

    /// Largest bet regardless of balance
    #[serde(default = "default_max_bet_cap")]
    pub max_bet_cap: Decimal,

    /// Size multiplier in CONSERVATIVE
    #[serde(default = "default_conservative_multiplier")]
    pub conservative_multiplier: Decimal,

    /// Size multiplier in DEFENSIVE
    #[serde(default = "default_defensive_multiplier")]
    pub defensive_multiplier: Decimal,

    /// Size multiplier in RECOVERY
    #[serde(default = "default_recovery_multiplier")]
    pub recovery_multiplier: Decimal,
}

fn default_tiers() -> Vec<SizeTier> {
    vec![
        SizeTier {
            min_balance: Decimal::new(10000, 0),
            pct: Decimal::new(4, 2), // 0.04
        },
        SizeTier {
            min_balance: Decimal::new(2000, 0),
            pct: Decimal::new(6, 2), // 0.06
        },
        SizeTier {
            min_balance: Decimal::new(500, 0),
            pct: Decimal::new(8, 2), // 0.08
        },
        SizeTier {
            min_balance: Decimal::ZERO,
            pct: Decimal::new(10, 2), // 0.10
        },
    ]
}
fn default_kelly_fraction() -> Decimal {
    Decimal::new(5, 1) // 0.5 = half-Kelly
}
fn default_kelly_min_samples() -> usize {
    10
}
fn default_assumed_win_rate() -> Decimal {
    Decimal::new(55, 2) // 0.55
}
fn default_min_bet() -> Decimal {
    Decimal::ONE
}
fn default_max_bet_cap() -> Decimal {
    Decimal::new(250, 0)
}
fn default_conservative_multiplier() -> Decimal {
    Decimal::new(75, 2) // 0.75
}
fn default_defensive_multiplier() -> Decimal {
    Decimal::new(50, 2) // 0.50
}
fn default_recovery_multiplier() -> Decimal {
    Decimal::new(50, 2) // 0.50
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            tiers: default_tiers(),
            kelly_fraction: default_kelly_fraction(),
            kelly_min_samples: default_kelly_min_samples(),
            assumed_win_rate: default_assumed_win_rate(),
            min_bet: default_min_bet(),
            max_bet_cap: default_max_bet_cap(),
            conservative_multiplier: default_conservative_multiplier(),
            defensive_multiplier: default_defensive_multiplier(),
            recovery_multiplier: default_recovery_multiplier(),
        }
    }
}

/// Risk governor configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    /// Drawdown from the realized peak that halts trading
    #[serde(default = "default_max_drawdown_pct")]
    pub max_drawdown_pct: Decimal,

    /// Consecutive losses that halt trading
    #[serde(default = "default_max_consecutive_losses")]
    pub max_consecutive_losses: u32,

    /// Absolute daily loss floor
    #[serde(default = "default_daily_loss_limit_abs")]
    pub daily_loss_limit_abs: Decimal,

    /// Daily loss as a share of the day-start balance
    #[serde(default = "default_daily_loss_limit_pct")]
    pub daily_loss_limit_pct: Decimal,

    /// Smallest cash balance the strategy may keep operating with
    #[serde(default = "default_min_operating_balance")]
    pub min_operating_balance: Decimal,

    /// Collaborator failures inside the window that halt trading
    #[serde(default = "default_error_burst_halt_count")]
    pub error_burst_halt_count: u32,

    /// Length of the failure-counting window
    #[serde(default = "default_error_burst_window_secs")]
    pub error_burst_window_secs: u64,

    /// Win-rate floor over the recent window
    #[serde(default = "default_min_win_rate_50")]
    pub min_win_rate_50: Decimal,

    /// Settlements required before the win-rate pause arms
    #[serde(default = "default_win_rate_min_samples")]
    pub win_rate_min_samples: usize,

    /// Volatility percentile above which new positions pause
    #[serde(default = "default_extreme_volatility_pct")]
    pub extreme_volatility_pct: Decimal,

    /// Maximum concurrent open positions
    #[serde(default = "default_max_positions")]
    pub max_positions: usize,

    /// Cap on same-direction committed stake as a share of cash
    #[serde(default = "default_max_directional_exposure_pct")]
    pub max_directional_exposure_pct: Decimal,

    /// Drawdown that enters CONSERVATIVE
    #[serde(default = "default_conservative_drawdown_pct")]
    pub conservative_drawdown_pct: Decimal,

    /// Loss streak that enters CONSERVATIVE
    #[serde(default = "default_conservative_loss_streak")]
    pub conservative_loss_streak: u32,

    /// Drawdown that enters DEFENSIVE
    #[serde(default = "default_defensive_drawdown_pct")]
    pub defensive_drawdown_pct: Decimal,

    /// Loss streak that enters DEFENSIVE
    #[serde(default = "default_defensive_loss_streak")]
    pub defensive_loss_streak: u32,

    /// Trailing wins required to leave RECOVERY
    #[serde(default = "default_recovery_exit_wins")]
    pub recovery_exit_wins: usize,

    /// Win rate over the long window that qualifies for scale-up
    #[serde(default = "default_scale_up_win_rate_100")]
    pub scale_up_win_rate_100: Decimal,

    /// Settlements required before scale-up is considered
    #[serde(default = "default_scale_up_min_samples")]
    pub scale_up_min_samples: usize,

    /// Absolute balance that qualifies for scale-up
    #[serde(default = "default_scale_up_balance_milestone")]
    pub scale_up_balance_milestone: Decimal,

    /// Balance as a multiple of day-start that qualifies for scale-up
    #[serde(default = "default_scale_up_day_multiple")]
    pub scale_up_day_multiple: Decimal,

    /// Cycles without a halt or pause that earn a ratchet step
    #[serde(default = "default_scale_up_clean_cycles")]
    pub scale_up_clean_cycles: u32,

    /// Multiplier applied per scale-up event
    #[serde(default = "default_scale_up_step")]
    pub scale_up_step: Decimal,

    /// Ceiling on the sizing multiplier
    #[serde(default = "default_scale_multiplier_cap")]
    pub scale_multiplier_cap: Decimal,
}

fn default_max_drawdown_pct() -> Decimal {
    Decimal::new(30, 2) // 0.30
}
fn default_max_consecutive_losses() -> u32 {
    8
}
fn default_daily_loss_limit_abs() -> Decimal {
    Decimal::new(100, 0)
}
fn default_daily_loss_limit_pct() -> Decimal {
    Decimal::new(10, 2) // 0.10
}
fn default_min_operating_balance() -> Decimal {
    Decimal::new(50, 0)
}
fn default_error_burst_halt_count() -> u32 {
    10
}
fn default_error_burst_window_secs() -> u64 {
    60
}
fn default_min_win_rate_50() -> Decimal {
    Decimal::new(53, 2) // 0.53
}
fn default_win_rate_min_samples() -> usize {
    30
}
fn default_extreme_volatility_pct() -> Decimal {
    Decimal::new(95, 2) // 0.95
}
fn default_max_positions() -> usize {
    3
}
fn default_max_directional_exposure_pct() -> Decimal {
    Decimal::new(8, 2) // 0.08
}
fn default_conservative_drawdown_pct() -> Decimal {
    Decimal::new(10, 2) // 0.10
}
fn default_conservative_loss_streak() -> u32 {
    3
}
fn default_defensive_drawdown_pct() -> Decimal {
    Decimal::new(20, 2) // 0.20
}
fn default_defensive_loss_streak() -> u32 {
    5
}
fn default_recovery_exit_wins() -> usize {
    3
}
fn default_scale_up_win_rate_100() -> Decimal {
    Decimal::new(60, 2) // 0.60
}
fn default_scale_up_min_samples() -> usize {
    100
}
fn default_scale_up_balance_milestone() -> Decimal {
    Decimal::new(1000, 0)
}
fn default_scale_up_day_multiple() -> Decimal {
    Decimal::new(15, 1) // 1.5
}
fn default_scale_up_clean_cycles() -> u32 {
    200
}
fn default_scale_up_step() -> Decimal {
    Decimal::new(125, 2) // 1.25
}
fn default_scale_multiplier_cap() -> Decimal {
    Decimal::new(2, 0)
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_drawdown_pct: default_max_drawdown_pct(),
            max_consecutive_losses: default_max_consecutive_losses(),
            daily_loss_limit_abs: default_daily_loss_limit_abs(),
            daily_loss_limit_pct: default_daily_loss_limit_pct(),
            min_operating_balance: default_min_operating_balance(),
            error_burst_halt_count: default_error_burst_halt_count(),
            error_burst_window_secs: default_error_burst_window_secs(),
            min_win_rate_50: default_min_win_rate_50(),
            win_rate_min_samples: default_win_rate_min_samples(),
            extreme_volatility_pct: default_extreme_volatility_pct(),
            max_positions: default_max_positions(),
            max_directional_exposure_pct: default_max_directional_exposure_pct(),
            conservative_drawdown_pct: default_conservative_drawdown_pct(),
            conservative_loss_streak: default_conservative_loss_streak(),
            defensive_drawdown_pct: default_defensive_drawdown_pct(),
            defensive_loss_streak: default_defensive_loss_streak(),
            recovery_exit_wins: default_recovery_exit_wins(),
            scale_up_win_rate_100: default_scale_up_win_rate_100(),
            scale_up_min_samples: default_scale_up_min_samples(),
            scale_up_balance_milestone: default_scale_up_balance_milestone(),
            scale_up_day_multiple: default_scale_up_day_multiple(),
            scale_up_clean_cycles: default_scale_up_clean_cycles(),
            scale_up_step: default_scale_up_step(),
            scale_multiplier_cap: default_scale_multiplier_cap(),
        }
    }
}

/// Decision loop timeouts
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Per-source vote timeout
    #[serde(default = "default_vote_timeout_secs")]
    pub vote_timeout_secs: u64,

    /// Order placement timeout
    #[serde(default = "default_order_timeout_secs")]
    pub order_timeout_secs: u64,

    /// Settlement poll timeout
    #[serde(default = "default_settlement_timeout_secs")]
    pub settlement_timeout_secs: u64,

    /// Balance query timeout
    #[serde(default = "default_balance_timeout_secs")]
    pub balance_timeout_secs: u64,
}

fn default_vote_timeout_secs() -> u64 {
    10
}
fn default_order_timeout_secs() -> u64 {
    15
}
fn default_settlement_timeout_secs() -> u64 {
    10
}
fn default_balance_timeout_secs() -> u64 {
    10
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            vote_timeout_secs: default_vote_timeout_secs(),
            order_timeout_secs: default_order_timeout_secs(),
            settlement_timeout_secs: default_settlement_timeout_secs(),
            balance_timeout_secs: default_balance_timeout_secs(),
        }
    }
}

/// State persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StateConfig {
    /// Where the trading state lives on disk
    #[serde(default = "default_state_path")]
    pub path: PathBuf,

    /// Opening balance when no state exists yet
    #[serde(default = "default_seed_balance")]
    pub seed_balance: Decimal,

    /// Balance differences at or under this are not corrections
    #[serde(default = "default_reconcile_tolerance")]
    pub reconcile_tolerance: Decimal,
}

fn default_state_path() -> PathBuf {
    PathBuf::from("state/trading_state.json")
}
fn default_seed_balance() -> Decimal {
    Decimal::new(500, 0)
}
fn default_reconcile_tolerance() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
            seed_balance: default_seed_balance(),
            reconcile_tolerance: default_reconcile_tolerance(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// Default log filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines instead of the pretty format
    #[serde(default)]
    pub log_json: bool,

    /// Serve Prometheus metrics
    #[serde(default)]
    pub metrics_enabled: bool,

    /// Port for the metrics exporter
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_metrics_port() -> u16 {
    9090
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: false,
            metrics_port: default_metrics_port(),
        }
    }
}
