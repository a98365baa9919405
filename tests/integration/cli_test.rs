//! Operator command tests

use chrono::Utc;
use quorum_trader::cli::{ReconcileArgs, ResetArgs, StatusArgs};
use quorum_trader::config::Config;
use quorum_trader::risk::RiskMode;
use quorum_trader::state::{StateStore, TradingState};
use rust_decimal_macros::dec;

fn test_config(dir: &tempfile::TempDir) -> Config {
    let mut config = Config::default();
    config.state.path = dir.path().join("state.json");
    config
}

fn seed_state(config: &Config, state: &TradingState) {
    StateStore::from_config(&config.state)
        .save(state)
        .unwrap();
}

fn reload(config: &Config) -> TradingState {
    StateStore::from_config(&config.state).load(Utc::now())
}

#[tokio::test]
async fn test_reset_clears_halt_into_recovery() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);

    let mut state = TradingState::new(dec!(500), Utc::now());
    state.cash_balance = dec!(340);
    state.consecutive_losses = 8;
    state.mode = RiskMode::Halted;
    state.halt_reason = Some("8 consecutive losses at limit 8".to_string());
    seed_state(&config, &state);

    let args = ResetArgs { note: Some("manual review done".to_string()) };
    args.execute(&config).await.unwrap();

    let after = reload(&config);
    assert_eq!(after.mode, RiskMode::Recovery);
    assert!(after.halt_reason.is_none());
    assert_eq!(after.consecutive_losses, 0);
    // Peak re-bases to current cash so the same drawdown cannot re-halt
    assert_eq!(after.peak_cash_balance, dec!(340));
    assert_eq!(after.day_start_balance, dec!(340));
}

#[tokio::test]
async fn test_reset_refuses_non_halted_account() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);

    let mut state = TradingState::new(dec!(500), Utc::now());
    state.cash_balance = dec!(420);
    seed_state(&config, &state);

    let args = ResetArgs { note: None };
    args.execute(&config).await.unwrap();

    // Nothing changed: the account was never halted
    let after = reload(&config);
    assert_eq!(after.mode, RiskMode::Normal);
    assert_eq!(after.peak_cash_balance, dec!(500));
}

#[tokio::test]
async fn test_reconcile_command_adopts_reported_balance() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);

    let mut state = TradingState::new(dec!(500), Utc::now());
    state.cash_balance = dec!(290.53);
    seed_state(&config, &state);

    let args = ReconcileArgs { balance: dec!(200.97) };
    args.execute(&config).await.unwrap();

    let after = reload(&config);
    assert_eq!(after.cash_balance, dec!(200.97));
    assert_eq!(after.peak_cash_balance, dec!(200.97));
    assert_eq!(after.day_start_balance, dec!(200.97));
    assert_eq!(after.daily_pnl, dec!(0));
}

#[tokio::test]
async fn test_reconcile_command_within_tolerance_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);

    let state = TradingState::new(dec!(500), Utc::now());
    seed_state(&config, &state);

    let args = ReconcileArgs { balance: dec!(500.01) };
    args.execute(&config).await.unwrap();

    let after = reload(&config);
    assert_eq!(after.cash_balance, dec!(500));
}

#[tokio::test]
async fn test_status_renders_without_state_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);

    StatusArgs { json: false }.execute(&config).await.unwrap();
    StatusArgs { json: true }.execute(&config).await.unwrap();
}
