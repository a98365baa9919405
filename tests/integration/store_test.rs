//! Durability tests for the JSON state store

use chrono::Utc;
use quorum_trader::risk::RiskMode;
use quorum_trader::signal::Direction;
use quorum_trader::state::{Position, StateStore, TradeOutcome, TradingState};
use rust_decimal_macros::dec;

fn store_at(dir: &tempfile::TempDir) -> StateStore {
    StateStore::new(dir.path().join("state.json"), dec!(500), dec!(0.01))
}

#[test]
fn test_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let now = Utc::now();

    let mut state = TradingState::new(dec!(500), now);
    state.open_position(Position::open("btc-updown-0900", Direction::Up, dec!(0.5), dec!(4), now));
    state.settle_market("btc-updown-0900", Direction::Up, now);
    state.open_position(Position::open("btc-updown-0905", Direction::Down, dec!(0.45), dec!(3), now));
    state.settle_market("btc-updown-0905", Direction::Up, now);
    state.open_position(Position::open("btc-updown-0910", Direction::Up, dec!(0.55), dec!(2), now));
    store_at(&dir).save(&state).unwrap();

    // A second store on the same path stands in for a new process
    let reloaded = store_at(&dir).load(Utc::now());
    assert_eq!(reloaded, state);
}

#[test]
fn test_rich_state_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let now = Utc::now();

    let mut state = TradingState::new(dec!(750), now);
    state.mode = RiskMode::Recovery;
    state.halt_reason = Some("drawdown 30.33% over 30% limit".to_string());
    state.consecutive_losses = 2;
    state.daily_pnl = dec!(-12.50);
    state.scale_multiplier = dec!(1.25);
    state.clean_cycles = 41;
    state.rolling_outcomes.push_back(TradeOutcome::Win);
    state.rolling_outcomes.push_back(TradeOutcome::Loss);
    state.open_position(Position::open("eth-updown-1400", Direction::Up, dec!(0.62), dec!(5), now));
    store_at(&dir).save(&state).unwrap();

    let reloaded = store_at(&dir).load(Utc::now());
    assert_eq!(reloaded.mode, RiskMode::Recovery);
    assert_eq!(reloaded.scale_multiplier, dec!(1.25));
    assert_eq!(reloaded.clean_cycles, 41);
    assert_eq!(reloaded, state);
}

#[test]
fn test_interrupted_write_leaves_last_state() {
    let dir = tempfile::tempdir().unwrap();
    let now = Utc::now();

    let mut state = TradingState::new(dec!(500), now);
    state.consecutive_losses = 4;
    let store = store_at(&dir);
    store.save(&state).unwrap();

    // A crash can strand any prefix of the next record in the scratch file;
    // whatever the cut point, the live file keeps serving the committed state
    let mut next = state.clone();
    next.consecutive_losses = 5;
    next.cash_balance = dec!(490);
    let encoded = serde_json::to_string_pretty(&next).unwrap();
    for cut in (0..encoded.len()).step_by(13) {
        std::fs::write(
            dir.path().join("state.json.tmp"),
            &encoded.as_bytes()[..cut],
        )
        .unwrap();

        let reloaded = store_at(&dir).load(Utc::now());
        assert_eq!(reloaded.consecutive_losses, 4);
        assert_eq!(reloaded.cash_balance, dec!(500));
    }
}

#[test]
fn test_corrupt_file_reseeds() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("state.json"), b"not json at all").unwrap();

    let state = store_at(&dir).load(Utc::now());
    assert_eq!(state.cash_balance, dec!(500));
    assert_eq!(state.mode, RiskMode::Normal);
    assert!(state.open_positions.is_empty());
}

#[test]
fn test_inconsistent_file_reseeds() {
    let dir = tempfile::tempdir().unwrap();
    let now = Utc::now();

    // Parses fine but books do not balance: committed stake exceeds cash
    let mut state = TradingState::new(dec!(100), now);
    state.open_position(Position::open("btc-updown-0905", Direction::Up, dec!(0.5), dec!(90), now));
    state.open_position(Position::open("btc-updown-0910", Direction::Up, dec!(0.5), dec!(90), now));
    let json = serde_json::to_string_pretty(&state).unwrap();
    std::fs::write(dir.path().join("state.json"), json).unwrap();

    let reloaded = store_at(&dir).load(Utc::now());
    assert_eq!(reloaded.cash_balance, dec!(500));
    assert!(reloaded.open_positions.is_empty());
}

#[test]
fn test_minimal_record_fills_defaults() {
    let dir = tempfile::tempdir().unwrap();

    // Record written before the mode and scaling fields existed
    let legacy = format!(
        r#"{{
            "cash_balance": "412.77",
            "peak_cash_balance": "500",
            "day_start_balance": "450",
            "day_started_at": "{}"
        }}"#,
        Utc::now().to_rfc3339()
    );
    std::fs::write(dir.path().join("state.json"), legacy).unwrap();

    let state = store_at(&dir).load(Utc::now());
    assert_eq!(state.cash_balance, dec!(412.77));
    assert_eq!(state.schema_version, 1);
    assert_eq!(state.mode, RiskMode::Normal);
    assert_eq!(state.scale_multiplier, dec!(1));
    assert!(state.rolling_outcomes.is_empty());
    assert!(state.halt_reason.is_none());
}
