//! Full decision-cycle tests against a paper broker

use async_trait::async_trait;
use chrono::Utc;
use quorum_trader::config::Config;
use quorum_trader::engine::{CycleAction, Engine};
use quorum_trader::execution::{OrderPlacer, PaperBroker, Settlement};
use quorum_trader::risk::RiskMode;
use quorum_trader::signal::{Direction, MarketSnapshot, SignalSource, Vote};
use quorum_trader::state::{Position, StateStore, TradeOutcome, TradingState};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

/// Source that always votes the same way
struct FixedSource {
    id: String,
    direction: Direction,
    confidence: Decimal,
}

impl FixedSource {
    fn boxed(id: &str, direction: Direction, confidence: Decimal) -> Box<dyn SignalSource> {
        Box::new(Self {
            id: id.to_string(),
            direction,
            confidence,
        })
    }
}

#[async_trait]
impl SignalSource for FixedSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn vote(&self, _snapshot: &MarketSnapshot) -> anyhow::Result<Option<Vote>> {
        Ok(Some(Vote::new(
            self.id.clone(),
            self.direction,
            self.confidence,
            dec!(1.0),
        )))
    }
}

/// Source whose feed is down
struct FailingSource;

#[async_trait]
impl SignalSource for FailingSource {
    fn id(&self) -> &str {
        "broken"
    }

    async fn vote(&self, _snapshot: &MarketSnapshot) -> anyhow::Result<Option<Vote>> {
        anyhow::bail!("feed offline")
    }
}

/// Source that never answers
struct HangingSource;

#[async_trait]
impl SignalSource for HangingSource {
    fn id(&self) -> &str {
        "stuck"
    }

    async fn vote(&self, _snapshot: &MarketSnapshot) -> anyhow::Result<Option<Vote>> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        Ok(None)
    }
}

fn test_config(dir: &tempfile::TempDir) -> Config {
    let mut config = Config::default();
    config.state.path = dir.path().join("state.json");
    config
}

fn snapshot(market_id: &str) -> MarketSnapshot {
    MarketSnapshot {
        market_id: market_id.to_string(),
        up_price: dec!(0.50),
        cycle_ts: Utc::now(),
        volatility_percentile: None,
    }
}

fn seed_state(config: &Config, state: &TradingState) {
    StateStore::from_config(&config.state)
        .save(state)
        .unwrap();
}

#[tokio::test]
async fn test_unanimous_consensus_places_order() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let broker = Arc::new(PaperBroker::new(dec!(500)));
    let sources = vec![
        FixedSource::boxed("momentum", Direction::Up, dec!(0.8)),
        FixedSource::boxed("orderflow", Direction::Up, dec!(0.7)),
        FixedSource::boxed("sentiment", Direction::Up, dec!(0.9)),
    ];
    let mut engine = Engine::new(config, sources, Arc::clone(&broker) as Arc<dyn OrderPlacer>);

    let report = engine.run_cycle(&snapshot("btc-updown-0905")).await.unwrap();

    // Fresh 500 account: tier 8%, assumed 55% win rate at half-Kelly
    assert_eq!(
        report.action,
        CycleAction::Placed {
            market_id: "btc-updown-0905".to_string(),
            direction: Direction::Up,
            size: dec!(2),
        }
    );
    assert_eq!(report.votes, 3);

    let orders = broker.placed_orders().await;
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].price, dec!(0.50));
    assert_eq!(engine.state().open_positions.len(), 1);
    assert_eq!(engine.state().committed(), dec!(2));
}

#[tokio::test]
async fn test_placed_position_is_durable() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let state_path = config.state.path.clone();
    let broker = Arc::new(PaperBroker::new(dec!(500)));
    let sources = vec![FixedSource::boxed("momentum", Direction::Up, dec!(0.8))];
    let mut engine = Engine::new(config, sources, Arc::clone(&broker) as Arc<dyn OrderPlacer>);

    engine.run_cycle(&snapshot("btc-updown-0905")).await.unwrap();

    // A process restart sees the open position
    let reloaded = StateStore::new(state_path, dec!(500), dec!(0.01)).load(Utc::now());
    assert_eq!(reloaded.open_positions.len(), 1);
    assert_eq!(reloaded.open_positions[0].market_id, "btc-updown-0905");
}

#[tokio::test]
async fn test_split_votes_abstain() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let broker = Arc::new(PaperBroker::new(dec!(500)));
    let sources = vec![
        FixedSource::boxed("momentum", Direction::Up, dec!(0.8)),
        FixedSource::boxed("orderflow", Direction::Up, dec!(0.8)),
        FixedSource::boxed("sentiment", Direction::Down, dec!(0.8)),
    ];
    let mut engine = Engine::new(config, sources, Arc::clone(&broker) as Arc<dyn OrderPlacer>);

    // Net score 1/3 sits under the 0.70 threshold
    let report = engine.run_cycle(&snapshot("btc-updown-0905")).await.unwrap();
    assert_eq!(report.action, CycleAction::Abstained);
    assert!(broker.placed_orders().await.is_empty());
}

#[tokio::test]
async fn test_halted_state_blocks_all_orders() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let mut halted = TradingState::new(dec!(500), Utc::now());
    halted.mode = RiskMode::Halted;
    halted.halt_reason = Some("8 consecutive losses at limit 8".to_string());
    seed_state(&config, &halted);

    let broker = Arc::new(PaperBroker::new(dec!(500)));
    let sources = vec![FixedSource::boxed("momentum", Direction::Up, dec!(0.9))];
    let mut engine = Engine::new(config, sources, Arc::clone(&broker) as Arc<dyn OrderPlacer>);

    let report = engine.run_cycle(&snapshot("btc-updown-0905")).await.unwrap();
    assert_eq!(report.action, CycleAction::Blocked(RiskMode::Halted));
    assert!(broker.placed_orders().await.is_empty());
    // The halt reason survives the cycle untouched
    assert!(engine.state().halt_reason.is_some());
}

#[tokio::test]
async fn test_settlement_lands_before_governor_decides() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let now = Utc::now();

    // Seven losses down, one position still riding
    let mut state = TradingState::new(dec!(500), now);
    state.consecutive_losses = 7;
    state.open_position(Position::open("btc-updown-0850", Direction::Up, dec!(0.5), dec!(10), now));
    seed_state(&config, &state);

    let broker = Arc::new(PaperBroker::new(dec!(500)));
    broker
        .push_settlement(Settlement {
            market_id: "btc-updown-0850".to_string(),
            winning_direction: Direction::Down,
            resolved_at: now,
        })
        .await;
    let sources = vec![
        FixedSource::boxed("momentum", Direction::Up, dec!(0.9)),
        FixedSource::boxed("orderflow", Direction::Up, dec!(0.9)),
    ];
    let mut engine = Engine::new(config, sources, Arc::clone(&broker) as Arc<dyn OrderPlacer>);

    // The eighth loss settles first, so the governor halts before placing
    let report = engine.run_cycle(&snapshot("btc-updown-0905")).await.unwrap();
    assert_eq!(report.settled, 1);
    assert_eq!(report.action, CycleAction::Blocked(RiskMode::Halted));
    assert_eq!(engine.state().consecutive_losses, 8);
    assert!(broker.placed_orders().await.is_empty());
}

#[tokio::test]
async fn test_failing_source_does_not_sink_the_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let broker = Arc::new(PaperBroker::new(dec!(500)));
    let sources: Vec<Box<dyn SignalSource>> = vec![
        FixedSource::boxed("momentum", Direction::Up, dec!(0.8)),
        Box::new(FailingSource),
        FixedSource::boxed("orderflow", Direction::Up, dec!(0.8)),
    ];
    let mut engine = Engine::new(config, sources, Arc::clone(&broker) as Arc<dyn OrderPlacer>);

    let report = engine.run_cycle(&snapshot("btc-updown-0905")).await.unwrap();
    assert_eq!(report.votes, 2);
    assert!(matches!(report.action, CycleAction::Placed { .. }));
}

#[tokio::test]
async fn test_hanging_source_costs_its_vote_not_the_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&dir);
    config.engine.vote_timeout_secs = 1;

    let broker = Arc::new(PaperBroker::new(dec!(500)));
    let sources: Vec<Box<dyn SignalSource>> = vec![
        FixedSource::boxed("momentum", Direction::Up, dec!(0.8)),
        Box::new(HangingSource),
        FixedSource::boxed("orderflow", Direction::Up, dec!(0.8)),
    ];
    let mut engine = Engine::new(config, sources, Arc::clone(&broker) as Arc<dyn OrderPlacer>);

    let report = engine.run_cycle(&snapshot("btc-updown-0905")).await.unwrap();
    assert_eq!(report.votes, 2);
    assert!(matches!(report.action, CycleAction::Placed { .. }));
}

#[tokio::test]
async fn test_no_edge_in_the_record_sizes_to_zero() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let now = Utc::now();

    // 10W/10L: enough history for real Kelly, below the pause arming floor
    let mut state = TradingState::new(dec!(500), now);
    for _ in 0..10 {
        state.rolling_outcomes.push_back(TradeOutcome::Win);
        state.rolling_outcomes.push_back(TradeOutcome::Loss);
    }
    seed_state(&config, &state);

    let broker = Arc::new(PaperBroker::new(dec!(500)));
    let sources = vec![FixedSource::boxed("momentum", Direction::Up, dec!(0.9))];
    let mut engine = Engine::new(config, sources, Arc::clone(&broker) as Arc<dyn OrderPlacer>);

    let report = engine.run_cycle(&snapshot("btc-updown-0905")).await.unwrap();
    assert_eq!(report.action, CycleAction::ZeroSize);
    assert_eq!(report.mode, RiskMode::Normal);
    assert!(broker.placed_orders().await.is_empty());
}

#[tokio::test]
async fn test_settled_price_sizes_to_zero() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let broker = Arc::new(PaperBroker::new(dec!(500)));
    let sources = vec![FixedSource::boxed("momentum", Direction::Up, dec!(0.9))];
    let mut engine = Engine::new(config, sources, Arc::clone(&broker) as Arc<dyn OrderPlacer>);

    // Up already trades at 1.0, so there is no side worth buying
    let mut snap = snapshot("btc-updown-0905");
    snap.up_price = dec!(1.0);

    let report = engine.run_cycle(&snap).await.unwrap();
    assert_eq!(report.action, CycleAction::ZeroSize);
    assert!(broker.placed_orders().await.is_empty());
}

#[tokio::test]
async fn test_error_burst_halts_the_account() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&dir);
    config.risk.error_burst_halt_count = 3;

    let broker = Arc::new(PaperBroker::new(dec!(500)));
    let sources: Vec<Box<dyn SignalSource>> = vec![
        Box::new(FailingSource),
        Box::new(FailingSource),
        Box::new(FailingSource),
    ];
    let mut engine = Engine::new(config, sources, Arc::clone(&broker) as Arc<dyn OrderPlacer>);

    let report = engine.run_cycle(&snapshot("btc-updown-0905")).await.unwrap();
    assert_eq!(report.action, CycleAction::Blocked(RiskMode::Halted));
    assert!(engine
        .state()
        .halt_reason
        .as_deref()
        .unwrap()
        .contains("failures"));
}

#[tokio::test]
async fn test_pause_clears_once_positions_settle() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&dir);
    config.risk.max_positions = 1;
    let now = Utc::now();

    let mut state = TradingState::new(dec!(500), now);
    state.open_position(Position::open("btc-updown-0850", Direction::Up, dec!(0.5), dec!(10), now));
    seed_state(&config, &state);

    let broker = Arc::new(PaperBroker::new(dec!(500)));
    let sources = vec![FixedSource::boxed("momentum", Direction::Up, dec!(0.9))];
    let mut engine = Engine::new(config, sources, Arc::clone(&broker) as Arc<dyn OrderPlacer>);

    // At the cap: paused, nothing placed
    let report = engine.run_cycle(&snapshot("btc-updown-0905")).await.unwrap();
    assert_eq!(report.action, CycleAction::Blocked(RiskMode::Paused));

    // The riding position settles as a win; the pause clears on its own
    broker
        .push_settlement(Settlement {
            market_id: "btc-updown-0850".to_string(),
            winning_direction: Direction::Up,
            resolved_at: Utc::now(),
        })
        .await;
    let report = engine.run_cycle(&snapshot("btc-updown-0920")).await.unwrap();
    assert_eq!(report.settled, 1);
    assert!(matches!(report.action, CycleAction::Placed { .. }));
    assert_eq!(engine.state().mode, RiskMode::Normal);
}

#[tokio::test]
async fn test_no_second_position_on_same_market() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let broker = Arc::new(PaperBroker::new(dec!(500)));
    let sources = vec![FixedSource::boxed("momentum", Direction::Up, dec!(0.9))];
    let mut engine = Engine::new(config, sources, Arc::clone(&broker) as Arc<dyn OrderPlacer>);

    let first = engine.run_cycle(&snapshot("btc-updown-0905")).await.unwrap();
    assert!(matches!(first.action, CycleAction::Placed { .. }));

    let second = engine.run_cycle(&snapshot("btc-updown-0905")).await.unwrap();
    assert_eq!(second.action, CycleAction::AlreadyExposed);
    assert_eq!(broker.placed_orders().await.len(), 1);
}

#[tokio::test]
async fn test_reconcile_adopts_venue_balance() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let now = Utc::now();

    let mut state = TradingState::new(dec!(500), now);
    state.cash_balance = dec!(290.53);
    seed_state(&config, &state);

    let broker = Arc::new(PaperBroker::new(dec!(200.97)));
    let mut engine = Engine::new(config, vec![], Arc::clone(&broker) as Arc<dyn OrderPlacer>);

    let correction = engine.reconcile(broker.as_ref()).await.unwrap().unwrap();
    assert_eq!(correction.previous_cash, dec!(290.53));
    assert_eq!(correction.corrected_cash, dec!(200.97));
    assert_eq!(engine.state().cash_balance, dec!(200.97));
    assert_eq!(engine.state().peak_cash_balance, dec!(200.97));
    assert!(engine.state().validation_error().is_none());
}
