//! Decision cycle orchestration
//!
//! One cycle runs to completion before the next begins: settle outcomes,
//! aggregate votes, decide, govern, size, place. Calls to collaborators are
//! the only await points and every one carries a timeout, so a slow feed or
//! venue costs at most one cycle, never the process.

use crate::config::{Config, EngineConfig};
use crate::consensus::{ConsensusEngine, Verdict};
use crate::execution::{BalanceSource, OrderPlacer, TradeOrder};
use crate::risk::{CycleContext, PositionSizer, RiskGovernor, RiskMode};
use crate::signal::{Direction, MarketSnapshot, SignalAggregator, SignalSource, Vote};
use crate::state::{Correction, Position, StateStore, TradingState};
use crate::telemetry;
use anyhow::Context;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

mod health;

pub use health::FailureWindow;

/// What one decision cycle did
#[derive(Debug, Clone, PartialEq)]
pub enum CycleAction {
    /// An order went out
    Placed {
        market_id: String,
        direction: Direction,
        size: Decimal,
    },
    /// Consensus did not clear the bar
    Abstained,
    /// The governor blocked new positions
    Blocked(RiskMode),
    /// The sizer produced nothing worth placing
    ZeroSize,
    /// A position is already open on this market
    AlreadyExposed,
    /// The venue rejected or never answered the order
    PlacementFailed,
}

/// Summary of one completed decision cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub action: CycleAction,
    /// Positions settled at the top of the cycle
    pub settled: usize,
    /// Votes that survived normalization
    pub votes: usize,
    /// Mode after this cycle's governor pass
    pub mode: RiskMode,
}

/// The decision loop and the single writer of `TradingState`
pub struct Engine {
    config: EngineConfig,
    aggregator: SignalAggregator,
    consensus: ConsensusEngine,
    governor: RiskGovernor,
    sizer: PositionSizer,
    sources: Vec<Box<dyn SignalSource>>,
    broker: Arc<dyn OrderPlacer>,
    store: StateStore,
    state: TradingState,
    failures: FailureWindow,
}

impl Engine {
    /// Wire the engine from config, loading persisted state if present
    pub fn new(
        config: Config,
        sources: Vec<Box<dyn SignalSource>>,
        broker: Arc<dyn OrderPlacer>,
    ) -> Self {
        let store = StateStore::from_config(&config.state);
        let state = store.load(Utc::now());
        let failure_window =
            chrono::Duration::seconds(config.risk.error_burst_window_secs as i64);

        Self {
            aggregator: SignalAggregator::from_config(&config.aggregator),
            consensus: ConsensusEngine::new(config.consensus),
            governor: RiskGovernor::new(config.risk),
            sizer: PositionSizer::new(config.sizing),
            config: config.engine,
            sources,
            broker,
            store,
            state,
            failures: FailureWindow::new(failure_window),
        }
    }

    pub fn state(&self) -> &TradingState {
        &self.state
    }

    /// Run one decision cycle against the given market snapshot
    ///
    /// Settlement bookkeeping lands before the governor evaluates, so the
    /// mode decision always sees the freshest outcomes. A halt discovered
    /// here blocks this cycle's order but never an in-flight settlement.
    pub async fn run_cycle(&mut self, snapshot: &MarketSnapshot) -> anyhow::Result<CycleReport> {
        let now = snapshot.cycle_ts;

        let settled = self.settle_pending().await;
        let rolled = self.state.roll_day_if_needed(now);
        if settled > 0 || rolled {
            // Settled outcomes are durable before any further collaborator call
            self.persist()?;
        }

        let raw = self.collect_votes(snapshot).await;
        let votes = self.aggregator.normalize(raw, now);
        let result = self.consensus.decide(&votes);

        let mut ctx = CycleContext::new(now).with_failures(self.failures.count_at(now));
        if let Some(percentile) = snapshot.volatility_percentile {
            ctx = ctx.with_volatility(percentile);
        }
        let assessment = self.governor.evaluate(&self.state, &ctx);
        self.governor.apply(&mut self.state, &assessment);
        self.persist()?;
        telemetry::publish_state(&self.state);

        let mode = self.state.mode;
        let report = |action: CycleAction| CycleReport {
            action,
            settled,
            votes: votes.len(),
            mode,
        };

        if !mode.allows_trading() {
            return Ok(report(CycleAction::Blocked(mode)));
        }

        let direction = match result.verdict {
            Verdict::Trade(direction) => direction,
            Verdict::Abstain(reason) => {
                tracing::debug!(market = %snapshot.market_id, reason = ?reason, "Abstaining");
                return Ok(report(CycleAction::Abstained));
            }
        };

        if self
            .state
            .open_positions
            .iter()
            .any(|p| p.market_id == snapshot.market_id)
        {
            tracing::debug!(market = %snapshot.market_id, "Already holding this market");
            return Ok(report(CycleAction::AlreadyExposed));
        }

        let price = snapshot.price_for(direction);
        let size = if price <= Decimal::ZERO || price >= Decimal::ONE {
            tracing::warn!(market = %snapshot.market_id, %price, "No tradable price for side");
            Decimal::ZERO
        } else {
            self.sizer.size(&self.state)
        };
        if size.is_zero() {
            return Ok(report(CycleAction::ZeroSize));
        }

        let order = TradeOrder {
            market_id: snapshot.market_id.clone(),
            direction,
            price,
            size,
        };
        let placement = tokio::time::timeout(
            Duration::from_secs(self.config.order_timeout_secs),
            self.broker.place(order),
        )
        .await;

        match placement {
            Ok(Ok(placed)) => {
                self.state.open_position(Position::open(
                    placed.market_id,
                    direction,
                    price,
                    size,
                    now,
                ));
                self.persist()?;
                Ok(report(CycleAction::Placed {
                    market_id: snapshot.market_id.clone(),
                    direction,
                    size,
                }))
            }
            Ok(Err(err)) => {
                self.failures.record(now);
                tracing::warn!(market = %snapshot.market_id, error = %err, "Order placement failed");
                Ok(report(CycleAction::PlacementFailed))
            }
            Err(_) => {
                self.failures.record(now);
                tracing::warn!(market = %snapshot.market_id, "Order placement timed out");
                Ok(report(CycleAction::PlacementFailed))
            }
        }
    }

    /// Pull the venue's settled balance and force the account onto it
    pub async fn reconcile(
        &mut self,
        source: &dyn BalanceSource,
    ) -> anyhow::Result<Option<Correction>> {
        let balance = tokio::time::timeout(
            Duration::from_secs(self.config.balance_timeout_secs),
            source.settled_balance(),
        )
        .await
        .context("balance query timed out")??;

        let correction = self.store.reconcile(&mut self.state, balance, Utc::now());
        if correction.is_some() {
            self.persist()?;
        }
        Ok(correction)
    }

    async fn settle_pending(&mut self) -> usize {
        let polled = tokio::time::timeout(
            Duration::from_secs(self.config.settlement_timeout_secs),
            self.broker.poll_settlements(),
        )
        .await;

        let settlements = match polled {
            Ok(Ok(settlements)) => settlements,
            Ok(Err(err)) => {
                self.failures.record(Utc::now());
                tracing::warn!(error = %err, "Settlement poll failed");
                return 0;
            }
            Err(_) => {
                self.failures.record(Utc::now());
                tracing::warn!("Settlement poll timed out");
                return 0;
            }
        };

        let mut settled = 0;
        for settlement in settlements {
            let applied = self.state.settle_market(
                &settlement.market_id,
                settlement.winning_direction,
                settlement.resolved_at,
            );
            if applied.is_some() {
                settled += 1;
            } else {
                tracing::debug!(
                    market = %settlement.market_id,
                    "Settlement for a market with no open position"
                );
            }
        }
        settled
    }

    async fn collect_votes(&mut self, snapshot: &MarketSnapshot) -> Vec<Vote> {
        let vote_timeout = Duration::from_secs(self.config.vote_timeout_secs);
        let mut votes = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            let outcome = tokio::time::timeout(vote_timeout, source.vote(snapshot)).await;
            match outcome {
                Ok(Ok(Some(vote))) => votes.push(vote),
                Ok(Ok(None)) => {
                    tracing::debug!(source = source.id(), "Source had no opinion");
                }
                Ok(Err(err)) => {
                    self.failures.record(snapshot.cycle_ts);
                    tracing::warn!(source = source.id(), error = %err, "Source failed");
                }
                Err(_) => {
                    self.failures.record(snapshot.cycle_ts);
                    tracing::warn!(source = source.id(), "Source timed out");
                }
            }
        }
        votes
    }

    fn persist(&self) -> anyhow::Result<()> {
        self.store.save(&self.state)?;
        Ok(())
    }
}
