//! Durable account state and its JSON store

mod store;
mod trading;

pub use store::{Correction, StateStore, StoreError};
pub use trading::{
    Outcome, Position, TradeOutcome, TradingState, ROLLING_OUTCOME_CAP, SCHEMA_VERSION,
};
