//! Risk governor state machine and position sizing

mod governor;
mod sizing;
mod types;

pub use governor::RiskGovernor;
pub use sizing::PositionSizer;
pub use types::{Assessment, CycleContext, HaltReason, PauseReason, RiskMode, ScaleUpReason};
