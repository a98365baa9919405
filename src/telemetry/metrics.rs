//! Prometheus metrics

use crate::state::TradingState;
use metrics::{describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use rust_decimal::prelude::ToPrimitive;

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Realized cash balance
    CashBalance,
    /// Highest realized cash observed
    PeakBalance,
    /// Drawdown from the realized peak
    DrawdownPct,
    /// Open position count
    OpenPositions,
    /// Current losing streak
    ConsecutiveLosses,
    /// Realized P&L for the current day
    DailyPnl,
    /// Sizing ratchet multiplier
    ScaleMultiplier,
}

impl GaugeMetric {
    fn name(&self) -> &'static str {
        match self {
            GaugeMetric::CashBalance => "quorum_cash_balance_usd",
            GaugeMetric::PeakBalance => "quorum_peak_balance_usd",
            GaugeMetric::DrawdownPct => "quorum_drawdown_pct",
            GaugeMetric::OpenPositions => "quorum_open_positions",
            GaugeMetric::ConsecutiveLosses => "quorum_consecutive_losses",
            GaugeMetric::DailyPnl => "quorum_daily_pnl_usd",
            GaugeMetric::ScaleMultiplier => "quorum_scale_multiplier",
        }
    }
}

/// Start the Prometheus exporter on the given port
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()?;

    describe_gauge!("quorum_cash_balance_usd", "Realized cash balance");
    describe_gauge!("quorum_peak_balance_usd", "Highest realized cash observed");
    describe_gauge!("quorum_drawdown_pct", "Drawdown from the realized peak");
    describe_gauge!("quorum_open_positions", "Open position count");
    describe_gauge!("quorum_consecutive_losses", "Current losing streak");
    describe_gauge!("quorum_daily_pnl_usd", "Realized P&L for the current day");
    describe_gauge!("quorum_scale_multiplier", "Sizing ratchet multiplier");

    tracing::info!(port, "Metrics exporter listening");
    Ok(())
}

/// Set a gauge value
///
/// A no-op until the exporter is installed.
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    gauge!(metric.name()).set(value);
}

/// Push the per-cycle account gauges
pub fn publish_state(state: &TradingState) {
    set_gauge(
        GaugeMetric::CashBalance,
        state.cash_balance.to_f64().unwrap_or(0.0),
    );
    set_gauge(
        GaugeMetric::PeakBalance,
        state.peak_cash_balance.to_f64().unwrap_or(0.0),
    );
    set_gauge(
        GaugeMetric::DrawdownPct,
        state.drawdown().to_f64().unwrap_or(0.0),
    );
    set_gauge(GaugeMetric::OpenPositions, state.open_positions.len() as f64);
    set_gauge(
        GaugeMetric::ConsecutiveLosses,
        f64::from(state.consecutive_losses),
    );
    set_gauge(
        GaugeMetric::DailyPnl,
        state.daily_pnl.to_f64().unwrap_or(0.0),
    );
    set_gauge(
        GaugeMetric::ScaleMultiplier,
        state.scale_multiplier.to_f64().unwrap_or(1.0),
    );
}
