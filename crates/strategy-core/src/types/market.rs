//! Market snapshot consumed once at activation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Point-in-time market readings for the primary instrument.
///
/// Read from the gateway exactly once when the strategy activates; the
/// bracket plan derived from it is never recomputed mid-trade.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Last traded price of the primary instrument.
    pub price: Decimal,
    /// Volatility reading (e.g. an ATR value) in price units.
    pub volatility: Decimal,
    /// Minimum price increment of the primary instrument.
    pub tick_size: Decimal,
    /// Monetary value of one tick at the current price.
    pub tick_cost: Decimal,
}
