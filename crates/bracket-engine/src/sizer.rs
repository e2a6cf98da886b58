//! Position sizing: converts a risk budget and a volatility reading into a
//! bracket plan with per-instrument contract quantities.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use strategy_core::{InstrumentKind, MarketSnapshot, Result, RiskParameters, StrategyError};

/// Prices and quantities for one bracket, derived once at activation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BracketPlan {
    pub entry_price: Decimal,
    pub stop_price: Decimal,
    pub target_price: Decimal,
    /// Whole contracts of the full-size instrument.
    pub primary_qty: u64,
    /// Fractional remainder re-expressed in micro contracts.
    pub micro_qty: u64,
}

impl BracketPlan {
    /// Planned quantity for one instrument.
    pub fn quantity(&self, instrument: InstrumentKind) -> u64 {
        match instrument {
            InstrumentKind::Primary => self.primary_qty,
            InstrumentKind::Micro => self.micro_qty,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.primary_qty == 0 && self.micro_qty == 0
    }
}

/// Size a bracket from the risk parameters and a market snapshot.
///
/// `stop_distance = volatility x stop_loss_multiple`, the stop sits below the
/// entry and the target above it at `reward_risk_ratio` times the distance.
/// The raw quantity `risk_budget / value_per_contract` is split into whole
/// full-size contracts plus the remainder expressed in micro contracts.
///
/// Pure computation, no side effects. Zero volatility or a zero per-contract
/// value is a fatal precondition violation, never a silent zero-quantity
/// order.
pub fn size_bracket(
    params: &RiskParameters,
    snapshot: &MarketSnapshot,
    micro_per_primary: u32,
) -> Result<BracketPlan> {
    params.validate()?;

    if snapshot.volatility <= Decimal::ZERO {
        return Err(StrategyError::DegenerateMarket(format!(
            "volatility reading must be positive, got {}",
            snapshot.volatility
        )));
    }
    if snapshot.tick_size <= Decimal::ZERO || snapshot.tick_cost <= Decimal::ZERO {
        return Err(StrategyError::DegenerateMarket(format!(
            "tick size {} / tick cost {} must be positive",
            snapshot.tick_size, snapshot.tick_cost
        )));
    }

    let stop_distance = snapshot.volatility * params.stop_loss_multiple;
    let stop_price = snapshot.price - stop_distance;
    let target_price = snapshot.price + stop_distance * params.reward_risk_ratio;

    let value_per_contract = stop_distance / snapshot.tick_size * snapshot.tick_cost;
    if value_per_contract <= Decimal::ZERO {
        return Err(StrategyError::DegenerateMarket(format!(
            "per-contract risk value must be positive, got {value_per_contract}"
        )));
    }

    let raw_qty = params.risk_budget / value_per_contract;
    let whole = raw_qty.trunc();
    let remainder = (raw_qty - whole) * Decimal::from(micro_per_primary);

    let primary_qty = whole
        .to_u64()
        .ok_or_else(|| StrategyError::DegenerateMarket(format!("raw quantity {raw_qty} out of range")))?;
    let micro_qty = remainder
        .round()
        .to_u64()
        .ok_or_else(|| StrategyError::DegenerateMarket(format!("micro remainder {remainder} out of range")))?;

    if primary_qty == 0 && micro_qty == 0 {
        return Err(StrategyError::InvalidParameters(format!(
            "risk budget {} buys no contracts at {} per contract",
            params.risk_budget, value_per_contract
        )));
    }

    Ok(BracketPlan {
        entry_price: snapshot.price,
        stop_price,
        target_price,
        primary_qty,
        micro_qty,
    })
}
