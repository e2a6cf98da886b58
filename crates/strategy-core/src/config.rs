//! Configuration for the bracket strategy.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{Result, StrategyError};

/// Risk inputs for one activation. Immutable once the strategy is armed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskParameters {
    /// Currency amount put at risk per activation.
    pub risk_budget: Decimal,
    /// Stop distance as a multiple of the volatility reading.
    pub stop_loss_multiple: Decimal,
    /// Target distance as a multiple of the stop distance.
    pub reward_risk_ratio: Decimal,
    /// Lookback length for the volatility (ATR) reading.
    pub atr_period: u32,
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            risk_budget: Decimal::new(200, 0),
            stop_loss_multiple: Decimal::new(16, 1), // 1.6 x ATR
            reward_risk_ratio: Decimal::new(16, 1),  // 1.6 : 1
            atr_period: 13,
        }
    }
}

impl RiskParameters {
    /// Load parameters from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Self {
            risk_budget: env::var("RISK_BUDGET")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.risk_budget),
            stop_loss_multiple: env::var("STOP_LOSS_MULTIPLE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.stop_loss_multiple),
            reward_risk_ratio: env::var("REWARD_RISK_RATIO")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.reward_risk_ratio),
            atr_period: env::var("ATR_PERIOD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.atr_period),
        }
    }

    /// Reject parameter sets the sizer cannot act on.
    pub fn validate(&self) -> Result<()> {
        if self.risk_budget <= Decimal::ZERO {
            return Err(StrategyError::InvalidParameters(format!(
                "risk budget must be positive, got {}",
                self.risk_budget
            )));
        }
        if self.stop_loss_multiple <= Decimal::ZERO {
            return Err(StrategyError::InvalidParameters(format!(
                "stop-loss multiple must be positive, got {}",
                self.stop_loss_multiple
            )));
        }
        if self.reward_risk_ratio <= Decimal::ZERO {
            return Err(StrategyError::InvalidParameters(format!(
                "reward:risk ratio must be positive, got {}",
                self.reward_risk_ratio
            )));
        }
        if self.atr_period == 0 {
            return Err(StrategyError::InvalidParameters(
                "ATR period must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Static strategy wiring: which contracts to trade and on which account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Symbol of the full-size contract.
    pub primary_symbol: String,
    /// Symbol of the micro contract.
    pub micro_symbol: String,
    /// Account identifier passed through to the gateway.
    pub account: String,
    /// Micro contracts per one full-size contract (10 for ES/MES).
    pub micro_per_primary: u32,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            primary_symbol: "ES".to_string(),
            micro_symbol: "MES".to_string(),
            account: "SIM".to_string(),
            micro_per_primary: 10,
        }
    }
}

impl StrategyConfig {
    /// Load wiring from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Self {
            primary_symbol: env::var("PRIMARY_SYMBOL").unwrap_or(defaults.primary_symbol),
            micro_symbol: env::var("MICRO_SYMBOL").unwrap_or(defaults.micro_symbol),
            account: env::var("TRADING_ACCOUNT").unwrap_or(defaults.account),
            micro_per_primary: env::var("MICRO_PER_PRIMARY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.micro_per_primary),
        }
    }
}
