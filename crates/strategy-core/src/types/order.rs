//! Order requests, submission acknowledgements, and gateway events.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::InstrumentKind;

/// Side of the order (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// How the order executes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    /// Executes immediately at the best available price.
    Market,
    /// Rests at a limit price (take-profit leg).
    Limit { price: Decimal },
    /// Triggers a market order at a stop price (stop-loss leg).
    Stop { trigger_price: Decimal },
}

/// A submission request handed to the gateway.
///
/// The correlation tag is caller-generated and travels with the order; the
/// gateway echoes it back on the asynchronous acknowledgement so the order
/// can be resolved to its semantic role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub instrument: InstrumentKind,
    pub account: String,
    pub side: OrderSide,
    pub quantity: u64,
    pub kind: OrderKind,
    pub tag: String,
}

/// Result of the synchronous submission call.
///
/// Success here means the gateway accepted the request, not that the order
/// filled; fills arrive later on the event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitStatus {
    Success,
    Failure,
}

/// Synchronous acknowledgement of an order submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAck {
    pub status: SubmitStatus,
    /// Broker-assigned order id, when the gateway returns one synchronously.
    pub order_id: Option<String>,
    pub message: Option<String>,
}

impl SubmitAck {
    pub fn success(order_id: impl Into<String>) -> Self {
        Self {
            status: SubmitStatus::Success,
            order_id: Some(order_id.into()),
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: SubmitStatus::Failure,
            order_id: None,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SubmitStatus::Success
    }
}

/// A confirmed trade execution reported by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeFill {
    /// Broker-assigned id of the order this fill belongs to.
    pub order_id: String,
    pub quantity: u64,
    pub gross_pnl: Decimal,
    /// Net figure as reported by the venue, with the exit-side fee already
    /// deducted.
    pub net_pnl: Decimal,
    pub fee: Decimal,
    pub executed_at: DateTime<Utc>,
}

impl TradeFill {
    pub fn new(
        order_id: impl Into<String>,
        quantity: u64,
        gross_pnl: Decimal,
        net_pnl: Decimal,
        fee: Decimal,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            quantity,
            gross_pnl,
            net_pnl,
            fee,
            executed_at: Utc::now(),
        }
    }
}

/// Asynchronous event delivered by the gateway's order/trade stream.
///
/// Acknowledgements and trade confirmations are unordered relative to the
/// synchronous submission calls, which is why correlation tags exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayEvent {
    OrderAcknowledged { order_id: String, tag: String },
    TradeConfirmed(TradeFill),
}
