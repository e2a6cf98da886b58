//! Instrument and order-role identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which of the two traded contracts an order belongs to.
///
/// The strategy splits a fractional target size across a full-size contract
/// and its micro-sized sibling (e.g. ES and MES), so every order carries one
/// of these two identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentKind {
    /// The coarse-granularity contract.
    Primary,
    /// The fine-granularity contract used for the fractional remainder.
    Micro,
}

impl InstrumentKind {
    /// Both instruments, in submission order.
    pub const ALL: [InstrumentKind; 2] = [InstrumentKind::Primary, InstrumentKind::Micro];
}

impl fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstrumentKind::Primary => write!(f, "primary"),
            InstrumentKind::Micro => write!(f, "micro"),
        }
    }
}

/// Which leg of a bracket an order implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderLeg {
    /// The market order that opens the position.
    Entry,
    /// The limit order that closes at the profit target.
    TakeProfit,
    /// The stop order that closes at the protective stop.
    StopLoss,
}

impl OrderLeg {
    /// The exit leg on the other side of the bracket, if this is an exit leg.
    pub fn opposing_exit(&self) -> Option<OrderLeg> {
        match self {
            OrderLeg::TakeProfit => Some(OrderLeg::StopLoss),
            OrderLeg::StopLoss => Some(OrderLeg::TakeProfit),
            OrderLeg::Entry => None,
        }
    }

    /// Whether this leg closes the position.
    pub fn is_exit(&self) -> bool {
        !matches!(self, OrderLeg::Entry)
    }
}

/// Semantic role of an order: which instrument's bracket and which leg.
///
/// Used as the correlation-tag payload so that asynchronous acknowledgements
/// and trade confirmations can be mapped back to the order that caused them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderRole {
    pub instrument: InstrumentKind,
    pub leg: OrderLeg,
}

impl OrderRole {
    pub fn new(instrument: InstrumentKind, leg: OrderLeg) -> Self {
        Self { instrument, leg }
    }
}

impl fmt::Display for OrderRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let leg = match self.leg {
            OrderLeg::Entry => "entry",
            OrderLeg::TakeProfit => "tp",
            OrderLeg::StopLoss => "sl",
        };
        write!(f, "{leg}-{}", self.instrument)
    }
}
