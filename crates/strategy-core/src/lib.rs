//! Strategy Core
//!
//! Shared domain types, errors, configuration, and the order-gateway seam
//! used by the bracket strategy engine.

pub mod config;
pub mod error;
pub mod gateway;
pub mod types;

pub use config::{RiskParameters, StrategyConfig};
pub use error::{Result, StrategyError};
pub use gateway::{OrderGateway, PaperGateway};
pub use types::{
    GatewayEvent, InstrumentKind, MarketSnapshot, OrderKind, OrderLeg, OrderRequest, OrderRole,
    OrderSide, SubmitAck, SubmitStatus, TradeFill,
};
