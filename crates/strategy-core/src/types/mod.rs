//! Shared domain types for the bracket strategy.

pub mod instrument;
pub mod market;
pub mod order;

pub use instrument::{InstrumentKind, OrderLeg, OrderRole};
pub use market::MarketSnapshot;
pub use order::{
    GatewayEvent, OrderKind, OrderRequest, OrderSide, SubmitAck, SubmitStatus, TradeFill,
};
