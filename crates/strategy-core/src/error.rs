//! Error types for the bracket strategy runner.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("invalid risk parameters: {0}")]
    InvalidParameters(String),

    #[error("strategy is already active")]
    AlreadyActive,

    #[error("degenerate market inputs: {0}")]
    DegenerateMarket(String),

    #[error("gateway error: {0}")]
    Gateway(String),
}

impl StrategyError {
    /// Wrap a gateway-side failure, flattening the error chain into a message.
    pub fn gateway(err: anyhow::Error) -> Self {
        Self::Gateway(format!("{err:#}"))
    }
}

pub type Result<T> = std::result::Result<T, StrategyError>;
