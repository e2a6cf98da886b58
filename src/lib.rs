//! Bracket-Bot: bracketed entry/exit strategy runner
//!
//! This is the root crate that provides benchmark and integration-test access
//! to the internal modules. For actual functionality, use the individual
//! crates directly:
//!
//! - `strategy-core`: domain types, configuration, the order-gateway seam
//! - `bracket-engine`: position sizing, bracket state machines, lifecycle
//!   coordination, performance accounting

// Re-export for benchmarks and integration tests
pub use bracket_engine as engine;
pub use strategy_core as core;
