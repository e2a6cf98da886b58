//! Bracket Engine
//!
//! The bracket-order lifecycle state machine and incremental performance
//! accounting: position sizing, per-instrument bracket groups with
//! one-cancels-other exits, order correlation, and the lifecycle coordinator.

pub mod bracket;
pub mod coordinator;
pub mod correlation;
pub mod performance;
pub mod runner;
pub mod sizer;

pub use bracket::{BracketGroup, CancelIntent, ExitLeg, GroupState};
pub use coordinator::{BracketStrategy, CompletionEvent};
pub use correlation::CorrelationIndex;
pub use performance::{MetricsSnapshot, PerformanceTracker};
pub use runner::{spawn_event_loop, SubscriptionHandle};
pub use sizer::{size_bracket, BracketPlan};
