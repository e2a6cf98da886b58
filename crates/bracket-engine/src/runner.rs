//! Event-loop plumbing between the gateway stream and the strategy handlers.
//!
//! The gateway delivers acknowledgements and trade confirmations on an mpsc
//! channel; a dedicated task drains it into the strategy, giving each
//! instance the single-writer ordering its handlers require. The returned
//! [`SubscriptionHandle`] owns the task and releases it deterministically,
//! instead of process-global event registration.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use strategy_core::GatewayEvent;

use crate::coordinator::BracketStrategy;

/// Handle to a running event loop. Dropping it (or calling [`shutdown`])
/// stops event delivery.
///
/// [`shutdown`]: SubscriptionHandle::shutdown
pub struct SubscriptionHandle {
    handle: JoinHandle<()>,
}

impl SubscriptionHandle {
    /// Stop the event loop.
    pub fn shutdown(&self) {
        self.handle.abort();
    }

    /// Whether the loop has exited (stream closed or shut down).
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawn the event-processing task for one strategy instance.
pub fn spawn_event_loop(
    strategy: Arc<BracketStrategy>,
    mut events: mpsc::Receiver<GatewayEvent>,
) -> SubscriptionHandle {
    let handle = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                GatewayEvent::OrderAcknowledged { order_id, tag } => {
                    strategy.on_order_acknowledged(&order_id, &tag).await;
                }
                GatewayEvent::TradeConfirmed(fill) => {
                    strategy.on_trade_confirmed(&fill).await;
                }
            }
        }
        debug!("Gateway event stream closed; event loop exiting");
    });

    SubscriptionHandle { handle }
}
