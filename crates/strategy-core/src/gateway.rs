//! The order-gateway seam and a paper implementation for tests.

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::{debug, info};

use crate::types::{InstrumentKind, MarketSnapshot, OrderRequest, SubmitAck};

/// Transport to the broker/platform.
///
/// Submission calls are fire-and-forget requests: a [`SubmitAck`] confirms
/// acceptance only, and fills arrive later on the asynchronous event stream.
/// Implementations must treat `cancel_order` as idempotent: cancelling an
/// order that already filled or was already cancelled is not an error.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Submit an order. Returns the gateway's synchronous acknowledgement.
    async fn submit_order(&self, request: OrderRequest) -> Result<SubmitAck>;

    /// Request cancellation of a live order. Fire-and-forget.
    async fn cancel_order(&self, order_id: &str) -> Result<()>;

    /// Last traded price of an instrument.
    async fn last_price(&self, instrument: InstrumentKind) -> Result<Decimal>;

    /// Current volatility reading over the given lookback.
    async fn atr(&self, period: u32) -> Result<Decimal>;

    /// Minimum price increment of an instrument.
    async fn tick_size(&self, instrument: InstrumentKind) -> Result<Decimal>;

    /// Monetary value of one tick at the given price.
    async fn tick_cost(&self, instrument: InstrumentKind, price: Decimal) -> Result<Decimal>;
}

/// In-memory gateway for paper trading and tests.
///
/// Accepts every submission (unless an instrument is wired to fail), assigns
/// sequential order ids, and records submissions and cancellation requests
/// for later inspection. It never emits events on its own; tests drive the
/// acknowledgement/fill stream explicitly.
pub struct PaperGateway {
    snapshot: MarketSnapshot,
    next_order_id: AtomicU64,
    submissions: Mutex<Vec<(OrderRequest, String)>>,
    cancellations: Mutex<Vec<String>>,
    /// Instruments whose submissions are rejected, for failure-path tests.
    failing: Mutex<Vec<InstrumentKind>>,
}

impl PaperGateway {
    pub fn new(snapshot: MarketSnapshot) -> Self {
        Self {
            snapshot,
            next_order_id: AtomicU64::new(1),
            submissions: Mutex::new(Vec::new()),
            cancellations: Mutex::new(Vec::new()),
            failing: Mutex::new(Vec::new()),
        }
    }

    /// Reject all further submissions for the given instrument.
    pub fn fail_submissions_for(&self, instrument: InstrumentKind) {
        self.failing.lock().unwrap().push(instrument);
    }

    /// All accepted submissions with their assigned order ids.
    pub fn submissions(&self) -> Vec<(OrderRequest, String)> {
        self.submissions.lock().unwrap().clone()
    }

    /// All order ids a cancellation was requested for.
    pub fn cancellations(&self) -> Vec<String> {
        self.cancellations.lock().unwrap().clone()
    }

    /// Look up the assigned order id for a correlation tag.
    pub fn order_id_for_tag(&self, tag: &str) -> Option<String> {
        self.submissions
            .lock()
            .unwrap()
            .iter()
            .find(|(req, _)| req.tag == tag)
            .map(|(_, id)| id.clone())
    }
}

#[async_trait]
impl OrderGateway for PaperGateway {
    async fn submit_order(&self, request: OrderRequest) -> Result<SubmitAck> {
        if self.failing.lock().unwrap().contains(&request.instrument) {
            info!(
                instrument = %request.instrument,
                tag = %request.tag,
                "[PAPER] Rejecting order submission"
            );
            return Ok(SubmitAck::failure("simulated rejection"));
        }

        let order_id = format!("paper-{}", self.next_order_id.fetch_add(1, Ordering::SeqCst));
        debug!(
            instrument = %request.instrument,
            side = ?request.side,
            quantity = request.quantity,
            tag = %request.tag,
            order_id = %order_id,
            "[PAPER] Accepted order submission"
        );
        self.submissions
            .lock()
            .unwrap()
            .push((request, order_id.clone()));
        Ok(SubmitAck::success(order_id))
    }

    async fn cancel_order(&self, order_id: &str) -> Result<()> {
        debug!(order_id = %order_id, "[PAPER] Cancellation requested");
        self.cancellations.lock().unwrap().push(order_id.to_string());
        Ok(())
    }

    async fn last_price(&self, _instrument: InstrumentKind) -> Result<Decimal> {
        Ok(self.snapshot.price)
    }

    async fn atr(&self, _period: u32) -> Result<Decimal> {
        Ok(self.snapshot.volatility)
    }

    async fn tick_size(&self, _instrument: InstrumentKind) -> Result<Decimal> {
        Ok(self.snapshot.tick_size)
    }

    async fn tick_cost(&self, _instrument: InstrumentKind, _price: Decimal) -> Result<Decimal> {
        Ok(self.snapshot.tick_cost)
    }
}
