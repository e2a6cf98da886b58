//! Lifecycle coordinator for one bracket strategy instance.
//!
//! Owns the two bracket groups, the correlation index, and the performance
//! tracker. All event handlers funnel through one `tokio::sync::Mutex`, so
//! mutations are serialized per instance and the completion reset is atomic
//! with respect to in-flight handlers.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use strategy_core::{
    InstrumentKind, MarketSnapshot, OrderGateway, OrderKind, OrderLeg, OrderRequest, OrderRole,
    OrderSide, Result, RiskParameters, StrategyConfig, StrategyError, TradeFill,
};

use crate::bracket::BracketGroup;
use crate::correlation::CorrelationIndex;
use crate::performance::{MetricsSnapshot, PerformanceTracker};
use crate::sizer::{size_bracket, BracketPlan};

/// Emitted once when every group has settled and the order state was reset.
/// The sole externally observable completion signal.
#[derive(Debug, Clone)]
pub struct CompletionEvent {
    pub completed_at: DateTime<Utc>,
    pub metrics: MetricsSnapshot,
}

/// Mutable state guarded by the instance lock.
struct LifecycleState {
    active: bool,
    completed: bool,
    plan: Option<BracketPlan>,
    groups: Vec<BracketGroup>,
    correlation: CorrelationIndex,
    performance: PerformanceTracker,
    /// Monotonic across activations so tags never collide between cycles.
    tag_seq: u64,
}

impl LifecycleState {
    fn new() -> Self {
        Self {
            active: false,
            completed: false,
            plan: None,
            groups: idle_groups(),
            correlation: CorrelationIndex::new(),
            performance: PerformanceTracker::new(),
            tag_seq: 0,
        }
    }

    fn group_mut(&mut self, instrument: InstrumentKind) -> Option<&mut BracketGroup> {
        self.groups
            .iter_mut()
            .find(|g| g.instrument() == instrument)
    }

    fn next_tag(&mut self, role: OrderRole) -> String {
        self.tag_seq += 1;
        format!("bracket-{role}-{}-{}", Uuid::new_v4().simple(), self.tag_seq)
    }
}

fn idle_groups() -> Vec<BracketGroup> {
    InstrumentKind::ALL.iter().map(|&i| BracketGroup::idle(i)).collect()
}

/// One single-shot bracket strategy instance.
pub struct BracketStrategy {
    gateway: Arc<dyn OrderGateway>,
    config: StrategyConfig,
    state: Mutex<LifecycleState>,
    completion_tx: mpsc::Sender<CompletionEvent>,
    /// Receiver for completion events (taken once).
    completion_rx: Option<mpsc::Receiver<CompletionEvent>>,
}

impl BracketStrategy {
    pub fn new(gateway: Arc<dyn OrderGateway>, config: StrategyConfig) -> Self {
        let (completion_tx, completion_rx) = mpsc::channel(16);
        Self {
            gateway,
            config,
            state: Mutex::new(LifecycleState::new()),
            completion_tx,
            completion_rx: Some(completion_rx),
        }
    }

    /// Take the completion receiver (can only be called once).
    pub fn take_completion_receiver(&mut self) -> Option<mpsc::Receiver<CompletionEvent>> {
        self.completion_rx.take()
    }

    /// Activate the strategy: size the bracket and submit entry, take-profit,
    /// and stop-loss orders for each instrument with a non-zero quantity.
    ///
    /// Rejects re-activation while a cycle is live. A submission rejection
    /// abandons that instrument's group but the other still runs to
    /// completion.
    pub async fn activate(&self, params: RiskParameters) -> Result<BracketPlan> {
        params.validate()?;

        let mut state = self.state.lock().await;
        if state.active {
            return Err(StrategyError::AlreadyActive);
        }

        let snapshot = self.read_snapshot(&params).await?;
        let plan = size_bracket(&params, &snapshot, self.config.micro_per_primary)?;
        info!(
            entry = %plan.entry_price,
            stop = %plan.stop_price,
            target = %plan.target_price,
            primary_qty = plan.primary_qty,
            micro_qty = plan.micro_qty,
            "Activating bracket strategy"
        );

        state.active = true;
        state.completed = false;
        state.plan = Some(plan.clone());
        state.groups.clear();

        for &instrument in InstrumentKind::ALL.iter() {
            let quantity = plan.quantity(instrument);
            let group = self
                .open_group(&mut state, instrument, quantity, &plan)
                .await;
            state.groups.push(group);
        }

        // Both groups rejected at submission leaves nothing to wait for.
        self.finalize_if_complete(&mut state);

        Ok(plan)
    }

    /// Handle an asynchronous order acknowledgement from the gateway stream.
    ///
    /// Tags that resolve to no known role are ignored: unrelated orders may
    /// share the event stream. An acknowledgement that resolves an exit order
    /// whose opposing leg already filled carries the owed cancellation out,
    /// and can therefore be the event that completes the lifecycle.
    pub async fn on_order_acknowledged(&self, order_id: &str, tag: &str) {
        let mut state = self.state.lock().await;

        let Some(role) = state.correlation.resolve_tag(tag) else {
            warn!(order_id = %order_id, tag = %tag, "Unresolvable acknowledgement tag; ignoring");
            return;
        };
        state.correlation.bind_order(order_id, role);

        if role.leg.is_exit() {
            let mut deferred = None;
            if let Some(group) = state.group_mut(role.instrument) {
                deferred = group.on_exit_acknowledged(role.leg, order_id);
                if group.state() == crate::bracket::GroupState::Armed {
                    info!(instrument = %role.instrument, "Bracket armed; both exits resolved");
                }
            }
            if let Some(intent) = deferred {
                info!(
                    instrument = %role.instrument,
                    leg = ?intent.leg,
                    order_id = %intent.order_id,
                    "Late exit resolution; issuing owed cancellation"
                );
                if let Err(e) = self.gateway.cancel_order(&intent.order_id).await {
                    debug!(order_id = %intent.order_id, error = %e, "Cancellation rejected");
                }
                self.finalize_if_complete(&mut state);
            }
        } else {
            debug!(order_id = %order_id, instrument = %role.instrument, "Entry order acknowledged");
        }
    }

    /// Handle a confirmed trade fill from the gateway stream.
    ///
    /// Exit-leg fills advance the owning group, trigger the one-cancels-other
    /// cancellation of the opposing leg, and feed the performance tracker.
    /// Entry fills are logged only; the bracket arms without waiting for them.
    pub async fn on_trade_confirmed(&self, fill: &TradeFill) {
        let mut state = self.state.lock().await;

        let Some(role) = state.correlation.role_for_order(&fill.order_id) else {
            warn!(order_id = %fill.order_id, "Trade for unknown order; ignoring");
            return;
        };

        if role.leg == OrderLeg::Entry {
            debug!(
                order_id = %fill.order_id,
                instrument = %role.instrument,
                quantity = fill.quantity,
                "Entry fill observed"
            );
            return;
        }

        let intent = state
            .group_mut(role.instrument)
            .and_then(|group| group.on_fill(role.leg, fill.quantity));

        if let Some(intent) = intent {
            info!(
                instrument = %role.instrument,
                filled_leg = ?role.leg,
                cancelling = ?intent.leg,
                order_id = %intent.order_id,
                "Exit fill received; cancelling opposing leg"
            );
            // Fire-and-forget: the order may already be gone on the broker
            // side, which is not an error.
            if let Err(e) = self.gateway.cancel_order(&intent.order_id).await {
                debug!(order_id = %intent.order_id, error = %e, "Cancellation rejected");
            }
        }

        state.performance.record(fill);
        self.finalize_if_complete(&mut state);
    }

    /// Whether the last activation ran to completion.
    pub async fn is_complete(&self) -> bool {
        self.state.lock().await.completed
    }

    /// Whether a cycle is currently live.
    pub async fn is_active(&self) -> bool {
        self.state.lock().await.active
    }

    /// Current metrics snapshot.
    pub async fn metrics(&self) -> MetricsSnapshot {
        self.state.lock().await.performance.snapshot()
    }

    async fn read_snapshot(&self, params: &RiskParameters) -> Result<MarketSnapshot> {
        let price = self
            .gateway
            .last_price(InstrumentKind::Primary)
            .await
            .map_err(StrategyError::gateway)?;
        let volatility = self
            .gateway
            .atr(params.atr_period)
            .await
            .map_err(StrategyError::gateway)?;
        let tick_size = self
            .gateway
            .tick_size(InstrumentKind::Primary)
            .await
            .map_err(StrategyError::gateway)?;
        let tick_cost = self
            .gateway
            .tick_cost(InstrumentKind::Primary, price)
            .await
            .map_err(StrategyError::gateway)?;

        Ok(MarketSnapshot {
            price,
            volatility,
            tick_size,
            tick_cost,
        })
    }

    /// Build one instrument's group and submit its three orders.
    async fn open_group(
        &self,
        state: &mut LifecycleState,
        instrument: InstrumentKind,
        quantity: u64,
        plan: &BracketPlan,
    ) -> BracketGroup {
        let entry_tag = state.next_tag(OrderRole::new(instrument, OrderLeg::Entry));
        let tp_tag = state.next_tag(OrderRole::new(instrument, OrderLeg::TakeProfit));
        let sl_tag = state.next_tag(OrderRole::new(instrument, OrderLeg::StopLoss));

        let mut group = BracketGroup::plan(instrument, quantity, tp_tag.clone(), sl_tag.clone());
        if quantity == 0 {
            info!(instrument = %instrument, "Zero planned quantity; skipping instrument");
            return group;
        }

        // Register before submitting so acknowledgements racing the
        // submission call still resolve.
        state
            .correlation
            .register(entry_tag.as_str(), OrderRole::new(instrument, OrderLeg::Entry));
        state
            .correlation
            .register(tp_tag.as_str(), OrderRole::new(instrument, OrderLeg::TakeProfit));
        state
            .correlation
            .register(sl_tag.as_str(), OrderRole::new(instrument, OrderLeg::StopLoss));

        let requests = [
            OrderRequest {
                instrument,
                account: self.config.account.clone(),
                side: OrderSide::Buy,
                quantity,
                kind: OrderKind::Market,
                tag: entry_tag,
            },
            OrderRequest {
                instrument,
                account: self.config.account.clone(),
                side: OrderSide::Sell,
                quantity,
                kind: OrderKind::Limit {
                    price: plan.target_price,
                },
                tag: tp_tag,
            },
            OrderRequest {
                instrument,
                account: self.config.account.clone(),
                side: OrderSide::Sell,
                quantity,
                kind: OrderKind::Stop {
                    trigger_price: plan.stop_price,
                },
                tag: sl_tag,
            },
        ];

        for request in requests {
            let tag = request.tag.clone();
            match self.gateway.submit_order(request).await {
                Ok(ack) if ack.is_success() => {
                    debug!(
                        instrument = %instrument,
                        tag = %tag,
                        order_id = ack.order_id.as_deref().unwrap_or("<pending>"),
                        "Order submission accepted"
                    );
                }
                Ok(ack) => {
                    error!(
                        instrument = %instrument,
                        tag = %tag,
                        message = ack.message.as_deref().unwrap_or("unspecified"),
                        "Order submission rejected"
                    );
                    group.abandon();
                    return group;
                }
                Err(e) => {
                    error!(instrument = %instrument, tag = %tag, error = %e, "Order submission failed");
                    group.abandon();
                    return group;
                }
            }
        }

        group.mark_submitted();
        group
    }

    /// If every group has settled, reset the order state and signal
    /// completion. Runs under the instance lock, so no handler can observe a
    /// partially-reset state.
    fn finalize_if_complete(&self, state: &mut LifecycleState) {
        if !state.active || !state.groups.iter().all(|g| g.is_settled()) {
            return;
        }

        let metrics = state.performance.snapshot();
        state.active = false;
        state.completed = true;
        state.plan = None;
        state.correlation.clear();
        state.groups = idle_groups();
        info!(
            trades = metrics.total_trades,
            gross_pnl = %metrics.gross_pnl,
            max_drawdown = %metrics.max_drawdown,
            "Strategy complete; order state reset"
        );

        let event = CompletionEvent {
            completed_at: Utc::now(),
            metrics,
        };
        // Never block under the instance lock: a host that fell behind (or
        // never took the receiver) loses the event rather than wedging every
        // handler on this instance.
        if let Err(e) = self.completion_tx.try_send(event) {
            warn!(error = %e, "Completion event not delivered");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use strategy_core::{PaperGateway, SubmitAck};

    fn snapshot() -> MarketSnapshot {
        // value_per_contract = 16 / 1 * 7.8125 = 125 -> raw quantity 1.6.
        MarketSnapshot {
            price: Decimal::new(5000, 0),
            volatility: Decimal::new(10, 0),
            tick_size: Decimal::ONE,
            tick_cost: Decimal::new(78125, 4),
        }
    }

    fn strategy_with(gateway: Arc<PaperGateway>) -> BracketStrategy {
        BracketStrategy::new(gateway, StrategyConfig::default())
    }

    async fn ack_all_exits(strategy: &BracketStrategy, gateway: &PaperGateway) {
        for (request, order_id) in gateway.submissions() {
            strategy.on_order_acknowledged(&order_id, &request.tag).await;
        }
    }

    fn exit_order_id(gateway: &PaperGateway, instrument: InstrumentKind, leg: OrderLeg) -> String {
        gateway
            .submissions()
            .into_iter()
            .find(|(req, _)| {
                req.instrument == instrument
                    && match leg {
                        OrderLeg::TakeProfit => matches!(req.kind, OrderKind::Limit { .. }),
                        OrderLeg::StopLoss => matches!(req.kind, OrderKind::Stop { .. }),
                        OrderLeg::Entry => matches!(req.kind, OrderKind::Market),
                    }
            })
            .map(|(_, id)| id)
            .expect("order submitted")
    }

    fn fill(order_id: &str, quantity: u64, pnl: i64) -> TradeFill {
        TradeFill::new(
            order_id,
            quantity,
            Decimal::new(pnl, 0),
            Decimal::new(pnl - 2, 0),
            Decimal::new(2, 0),
        )
    }

    #[tokio::test]
    async fn test_activation_submits_three_orders_per_instrument() {
        let gateway = Arc::new(PaperGateway::new(snapshot()));
        let strategy = strategy_with(gateway.clone());

        let plan = strategy.activate(RiskParameters::default()).await.unwrap();
        assert_eq!(plan.primary_qty, 1);
        assert_eq!(plan.micro_qty, 6);

        let submissions = gateway.submissions();
        assert_eq!(submissions.len(), 6);
        assert!(strategy.is_active().await);
        assert!(!strategy.is_complete().await);
    }

    #[tokio::test]
    async fn test_reactivation_while_active_is_rejected() {
        let gateway = Arc::new(PaperGateway::new(snapshot()));
        let strategy = strategy_with(gateway);

        strategy.activate(RiskParameters::default()).await.unwrap();
        let err = strategy.activate(RiskParameters::default()).await.unwrap_err();
        assert!(matches!(err, StrategyError::AlreadyActive));
    }

    #[tokio::test]
    async fn test_full_lifecycle_with_oco_cancellation() {
        let gateway = Arc::new(PaperGateway::new(snapshot()));
        let mut strategy = strategy_with(gateway.clone());
        let mut completion_rx = strategy.take_completion_receiver().unwrap();

        strategy.activate(RiskParameters::default()).await.unwrap();
        ack_all_exits(&strategy, &gateway).await;

        // Take-profit fills on the primary -> its stop must be cancelled.
        let tp_primary = exit_order_id(&gateway, InstrumentKind::Primary, OrderLeg::TakeProfit);
        let sl_primary = exit_order_id(&gateway, InstrumentKind::Primary, OrderLeg::StopLoss);
        strategy.on_trade_confirmed(&fill(&tp_primary, 1, 50)).await;
        assert_eq!(gateway.cancellations(), vec![sl_primary]);
        assert!(!strategy.is_complete().await);

        // Stop-loss fills on the micro -> its take-profit must be cancelled.
        let sl_micro = exit_order_id(&gateway, InstrumentKind::Micro, OrderLeg::StopLoss);
        let tp_micro = exit_order_id(&gateway, InstrumentKind::Micro, OrderLeg::TakeProfit);
        strategy.on_trade_confirmed(&fill(&sl_micro, 6, -20)).await;
        assert!(gateway.cancellations().contains(&tp_micro));

        assert!(strategy.is_complete().await);
        assert!(!strategy.is_active().await);

        let event = completion_rx.recv().await.unwrap();
        assert_eq!(event.metrics.total_trades, 2);
        assert_eq!(event.metrics.gross_pnl, Decimal::new(30, 0));
        assert_eq!(event.metrics.winning_trades, 1);
    }

    #[tokio::test]
    async fn test_partial_fills_accumulate_without_duplicate_cancels() {
        let mut snap = snapshot();
        // raw quantity 3.2 -> 3 primary + 2 micro.
        snap.tick_cost = Decimal::new(390625, 5);
        let gateway = Arc::new(PaperGateway::new(snap));
        let strategy = strategy_with(gateway.clone());

        let plan = strategy.activate(RiskParameters::default()).await.unwrap();
        assert_eq!(plan.primary_qty, 3);
        ack_all_exits(&strategy, &gateway).await;

        let tp_primary = exit_order_id(&gateway, InstrumentKind::Primary, OrderLeg::TakeProfit);
        strategy.on_trade_confirmed(&fill(&tp_primary, 1, 10)).await;
        strategy.on_trade_confirmed(&fill(&tp_primary, 1, 10)).await;
        strategy.on_trade_confirmed(&fill(&tp_primary, 1, 10)).await;

        // One cancellation for the primary stop, despite three fills.
        let sl_primary = exit_order_id(&gateway, InstrumentKind::Primary, OrderLeg::StopLoss);
        let cancels: Vec<_> = gateway
            .cancellations()
            .into_iter()
            .filter(|id| *id == sl_primary)
            .collect();
        assert_eq!(cancels.len(), 1);
        assert!(!strategy.is_complete().await);
    }

    #[tokio::test]
    async fn test_unknown_events_are_ignored() {
        let gateway = Arc::new(PaperGateway::new(snapshot()));
        let strategy = strategy_with(gateway.clone());
        strategy.activate(RiskParameters::default()).await.unwrap();

        strategy
            .on_order_acknowledged("stray-1", "someone-elses-tag")
            .await;
        strategy.on_trade_confirmed(&fill("stray-1", 5, 999)).await;

        assert_eq!(strategy.metrics().await.total_trades, 0);
        assert!(gateway.cancellations().is_empty());
    }

    #[tokio::test]
    async fn test_submission_failure_abandons_only_that_group() {
        let gateway = Arc::new(PaperGateway::new(snapshot()));
        gateway.fail_submissions_for(InstrumentKind::Primary);
        let strategy = strategy_with(gateway.clone());

        strategy.activate(RiskParameters::default()).await.unwrap();

        // Only the micro group's three orders went out.
        let submissions = gateway.submissions();
        assert_eq!(submissions.len(), 3);
        assert!(submissions
            .iter()
            .all(|(req, _)| req.instrument == InstrumentKind::Micro));

        // Completion is tracked across the armed group only.
        ack_all_exits(&strategy, &gateway).await;
        let tp_micro = exit_order_id(&gateway, InstrumentKind::Micro, OrderLeg::TakeProfit);
        strategy.on_trade_confirmed(&fill(&tp_micro, 6, 30)).await;
        assert!(strategy.is_complete().await);
    }

    #[tokio::test]
    async fn test_all_groups_rejected_completes_with_no_trades() {
        let gateway = Arc::new(PaperGateway::new(snapshot()));
        gateway.fail_submissions_for(InstrumentKind::Primary);
        gateway.fail_submissions_for(InstrumentKind::Micro);
        let mut strategy = strategy_with(gateway);
        let mut completion_rx = strategy.take_completion_receiver().unwrap();

        strategy.activate(RiskParameters::default()).await.unwrap();

        assert!(strategy.is_complete().await);
        let event = completion_rx.recv().await.unwrap();
        assert_eq!(event.metrics.total_trades, 0);
    }

    #[tokio::test]
    async fn test_reset_allows_fresh_reactivation_with_new_tags() {
        let gateway = Arc::new(PaperGateway::new(snapshot()));
        let strategy = strategy_with(gateway.clone());

        strategy.activate(RiskParameters::default()).await.unwrap();
        ack_all_exits(&strategy, &gateway).await;
        let tp_primary = exit_order_id(&gateway, InstrumentKind::Primary, OrderLeg::TakeProfit);
        let tp_micro = exit_order_id(&gateway, InstrumentKind::Micro, OrderLeg::TakeProfit);
        strategy.on_trade_confirmed(&fill(&tp_primary, 1, 50)).await;
        strategy.on_trade_confirmed(&fill(&tp_micro, 6, 30)).await;
        assert!(strategy.is_complete().await);

        let first_cycle_tags: Vec<String> = gateway
            .submissions()
            .into_iter()
            .map(|(req, _)| req.tag)
            .collect();

        // Second activation starts clean and generates fresh tags.
        strategy.activate(RiskParameters::default()).await.unwrap();
        assert!(strategy.is_active().await);
        let submissions = gateway.submissions();
        assert_eq!(submissions.len(), 12);
        for (req, _) in &submissions[6..] {
            assert!(!first_cycle_tags.contains(&req.tag));
        }

        // Metrics survive the lifecycle reset.
        assert_eq!(strategy.metrics().await.total_trades, 2);
    }

    #[tokio::test]
    async fn test_invalid_parameters_do_not_activate() {
        let gateway = Arc::new(PaperGateway::new(snapshot()));
        let strategy = strategy_with(gateway.clone());

        let mut params = RiskParameters::default();
        params.risk_budget = Decimal::ZERO;
        assert!(matches!(
            strategy.activate(params).await,
            Err(StrategyError::InvalidParameters(_))
        ));
        assert!(!strategy.is_active().await);
        assert!(gateway.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_deferred_until_opposing_ack_arrives() {
        let gateway = Arc::new(PaperGateway::new(snapshot()));
        let mut strategy = strategy_with(gateway.clone());
        let mut completion_rx = strategy.take_completion_receiver().unwrap();

        strategy.activate(RiskParameters::default()).await.unwrap();

        // Acknowledge everything except the stop legs.
        for (request, order_id) in gateway.submissions() {
            if !matches!(request.kind, OrderKind::Stop { .. }) {
                strategy.on_order_acknowledged(&order_id, &request.tag).await;
            }
        }

        // Both take-profits fill fully while the stops are still unresolved.
        let tp_primary = exit_order_id(&gateway, InstrumentKind::Primary, OrderLeg::TakeProfit);
        let tp_micro = exit_order_id(&gateway, InstrumentKind::Micro, OrderLeg::TakeProfit);
        strategy.on_trade_confirmed(&fill(&tp_primary, 1, 50)).await;
        strategy.on_trade_confirmed(&fill(&tp_micro, 6, 30)).await;

        // The stops are live orders at the broker; the cycle must stay open
        // until they resolve and their owed cancellations go out.
        assert!(gateway.cancellations().is_empty());
        assert!(!strategy.is_complete().await);

        for (request, order_id) in gateway.submissions() {
            if matches!(request.kind, OrderKind::Stop { .. }) {
                strategy.on_order_acknowledged(&order_id, &request.tag).await;
            }
        }

        let sl_primary = exit_order_id(&gateway, InstrumentKind::Primary, OrderLeg::StopLoss);
        let sl_micro = exit_order_id(&gateway, InstrumentKind::Micro, OrderLeg::StopLoss);
        let cancels = gateway.cancellations();
        assert!(cancels.contains(&sl_primary));
        assert!(cancels.contains(&sl_micro));

        assert!(strategy.is_complete().await);
        assert_eq!(completion_rx.recv().await.unwrap().metrics.total_trades, 2);
    }

    #[tokio::test]
    async fn test_completion_without_receiver_never_blocks() {
        let gateway = Arc::new(PaperGateway::new(snapshot()));
        // Receiver deliberately never taken; the completion channel fills up.
        let strategy = strategy_with(gateway.clone());

        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            for cycle in 0..20 {
                strategy.activate(RiskParameters::default()).await.unwrap();
                ack_all_exits(&strategy, &gateway).await;

                let submissions = gateway.submissions();
                for (request, order_id) in &submissions[submissions.len() - 6..] {
                    if matches!(request.kind, OrderKind::Limit { .. }) {
                        strategy
                            .on_trade_confirmed(&fill(order_id, request.quantity, 10))
                            .await;
                    }
                }
                assert!(strategy.is_complete().await, "cycle {cycle} did not close");
            }
        })
        .await
        .expect("completion path blocked with an undrained channel");
    }

    /// Gateway transport errors during submission abandon the group, using a
    /// mocked gateway for the error path the paper gateway cannot produce.
    #[tokio::test]
    async fn test_transport_error_abandons_group() {
        mockall::mock! {
            Gateway {}

            #[async_trait::async_trait]
            impl OrderGateway for Gateway {
                async fn submit_order(&self, request: OrderRequest) -> anyhow::Result<SubmitAck>;
                async fn cancel_order(&self, order_id: &str) -> anyhow::Result<()>;
                async fn last_price(&self, instrument: InstrumentKind) -> anyhow::Result<Decimal>;
                async fn atr(&self, period: u32) -> anyhow::Result<Decimal>;
                async fn tick_size(&self, instrument: InstrumentKind) -> anyhow::Result<Decimal>;
                async fn tick_cost(&self, instrument: InstrumentKind, price: Decimal) -> anyhow::Result<Decimal>;
            }
        }

        let mut mock = MockGateway::new();
        mock.expect_last_price()
            .returning(|_| Ok(Decimal::new(5000, 0)));
        mock.expect_atr().returning(|_| Ok(Decimal::new(10, 0)));
        mock.expect_tick_size().returning(|_| Ok(Decimal::ONE));
        mock.expect_tick_cost()
            .returning(|_, _| Ok(Decimal::new(78125, 4)));
        mock.expect_submit_order()
            .returning(|_| Err(anyhow::anyhow!("connection reset")));

        let mut strategy = BracketStrategy::new(Arc::new(mock), StrategyConfig::default());
        let mut completion_rx = strategy.take_completion_receiver().unwrap();

        strategy.activate(RiskParameters::default()).await.unwrap();
        // Both groups abandoned on the first transport error each.
        assert!(strategy.is_complete().await);
        assert_eq!(completion_rx.recv().await.unwrap().metrics.total_trades, 0);
    }
}
