//! Per-instrument bracket state machine.
//!
//! One [`BracketGroup`] owns the entry + take-profit + stop-loss orders for a
//! single instrument: it aggregates fills per exit leg and decides when the
//! opposing leg must be cancelled (one-cancels-other). The group performs no
//! I/O itself; transitions return a [`CancelIntent`] and the coordinator
//! issues the actual gateway call.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use strategy_core::{InstrumentKind, OrderLeg};

/// Lifecycle of one instrument's bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupState {
    /// No orders submitted.
    Idle,
    /// All three submission requests issued; order identities unknown.
    AwaitingAck,
    /// Both exit orders acknowledged and resolved.
    Armed,
    /// One exit leg has fills but the group is not fully closed.
    PartiallyClosed,
    /// Aggregate exit fills cover the planned quantity.
    Closed,
}

/// One exit order of the bracket (take-profit or stop-loss).
#[derive(Debug, Clone, Default)]
pub struct ExitLeg {
    /// Correlation tag attached at submission.
    pub tag: String,
    /// Broker-assigned id, unknown until acknowledged.
    pub order_id: Option<String>,
    /// Quantity confirmed filled on this leg.
    pub filled: u64,
    /// Whether a cancellation has already been requested for this leg.
    pub cancel_requested: bool,
}

/// Instruction to cancel the opposing exit order of a bracket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelIntent {
    pub order_id: String,
    pub leg: OrderLeg,
}

/// State for one instrument's entry + exit orders.
#[derive(Debug, Clone)]
pub struct BracketGroup {
    instrument: InstrumentKind,
    planned_qty: u64,
    state: GroupState,
    take_profit: ExitLeg,
    stop_loss: ExitLeg,
    /// Sizer produced zero quantity; the group never submits anything.
    skipped: bool,
    /// A submission was rejected; the group is excluded from completion.
    abandoned: bool,
}

impl BracketGroup {
    /// An empty placeholder group, used before activation and after reset.
    pub fn idle(instrument: InstrumentKind) -> Self {
        Self {
            instrument,
            planned_qty: 0,
            state: GroupState::Idle,
            take_profit: ExitLeg::default(),
            stop_loss: ExitLeg::default(),
            skipped: false,
            abandoned: false,
        }
    }

    /// A planned group carrying its exit-leg correlation tags.
    ///
    /// A zero planned quantity skips the instrument entirely: the group is
    /// immediately `Closed` and submits nothing.
    pub fn plan(instrument: InstrumentKind, planned_qty: u64, tp_tag: String, sl_tag: String) -> Self {
        let skipped = planned_qty == 0;
        Self {
            instrument,
            planned_qty,
            state: if skipped { GroupState::Closed } else { GroupState::Idle },
            take_profit: ExitLeg {
                tag: tp_tag,
                ..ExitLeg::default()
            },
            stop_loss: ExitLeg {
                tag: sl_tag,
                ..ExitLeg::default()
            },
            skipped,
            abandoned: false,
        }
    }

    pub fn instrument(&self) -> InstrumentKind {
        self.instrument
    }

    pub fn state(&self) -> GroupState {
        self.state
    }

    pub fn planned_qty(&self) -> u64 {
        self.planned_qty
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped
    }

    pub fn is_abandoned(&self) -> bool {
        self.abandoned
    }

    pub fn filled_total(&self) -> u64 {
        self.take_profit.filled + self.stop_loss.filled
    }

    pub fn exit_leg(&self, leg: OrderLeg) -> Option<&ExitLeg> {
        match leg {
            OrderLeg::TakeProfit => Some(&self.take_profit),
            OrderLeg::StopLoss => Some(&self.stop_loss),
            OrderLeg::Entry => None,
        }
    }

    fn exit_leg_mut(&mut self, leg: OrderLeg) -> Option<&mut ExitLeg> {
        match leg {
            OrderLeg::TakeProfit => Some(&mut self.take_profit),
            OrderLeg::StopLoss => Some(&mut self.stop_loss),
            OrderLeg::Entry => None,
        }
    }

    /// All three submission requests were accepted by the gateway.
    pub fn mark_submitted(&mut self) {
        if self.state == GroupState::Idle {
            self.state = GroupState::AwaitingAck;
        }
    }

    /// A submission was rejected; the group never arms and drops out of the
    /// completion predicate.
    pub fn abandon(&mut self) {
        self.abandoned = true;
        warn!(
            instrument = %self.instrument,
            planned_qty = self.planned_qty,
            "Abandoning bracket group after submission failure"
        );
    }

    /// An exit order's identity arrived on the acknowledgement stream.
    ///
    /// The first acknowledgement per leg wins; repeats are ignored. Once both
    /// exit legs are resolved the group arms.
    ///
    /// Returns a deferred [`CancelIntent`] when the opposing leg already
    /// filled before this order was resolved: the cancellation was owed but
    /// could not be issued until the order id became known.
    pub fn on_exit_acknowledged(&mut self, leg: OrderLeg, order_id: &str) -> Option<CancelIntent> {
        let instrument = self.instrument;
        let exit = self.exit_leg_mut(leg)?;
        let mut deferred = None;
        if exit.order_id.is_none() {
            exit.order_id = Some(order_id.to_string());
            if exit.cancel_requested {
                deferred = Some(CancelIntent {
                    order_id: order_id.to_string(),
                    leg,
                });
            }
            debug!(
                instrument = %instrument,
                leg = ?leg,
                order_id = %order_id,
                "Exit order resolved"
            );
        }

        if self.state == GroupState::AwaitingAck
            && self.take_profit.order_id.is_some()
            && self.stop_loss.order_id.is_some()
        {
            self.state = GroupState::Armed;
        }

        deferred
    }

    /// A confirmed fill on one exit leg.
    ///
    /// Returns the cancellation to issue against the opposing leg, if one is
    /// due. Exactly one cancellation is emitted per opposing leg: the first
    /// closing fill requests it and later fills on the same leg do not
    /// re-issue it.
    pub fn on_fill(&mut self, leg: OrderLeg, quantity: u64) -> Option<CancelIntent> {
        if self.state == GroupState::Idle || self.abandoned {
            return None;
        }
        let opposing = leg.opposing_exit()?;

        let remaining = self.planned_qty.saturating_sub(self.filled_total());
        let credited = quantity.min(remaining);
        if credited < quantity {
            warn!(
                instrument = %self.instrument,
                leg = ?leg,
                reported = quantity,
                credited,
                "Fill exceeds remaining planned quantity; clamping"
            );
        }
        if let Some(exit) = self.exit_leg_mut(leg) {
            exit.filled += credited;
        }

        let intent = {
            let other = self.exit_leg_mut(opposing)?;
            if other.cancel_requested {
                None
            } else {
                other.cancel_requested = true;
                match &other.order_id {
                    Some(order_id) => Some(CancelIntent {
                        order_id: order_id.clone(),
                        leg: opposing,
                    }),
                    // Opposing order not acknowledged yet; the cancellation
                    // is owed and fires when the acknowledgement binds it.
                    None => None,
                }
            }
        };

        self.state = if self.filled_total() >= self.planned_qty {
            GroupState::Closed
        } else {
            GroupState::PartiallyClosed
        };

        intent
    }

    /// Whether the group is fully closed.
    pub fn is_closed(&self) -> bool {
        self.state == GroupState::Closed
    }

    /// Whether a cancellation is owed to an exit order whose identity is not
    /// yet known. The order is still live at the broker until it resolves.
    pub fn has_deferred_cancel(&self) -> bool {
        [&self.take_profit, &self.stop_loss]
            .iter()
            .any(|leg| leg.cancel_requested && leg.order_id.is_none())
    }

    /// Whether the group no longer holds anything live: closed, skipped, or
    /// abandoned before arming. A closed group with a cancellation still owed
    /// is not settled; its opposing exit order remains live.
    pub fn is_settled(&self) -> bool {
        self.abandoned || (self.state == GroupState::Closed && !self.has_deferred_cancel())
    }
}
