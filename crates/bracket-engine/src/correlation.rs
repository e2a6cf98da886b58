//! Correlation index mapping opaque broker identifiers back to order roles.
//!
//! Submission acknowledgements and order/trade events arrive asynchronously
//! and unordered, so orders carry a caller-generated tag. The index is
//! populated at submission time (tag -> role), consulted when an
//! acknowledgement binds the broker's order id to the role, and consulted
//! again when trade confirmations arrive carrying only the order id.

use dashmap::DashMap;

use strategy_core::OrderRole;

#[derive(Debug, Default)]
pub struct CorrelationIndex {
    by_tag: DashMap<String, OrderRole>,
    by_order_id: DashMap<String, OrderRole>,
}

impl CorrelationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a tag at submission time.
    pub fn register(&self, tag: impl Into<String>, role: OrderRole) {
        self.by_tag.insert(tag.into(), role);
    }

    /// Resolve an acknowledgement tag to its role, if it is one of ours.
    pub fn resolve_tag(&self, tag: &str) -> Option<OrderRole> {
        self.by_tag.get(tag).map(|entry| *entry.value())
    }

    /// Bind a broker-assigned order id to a role at acknowledgement time.
    pub fn bind_order(&self, order_id: impl Into<String>, role: OrderRole) {
        self.by_order_id.insert(order_id.into(), role);
    }

    /// Resolve a trade confirmation's order id to its role.
    pub fn role_for_order(&self, order_id: &str) -> Option<OrderRole> {
        self.by_order_id.get(order_id).map(|entry| *entry.value())
    }

    /// Drop all entries (lifecycle reset).
    pub fn clear(&self) {
        self.by_tag.clear();
        self.by_order_id.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty() && self.by_order_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strategy_core::{InstrumentKind, OrderLeg};

    #[test]
    fn test_tag_then_order_id_resolution() {
        let index = CorrelationIndex::new();
        let role = OrderRole::new(InstrumentKind::Primary, OrderLeg::TakeProfit);

        index.register("tag-1", role);
        assert_eq!(index.resolve_tag("tag-1"), Some(role));
        assert_eq!(index.resolve_tag("someone-elses-tag"), None);

        index.bind_order("ord-42", role);
        assert_eq!(index.role_for_order("ord-42"), Some(role));
        assert_eq!(index.role_for_order("ord-43"), None);
    }

    #[test]
    fn test_clear_empties_both_maps() {
        let index = CorrelationIndex::new();
        let role = OrderRole::new(InstrumentKind::Micro, OrderLeg::StopLoss);
        index.register("tag-1", role);
        index.bind_order("ord-1", role);
        assert!(!index.is_empty());

        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.resolve_tag("tag-1"), None);
        assert_eq!(index.role_for_order("ord-1"), None);
    }
}
