/// Merge engine for one contract's market fields
///
/// Every event overwrites only the fields it carries. Nothing is ever unset,
/// and events for other contracts are ignored. There are no sequence numbers
/// on the feed, so the last event applied wins even if it is older.

use tracing::trace;

use crate::models::{
    ContractState, MarketMsg, OrderbookDeltaMsg, OrderbookSnapshotMsg, StreamEvent, TickerMsg,
    TradeMsg,
};

#[derive(Debug, Clone)]
pub struct StateStore {
    contract_id: String,
    state: ContractState,
}

/// Overwrite `slot` only when the event carries a value
#[inline]
fn set<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

impl StateStore {
    /// `contract_id` is expected to be upper-cased already
    pub fn new(contract_id: impl Into<String>) -> Self {
        Self {
            contract_id: contract_id.into(),
            state: ContractState::default(),
        }
    }

    pub fn contract_id(&self) -> &str {
        &self.contract_id
    }

    pub fn state(&self) -> &ContractState {
        &self.state
    }

    /// Replace the view with a REST snapshot (startup only)
    pub fn seed(&mut self, snapshot: ContractState) {
        self.state = snapshot;
    }

    /// Apply one stream event. Returns true if any field changed.
    pub fn apply(&mut self, event: &StreamEvent) -> bool {
        if event.contract_id() != Some(self.contract_id.as_str()) {
            return false;
        }

        let before = self.state.clone();
        match event {
            StreamEvent::Ticker(m) => self.apply_ticker(m),
            StreamEvent::OrderbookDelta(m) => self.apply_orderbook_delta(m),
            StreamEvent::OrderbookSnapshot(m) => self.apply_orderbook_snapshot(m),
            StreamEvent::Trade(m) => self.apply_trade(m),
            StreamEvent::Market(m) => self.apply_market(m),
            StreamEvent::Other(_) => {}
        }

        let changed = self.state != before;
        trace!(contract = %self.contract_id, changed, "Applied event");
        changed
    }

    fn apply_ticker(&mut self, m: &TickerMsg) {
        let s = &mut self.state;
        set(&mut s.yes_bid, m.yes_bid);
        set(&mut s.yes_ask, m.yes_ask);
        set(&mut s.no_bid, m.no_bid);
        set(&mut s.no_ask, m.no_ask);
        set(&mut s.last_price, m.last_price);
        set(&mut s.volume, m.volume);
        set(&mut s.open_interest, m.open_interest);
    }

    // Bids only; asks are not derived from the book here
    fn apply_orderbook_delta(&mut self, m: &OrderbookDeltaMsg) {
        if m.price.is_none() {
            return;
        }
        match m.side.as_deref() {
            Some("yes") => set(&mut self.state.yes_bid, m.price),
            Some("no") => set(&mut self.state.no_bid, m.price),
            _ => {}
        }
    }

    // First listed level per side
    fn apply_orderbook_snapshot(&mut self, m: &OrderbookSnapshotMsg) {
        set(&mut self.state.yes_bid, first_level_price(&m.yes));
        set(&mut self.state.no_bid, first_level_price(&m.no));
    }

    fn apply_trade(&mut self, m: &TradeMsg) {
        set(&mut self.state.last_price, m.yes_price);
        set(&mut self.state.volume, m.volume);
    }

    fn apply_market(&mut self, m: &MarketMsg) {
        let s = &mut self.state;
        set(&mut s.title, m.title.clone());
        set(&mut s.status, m.status.clone());
        set(&mut s.yes_bid, m.yes_bid);
        set(&mut s.yes_ask, m.yes_ask);
        set(&mut s.volume, m.volume);
        set(&mut s.open_interest, m.open_interest);
    }
}

fn first_level_price(levels: &[Vec<i64>]) -> Option<i64> {
    levels.first().and_then(|level| level.first()).copied()
}
