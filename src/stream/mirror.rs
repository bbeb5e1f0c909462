//! Local copy of one pair's orderbook

use crate::order::{Address, Order, Side};

/// Bid and ask sequences for one (base, quote) pair, in received order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderbookMirror {
    bids: Vec<Order>,
    asks: Vec<Order>,
}

impl OrderbookMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace both sides with a snapshot
    pub fn replace(&mut self, bids: Vec<Order>, asks: Vec<Order>) {
        self.bids = bids;
        self.asks = asks;
    }

    /// Classify `order` against `base_token` and merge it into that side.
    /// An existing entry with the same hash is replaced, otherwise the order
    /// is appended. Returns the side it landed on.
    pub fn apply_update(&mut self, order: Order, base_token: &Address) -> Side {
        let side = Side::classify(&order, base_token);
        let book = match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        };
        match book.iter_mut().find(|o| o.hash() == order.hash()) {
            Some(existing) => *existing = order,
            None => book.push(order),
        }
        side
    }

    pub fn bids(&self) -> &[Order] {
        &self.bids
    }

    pub fn asks(&self) -> &[Order] {
        &self.asks
    }

    pub fn side(&self, side: Side) -> &[Order] {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    /// Total number of orders on both sides
    pub fn len(&self) -> usize {
        self.bids.len() + self.asks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Look an order up by hash on either side
    pub fn find(&self, hash: &[u8; 32]) -> Option<(Side, &Order)> {
        if let Some(o) = self.bids.iter().find(|o| o.hash() == hash) {
            return Some((Side::Bid, o));
        }
        self.asks
            .iter()
            .find(|o| o.hash() == hash)
            .map(|o| (Side::Ask, o))
    }

    /// Owned copy of the current book
    pub fn snapshot(&self) -> OrderbookMirror {
        self.clone()
    }

    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
    }
}
