//! Token symbol registry
//!
//! Built once from configuration and passed by reference to whatever needs
//! display names. Nothing in the order or stream layers depends on it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::order::{Address, Order, Side};

/// One `symbol: address` entry as written in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEntry {
    pub symbol: String,
    pub address: Address,
}

/// Immutable symbol <-> address lookup
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    by_symbol: HashMap<String, Address>,
    by_address: HashMap<Address, String>,
}

impl TokenRegistry {
    /// Build the registry, rejecting blank symbols and duplicates
    pub fn new(entries: &[TokenEntry]) -> Result<Self, AppError> {
        let mut registry = Self::default();
        for entry in entries {
            let symbol = entry.symbol.trim();
            if symbol.is_empty() {
                return Err(AppError::Config(format!(
                    "token {} has an empty symbol",
                    entry.address
                )));
            }
            let key = symbol.to_ascii_uppercase();
            if registry.by_symbol.contains_key(&key) {
                return Err(AppError::Config(format!("duplicate token symbol '{}'", symbol)));
            }
            if registry.by_address.contains_key(&entry.address) {
                return Err(AppError::Config(format!(
                    "duplicate token address {}",
                    entry.address
                )));
            }
            registry.by_symbol.insert(key, entry.address);
            registry.by_address.insert(entry.address, symbol.to_string());
        }
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }

    /// Address for a symbol, case-insensitive
    pub fn address_of(&self, symbol: &str) -> Option<Address> {
        self.by_symbol
            .get(&symbol.trim().to_ascii_uppercase())
            .copied()
    }

    /// Symbol registered for an address
    pub fn symbol_of(&self, address: &Address) -> Option<&str> {
        self.by_address.get(address).map(String::as_str)
    }

    /// Accept either a hex address or a registered symbol
    pub fn resolve(&self, symbol_or_address: &str) -> Option<Address> {
        let value = symbol_or_address.trim();
        if value.starts_with("0x") || value.starts_with("0X") {
            return Address::parse(value).ok();
        }
        self.address_of(value)
    }

    /// Symbol if known, otherwise the hex address
    pub fn label(&self, address: &Address) -> String {
        match self.symbol_of(address) {
            Some(symbol) => symbol.to_string(),
            None => {
                tracing::debug!(address = %address, "Unknown token");
                address.to_hex()
            }
        }
    }

    /// `BASE/QUOTE` label for a pair
    pub fn pair_label(&self, base: &Address, quote: &Address) -> String {
        format!("{}/{}", self.label(base), self.label(quote))
    }

    /// One-line description such as `Ask: 100 ZRX -> 2 WETH`
    pub fn describe(&self, order: &Order, side: Side) -> String {
        let terms = order.terms();
        let side = match side {
            Side::Bid => "Bid",
            Side::Ask => "Ask",
        };
        format!(
            "{}: {} {} -> {} {}",
            side,
            terms.maker_amount,
            self.label(&terms.maker_token),
            terms.taker_amount,
            self.label(&terms.taker_token)
        )
    }
}
