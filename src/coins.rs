//! Token amounts and multi-denomination coin sets.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A token amount in a single denomination.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coin {
    /// Denomination.
    pub denom: String,
    /// Amount in base units.
    pub amount: u64,
}

impl Coin {
    /// Construct a coin.
    pub fn new(denom: impl Into<String>, amount: u64) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    /// True for a strictly positive amount.
    pub fn is_positive(&self) -> bool {
        self.amount > 0
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// A set of coins sorted by denomination, with no zero amounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coins(Vec<Coin>);

impl Coins {
    /// The empty set.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Build a normalized set: duplicates are merged, zero amounts dropped.
    ///
    /// Amounts saturate at `u64::MAX` when merged.
    pub fn new(coins: impl IntoIterator<Item = Coin>) -> Self {
        let mut merged: BTreeMap<String, u64> = BTreeMap::new();
        for coin in coins {
            let entry = merged.entry(coin.denom).or_insert(0);
            *entry = entry.saturating_add(coin.amount);
        }
        Self(
            merged
                .into_iter()
                .filter(|(_, amount)| *amount > 0)
                .map(|(denom, amount)| Coin { denom, amount })
                .collect(),
        )
    }

    /// True when no denomination holds a positive amount.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of denominations held.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Coins in denomination order.
    pub fn as_slice(&self) -> &[Coin] {
        &self.0
    }

    /// Amount held in `denom`, zero when absent.
    pub fn amount_of(&self, denom: &str) -> u64 {
        self.0
            .iter()
            .find(|coin| coin.denom == denom)
            .map_or(0, |coin| coin.amount)
    }

    /// Add coins, saturating per denomination.
    pub fn add(&self, other: &Coins) -> Coins {
        Coins::new(self.0.iter().chain(other.0.iter()).cloned())
    }

    /// Subtract `other`, returning `None` if any denomination would go negative.
    pub fn safe_sub(&self, other: &Coins) -> Option<Coins> {
        let mut remaining: BTreeMap<&str, u64> = self
            .0
            .iter()
            .map(|coin| (coin.denom.as_str(), coin.amount))
            .collect();
        for coin in &other.0 {
            let held = remaining.entry(coin.denom.as_str()).or_insert(0);
            *held = held.checked_sub(coin.amount)?;
        }
        Some(Coins::new(
            remaining
                .into_iter()
                .map(|(denom, amount)| Coin::new(denom, amount)),
        ))
    }

    /// True when every denomination in `other` is covered by `self`.
    pub fn covers(&self, other: &Coins) -> bool {
        self.safe_sub(other).is_some()
    }
}

impl From<Coin> for Coins {
    fn from(coin: Coin) -> Self {
        Coins::new([coin])
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_merges_and_drops_zero() {
        let coins = Coins::new([
            Coin::new("stake", 5),
            Coin::new("atom", 0),
            Coin::new("stake", 7),
            Coin::new("atom", 1),
        ]);
        assert_eq!(
            coins.as_slice(),
            &[Coin::new("atom", 1), Coin::new("stake", 12)]
        );
        assert_eq!(coins.amount_of("stake"), 12);
        assert_eq!(coins.amount_of("missing"), 0);
    }

    #[test]
    fn safe_sub_detects_negative_components() {
        let held = Coins::new([Coin::new("stake", 10), Coin::new("fee", 3)]);
        let rest = held.safe_sub(&Coin::new("stake", 10).into()).unwrap();
        assert_eq!(rest, Coins::from(Coin::new("fee", 3)));
        assert!(held.safe_sub(&Coin::new("stake", 11).into()).is_none());
        assert!(held.safe_sub(&Coin::new("other", 1).into()).is_none());
        assert!(held.covers(&Coins::empty()));
    }
}
