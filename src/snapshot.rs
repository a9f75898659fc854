//! Validated input snapshots.
//!
//! One snapshot per ledger query: prices, collateral balances, loan balance and
//! the bidder's liquidation bids. Each snapshot is immutable once built and is
//! replaced wholesale on refresh. Construction is the only place raw values are
//! checked, so everything downstream can assume non-negative, de-duplicated data.

use crate::types::{Amount, AssetId, BidIndex, PremiumSlot, Price};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("negative {field}: {value}")]
    NegativeValue { field: &'static str, value: Decimal },

    #[error("malformed {field}: {value:?}")]
    Malformed { field: &'static str, value: String },

    #[error("duplicate asset {0} in snapshot")]
    DuplicateAsset(AssetId),

    #[error("duplicate bid index {0:?}")]
    DuplicateBidIndex(BidIndex),

    #[error("{field} exceeds the representable range")]
    Overflow { field: &'static str },
}

fn non_negative(field: &'static str, value: Decimal) -> Result<Amount, SnapshotError> {
    Amount::new(value).ok_or(SnapshotError::NegativeValue { field, value })
}

/// Oracle prices keyed by asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PriceTable {
    prices: BTreeMap<AssetId, Price>,
}

impl PriceTable {
    pub fn from_entries<I, A>(entries: I) -> Result<Self, SnapshotError>
    where
        I: IntoIterator<Item = (A, Decimal)>,
        A: Into<AssetId>,
    {
        let mut prices = BTreeMap::new();
        for (asset, value) in entries {
            let asset = asset.into();
            let price = Price::new(value).ok_or(SnapshotError::NegativeValue {
                field: "price",
                value,
            })?;
            if prices.contains_key(&asset) {
                return Err(SnapshotError::DuplicateAsset(asset));
            }
            prices.insert(asset, price);
        }
        Ok(Self { prices })
    }

    pub fn get(&self, asset: &str) -> Option<Price> {
        self.prices.get(asset).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AssetId, &Price)> {
        self.prices.iter()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// Collateral locked with the overseer, already scaled out of micro-units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CollateralTable {
    balances: BTreeMap<AssetId, Amount>,
}

impl CollateralTable {
    pub fn from_entries<I, A>(entries: I) -> Result<Self, SnapshotError>
    where
        I: IntoIterator<Item = (A, Decimal)>,
        A: Into<AssetId>,
    {
        let mut balances = BTreeMap::new();
        for (asset, value) in entries {
            let asset = asset.into();
            let quantity = non_negative("collateral", value)?;
            if balances.contains_key(&asset) {
                return Err(SnapshotError::DuplicateAsset(asset));
            }
            balances.insert(asset, quantity);
        }
        Ok(Self { balances })
    }

    pub fn get(&self, asset: &str) -> Option<Amount> {
        self.balances.get(asset).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AssetId, &Amount)> {
        self.balances.iter()
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

/// Outstanding debt on the money market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LoanBalance(Amount);

impl LoanBalance {
    pub fn new(value: Decimal) -> Result<Self, SnapshotError> {
        non_negative("loan", value).map(Self)
    }

    pub fn amount(&self) -> Amount {
        self.0
    }
}

/// A standing liquidation bid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bid {
    pub index: BidIndex,
    pub premium_slot: PremiumSlot,
    /// Capital not yet spent on liquidations.
    pub amount: Amount,
    /// Collateral won by this bid and waiting to be claimed.
    pub liquidated_amount: Amount,
}

impl Bid {
    pub fn new(
        index: BidIndex,
        premium_slot: PremiumSlot,
        amount: Decimal,
        liquidated_amount: Decimal,
    ) -> Result<Self, SnapshotError> {
        Ok(Self {
            index,
            premium_slot,
            amount: non_negative("bid amount", amount)?,
            liquidated_amount: non_negative("liquidated amount", liquidated_amount)?,
        })
    }
}

/// The bidder's bids for one collateral token, ordered by (premium slot, index).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BidList {
    bids: Vec<Bid>,
}

impl BidList {
    pub fn new(mut bids: Vec<Bid>) -> Result<Self, SnapshotError> {
        let mut seen = HashSet::with_capacity(bids.len());
        for bid in &bids {
            if !seen.insert(bid.index) {
                return Err(SnapshotError::DuplicateBidIndex(bid.index));
            }
        }

        // indices are unique so this key is total
        bids.sort_by_key(|bid| (bid.premium_slot, bid.index));
        Ok(Self { bids })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bid> {
        self.bids.iter()
    }

    pub fn as_slice(&self) -> &[Bid] {
        &self.bids
    }

    pub fn len(&self) -> usize {
        self.bids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty()
    }

    /// Sum of unspent bid capital. `None` on overflow.
    pub fn total_amount(&self) -> Option<Amount> {
        self.bids
            .iter()
            .try_fold(Amount::zero(), |acc, bid| acc.checked_add(bid.amount))
    }

    /// Sum of collateral pending claim. `None` on overflow.
    pub fn total_liquidated(&self) -> Option<Amount> {
        self.bids
            .iter()
            .try_fold(Amount::zero(), |acc, bid| acc.checked_add(bid.liquidated_amount))
    }
}

impl<'a> IntoIterator for &'a BidList {
    type Item = &'a Bid;
    type IntoIter = std::slice::Iter<'a, Bid>;

    fn into_iter(self) -> Self::IntoIter {
        self.bids.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bid(index: u64, slot: u32, amount: Decimal) -> Bid {
        Bid::new(BidIndex(index), PremiumSlot(slot), amount, Decimal::ZERO).unwrap()
    }

    #[test]
    fn price_table_rejects_negative_price() {
        let result = PriceTable::from_entries([("uluna", dec!(-1))]);
        assert!(matches!(
            result,
            Err(SnapshotError::NegativeValue { field: "price", .. })
        ));
    }

    #[test]
    fn price_table_rejects_duplicate_asset() {
        let result = PriceTable::from_entries([("uluna", dec!(1)), ("uluna", dec!(2))]);
        assert_eq!(
            result,
            Err(SnapshotError::DuplicateAsset(AssetId::from("uluna")))
        );
    }

    #[test]
    fn collateral_lookup_by_str() {
        let table = CollateralTable::from_entries([("bluna", dec!(10)), ("beth", dec!(0.5))]).unwrap();
        assert_eq!(table.get("beth").unwrap().value(), dec!(0.5));
        assert!(table.get("uusd").is_none());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn loan_balance_rejects_negative() {
        assert!(LoanBalance::new(dec!(-5)).is_err());
        assert_eq!(LoanBalance::new(dec!(5)).unwrap().amount().value(), dec!(5));
    }

    #[test]
    fn bid_list_sorted_by_slot_then_index() {
        let list = BidList::new(vec![
            bid(7, 3, dec!(10)),
            bid(2, 1, dec!(10)),
            bid(5, 3, dec!(10)),
            bid(9, 0, dec!(10)),
        ])
        .unwrap();

        let order: Vec<u64> = list.iter().map(|b| b.index.0).collect();
        assert_eq!(order, vec![9, 2, 5, 7]);
    }

    #[test]
    fn bid_list_rejects_duplicate_index() {
        let result = BidList::new(vec![bid(1, 1, dec!(10)), bid(1, 2, dec!(20))]);
        assert_eq!(result, Err(SnapshotError::DuplicateBidIndex(BidIndex(1))));
    }

    #[test]
    fn bid_rejects_negative_liquidated_amount() {
        let result = Bid::new(BidIndex(1), PremiumSlot(1), dec!(10), dec!(-1));
        assert!(matches!(
            result,
            Err(SnapshotError::NegativeValue { field: "liquidated amount", .. })
        ));
    }

    #[test]
    fn bid_totals() {
        let list = BidList::new(vec![
            Bid::new(BidIndex(1), PremiumSlot(2), dec!(100), dec!(10)).unwrap(),
            Bid::new(BidIndex(2), PremiumSlot(4), dec!(50), dec!(0)).unwrap(),
        ])
        .unwrap();

        assert_eq!(list.total_amount().unwrap().value(), dec!(150));
        assert_eq!(list.total_liquidated().unwrap().value(), dec!(10));
    }
}
