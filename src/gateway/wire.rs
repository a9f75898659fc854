// 9.0.2: response shapes as the contracts return them. amounts are Uint128
// strings in micro-units, prices are decimal strings. everything is validated
// on the way into a snapshot.

use crate::snapshot::{Bid, BidList, CollateralTable, LoanBalance, PriceTable, SnapshotError};
use crate::types::{Amount, BidIndex, PremiumSlot};
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct PricesResponse {
    pub prices: Vec<PriceEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PriceEntry {
    pub asset: String,
    pub price: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CollateralsResponse {
    // [[asset, micro_amount], ...]
    pub collaterals: Vec<(String, String)>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BorrowerInfoResponse {
    pub loan_amount: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BidsResponse {
    pub bids: Vec<BidEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BidEntry {
    pub idx: IntField,
    pub premium_slot: IntField,
    pub amount: String,
    pub pending_liquidated_collateral: String,
}

// Uint128 fields arrive as strings, u8 fields as numbers. accept both.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum IntField {
    Number(u64),
    Text(String),
}

impl IntField {
    fn parse(&self, field: &'static str) -> Result<u64, SnapshotError> {
        match self {
            IntField::Number(n) => Ok(*n),
            IntField::Text(s) => s.trim().parse().map_err(|_| SnapshotError::Malformed {
                field,
                value: s.clone(),
            }),
        }
    }
}

pub(crate) fn parse_micro(field: &'static str, raw: &str) -> Result<Decimal, SnapshotError> {
    let micro: u128 = raw.trim().parse().map_err(|_| SnapshotError::Malformed {
        field,
        value: raw.to_string(),
    })?;
    Amount::from_micro(micro)
        .map(|amount| amount.value())
        .ok_or(SnapshotError::Overflow { field })
}

pub(crate) fn parse_decimal(field: &'static str, raw: &str) -> Result<Decimal, SnapshotError> {
    Decimal::from_str_exact(raw.trim()).map_err(|_| SnapshotError::Malformed {
        field,
        value: raw.to_string(),
    })
}

impl PricesResponse {
    pub fn into_table(self) -> Result<PriceTable, SnapshotError> {
        let entries = self
            .prices
            .into_iter()
            .map(|entry| -> Result<_, SnapshotError> {
                Ok((entry.asset, parse_decimal("price", &entry.price)?))
            })
            .collect::<Result<Vec<_>, SnapshotError>>()?;
        PriceTable::from_entries(entries)
    }
}

impl CollateralsResponse {
    pub fn into_table(self) -> Result<CollateralTable, SnapshotError> {
        let entries = self
            .collaterals
            .into_iter()
            .map(|(asset, amount)| -> Result<_, SnapshotError> {
                Ok((asset, parse_micro("collateral", &amount)?))
            })
            .collect::<Result<Vec<_>, SnapshotError>>()?;
        CollateralTable::from_entries(entries)
    }
}

impl BorrowerInfoResponse {
    pub fn into_balance(self) -> Result<LoanBalance, SnapshotError> {
        LoanBalance::new(parse_micro("loan", &self.loan_amount)?)
    }
}

impl BidsResponse {
    pub fn into_list(self) -> Result<BidList, SnapshotError> {
        let bids = self
            .bids
            .into_iter()
            .map(BidEntry::into_bid)
            .collect::<Result<Vec<_>, SnapshotError>>()?;
        BidList::new(bids)
    }
}

impl BidEntry {
    fn into_bid(self) -> Result<Bid, SnapshotError> {
        let slot = self.premium_slot.parse("premium slot")?;
        let slot = u32::try_from(slot).map_err(|_| SnapshotError::Overflow {
            field: "premium slot",
        })?;

        Bid::new(
            BidIndex(self.idx.parse("bid index")?),
            PremiumSlot(slot),
            parse_micro("bid amount", &self.amount)?,
            parse_micro("liquidated amount", &self.pending_liquidated_collateral)?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn prices_parse_exactly() {
        let response: PricesResponse = serde_json::from_value(json!({
            "prices": [
                { "asset": "terra1bluna", "price": "87.123456789012345678", "last_updated_base": 1 },
                { "asset": "terra1beth", "price": "3500" }
            ]
        }))
        .unwrap();

        let table = response.into_table().unwrap();
        assert_eq!(
            table.get("terra1bluna").unwrap().value(),
            dec!(87.123456789012345678)
        );
        assert_eq!(table.get("terra1beth").unwrap().value(), dec!(3500));
    }

    #[test]
    fn collaterals_rescale_micro_units() {
        let response: CollateralsResponse = serde_json::from_value(json!({
            "borrower": "terra1me",
            "collaterals": [["terra1bluna", "1500000"], ["terra1beth", "250000"]]
        }))
        .unwrap();

        let table = response.into_table().unwrap();
        assert_eq!(table.get("terra1bluna").unwrap().value(), dec!(1.5));
        assert_eq!(table.get("terra1beth").unwrap().value(), dec!(0.25));
    }

    #[test]
    fn negative_micro_amount_is_malformed() {
        let response = BorrowerInfoResponse {
            loan_amount: "-100".to_string(),
        };
        assert!(matches!(
            response.into_balance(),
            Err(SnapshotError::Malformed { field: "loan", .. })
        ));
    }

    #[test]
    fn bids_accept_string_and_number_ints() {
        let response: BidsResponse = serde_json::from_value(json!({
            "bids": [
                { "idx": "12", "premium_slot": 4, "amount": "100000000", "pending_liquidated_collateral": "0" },
                { "idx": 3, "premium_slot": "1", "amount": "5000000", "pending_liquidated_collateral": "2000000" }
            ]
        }))
        .unwrap();

        let list = response.into_list().unwrap();
        let first = &list.as_slice()[0];
        assert_eq!(first.index, BidIndex(3));
        assert_eq!(first.premium_slot, PremiumSlot(1));
        assert_eq!(first.liquidated_amount.value(), dec!(2));
        assert_eq!(list.as_slice()[1].amount.value(), dec!(100));
    }

    #[test]
    fn malformed_bid_index() {
        let response: BidsResponse = serde_json::from_value(json!({
            "bids": [
                { "idx": "twelve", "premium_slot": 4, "amount": "1", "pending_liquidated_collateral": "0" }
            ]
        }))
        .unwrap();

        assert!(matches!(
            response.into_list(),
            Err(SnapshotError::Malformed { field: "bid index", .. })
        ));
    }
}
