//! Position risk calculator.
//!
//! Turns whatever snapshots are currently loaded into the metrics the monitor
//! reports: collateral value, bid aggregates, LTV and emergency LTV. Pure and
//! deterministic. A missing input, a missing price or a zero collateral value
//! never fails the computation; the affected metrics come back as
//! [`Metric::Unknown`] carrying the reason.

use crate::snapshot::{BidList, CollateralTable, LoanBalance, PriceTable};
use crate::types::{Amount, AssetId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four independently refreshed inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Prices,
    Collaterals,
    Loan,
    Bids,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InputKind::Prices => "prices",
            InputKind::Collaterals => "collaterals",
            InputKind::Loan => "loan",
            InputKind::Bids => "bids",
        };
        f.write_str(name)
    }
}

/// Why a metric could not be computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UnknownReason {
    /// The snapshot has not been loaded (or the wallet is disconnected).
    MissingInput { input: InputKind },
    /// Collateral is held in an asset the oracle did not price.
    MissingPrice { asset: AssetId },
    /// A ratio over a collateral value of exactly zero.
    ZeroCollateralValue,
    Overflow,
}

impl fmt::Display for UnknownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnknownReason::MissingInput { input } => write!(f, "{input} not loaded"),
            UnknownReason::MissingPrice { asset } => write!(f, "no price for {asset}"),
            UnknownReason::ZeroCollateralValue => f.write_str("collateral value is zero"),
            UnknownReason::Overflow => f.write_str("arithmetic overflow"),
        }
    }
}

/// A derived value, or an explicit marker saying why there isn't one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Known(Decimal),
    Unknown(UnknownReason),
}

impl Metric {
    pub fn missing(input: InputKind) -> Self {
        Metric::Unknown(UnknownReason::MissingInput { input })
    }

    pub fn known(&self) -> Option<Decimal> {
        match self {
            Metric::Known(value) => Some(*value),
            Metric::Unknown(_) => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Metric::Known(_))
    }

    pub fn reason(&self) -> Option<&UnknownReason> {
        match self {
            Metric::Known(_) => None,
            Metric::Unknown(reason) => Some(reason),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Known(value) => match f.precision() {
                Some(precision) => write!(f, "{value:.precision$}"),
                None => write!(f, "{value}"),
            },
            Metric::Unknown(reason) => write!(f, "unknown ({reason})"),
        }
    }
}

/// Which inputs were present when the metrics were computed. Keeps "no bids"
/// apart from "bids not loaded yet", since both give a bid total of zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputAvailability {
    pub prices: bool,
    pub collaterals: bool,
    pub loan: bool,
    pub bids: bool,
}

impl InputAvailability {
    pub fn is_complete(&self) -> bool {
        self.prices && self.collaterals && self.loan && self.bids
    }

    pub fn missing(&self) -> Vec<InputKind> {
        [
            (self.prices, InputKind::Prices),
            (self.collaterals, InputKind::Collaterals),
            (self.loan, InputKind::Loan),
            (self.bids, InputKind::Bids),
        ]
        .into_iter()
        .filter(|(present, _)| !present)
        .map(|(_, kind)| kind)
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    /// Σ quantity × price over held collateral.
    pub collateral_value: Metric,
    /// Unspent capital across all bids. Zero when bids are absent.
    pub total_bid_capital: Metric,
    /// Collateral won by bids and pending claim. Zero when bids are absent.
    pub total_liquidated_collateral: Metric,
    /// loan / collateral value × 100.
    pub loan_to_value: Metric,
    /// LTV after cancelling every bid and applying its capital to the loan.
    /// Negative when bid capital exceeds the loan, by the surplus.
    /// A stress figure only: on the ledger, cancelling a bid and repaying are
    /// separate transactions, so the position never passes through this state
    /// atomically.
    pub emergency_loan_to_value: Metric,
    pub inputs: InputAvailability,
}

/// Combine the currently loaded snapshots into the derived metrics.
///
/// When several inputs are missing, a ratio reports the first one in the order
/// prices, collaterals, loan.
pub fn compute_metrics(
    prices: Option<&PriceTable>,
    collaterals: Option<&CollateralTable>,
    loan: Option<&LoanBalance>,
    bids: Option<&BidList>,
) -> DerivedMetrics {
    let collateral_value = match (prices, collaterals) {
        (Some(prices), Some(collaterals)) => collateral_value(prices, collaterals),
        (None, _) => Metric::missing(InputKind::Prices),
        (_, None) => Metric::missing(InputKind::Collaterals),
    };

    let (total_bid_capital, total_liquidated_collateral) = bid_totals(bids);
    let loan_to_value = loan_to_value(loan, &collateral_value);
    let emergency_loan_to_value =
        emergency_loan_to_value(loan, &total_bid_capital, &collateral_value);

    DerivedMetrics {
        collateral_value,
        total_bid_capital,
        total_liquidated_collateral,
        loan_to_value,
        emergency_loan_to_value,
        inputs: InputAvailability {
            prices: prices.is_some(),
            collaterals: collaterals.is_some(),
            loan: loan.is_some(),
            bids: bids.is_some(),
        },
    }
}

/// Value of the held collateral at oracle prices.
///
/// A held asset without a price makes the whole value unknown rather than
/// counting it as zero, which would understate the LTV. Zero balances are
/// skipped and need no price.
pub fn collateral_value(prices: &PriceTable, collaterals: &CollateralTable) -> Metric {
    let mut total = Decimal::ZERO;

    for (asset, quantity) in collaterals.iter() {
        if quantity.is_zero() {
            continue;
        }

        let Some(price) = prices.get(asset.as_str()) else {
            return Metric::Unknown(UnknownReason::MissingPrice {
                asset: asset.clone(),
            });
        };

        match price
            .value_of(*quantity)
            .and_then(|value| total.checked_add(value))
        {
            Some(sum) => total = sum,
            None => return Metric::Unknown(UnknownReason::Overflow),
        }
    }

    Metric::Known(total)
}

/// (total bid capital, total liquidated collateral). Both zero without bids.
pub fn bid_totals(bids: Option<&BidList>) -> (Metric, Metric) {
    let Some(bids) = bids else {
        return (Metric::Known(Decimal::ZERO), Metric::Known(Decimal::ZERO));
    };

    let to_metric = |total: Option<Amount>| match total {
        Some(amount) => Metric::Known(amount.value()),
        None => Metric::Unknown(UnknownReason::Overflow),
    };

    (
        to_metric(bids.total_amount()),
        to_metric(bids.total_liquidated()),
    )
}

pub fn loan_to_value(loan: Option<&LoanBalance>, collateral_value: &Metric) -> Metric {
    let collateral = match collateral_value {
        Metric::Known(value) => *value,
        Metric::Unknown(reason) => return Metric::Unknown(reason.clone()),
    };
    let Some(loan) = loan else {
        return Metric::missing(InputKind::Loan);
    };

    percentage(loan.amount().value(), collateral)
}

/// (loan − bid capital) / collateral value × 100. Goes negative when the bids
/// hold more capital than is owed.
pub fn emergency_loan_to_value(
    loan: Option<&LoanBalance>,
    total_bid_capital: &Metric,
    collateral_value: &Metric,
) -> Metric {
    let collateral = match collateral_value {
        Metric::Known(value) => *value,
        Metric::Unknown(reason) => return Metric::Unknown(reason.clone()),
    };
    let Some(loan) = loan else {
        return Metric::missing(InputKind::Loan);
    };
    let bid_capital = match total_bid_capital {
        Metric::Known(value) => *value,
        Metric::Unknown(reason) => return Metric::Unknown(reason.clone()),
    };

    match loan.amount().value().checked_sub(bid_capital) {
        Some(remaining) => percentage(remaining, collateral),
        None => Metric::Unknown(UnknownReason::Overflow),
    }
}

fn percentage(numerator: Decimal, collateral: Decimal) -> Metric {
    if collateral.is_zero() {
        return Metric::Unknown(UnknownReason::ZeroCollateralValue);
    }

    numerator
        .checked_div(collateral)
        .and_then(|ratio| ratio.checked_mul(dec!(100)))
        .map(Metric::Known)
        .unwrap_or(Metric::Unknown(UnknownReason::Overflow))
}
