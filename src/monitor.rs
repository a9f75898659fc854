//! Position monitor.
//!
//! Holds the latest snapshot of each of the four inputs for the connected
//! wallet. Every input is refreshed on its own by an explicit call; a failed
//! refresh leaves the previous snapshot in place. Metrics are recomputed from
//! whatever is loaded each time they are asked for, so the monitor keeps no
//! derived state.

use crate::calculator::{compute_metrics, DerivedMetrics, InputKind, UnknownReason};
use crate::config::MonitorConfig;
use crate::gateway::{GatewayError, LedgerClient, LedgerGateway};
use crate::risk::{classify_risk, ltv_headroom, RiskLevel, RiskParams};
use crate::snapshot::{BidList, CollateralTable, LoanBalance, PriceTable};
use crate::types::{Identity, Timestamp};
use rust_decimal::Decimal;
use serde::Serialize;

/// A snapshot and when it was loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fetched<T> {
    pub value: T,
    pub refreshed_at: Timestamp,
}

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("no wallet connected")]
    NotConnected,

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Per-input outcome of [`PositionMonitor::refresh_all`].
#[derive(Debug)]
pub struct RefreshReport {
    pub outcomes: Vec<(InputKind, Result<(), MonitorError>)>,
}

impl RefreshReport {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|(_, outcome)| outcome.is_ok())
    }

    pub fn failed(&self) -> Vec<InputKind> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_err())
            .map(|(kind, _)| *kind)
            .collect()
    }
}

/// Everything a renderer needs in one serializable record: the connected
/// wallet, the loan, the bid queue in display order and the derived metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionReport {
    pub identity: Option<Identity>,
    pub loan: Option<Decimal>,
    pub bids: Option<BidList>,
    pub metrics: DerivedMetrics,
    pub risk: RiskLevel,
    /// Percentage points of LTV left before liquidation.
    pub ltv_headroom: Option<Decimal>,
}

pub struct PositionMonitor<C> {
    gateway: LedgerGateway<C>,
    collateral_token: String,
    risk: RiskParams,
    identity: Option<Identity>,
    prices: Option<Fetched<PriceTable>>,
    collaterals: Option<Fetched<CollateralTable>>,
    loan: Option<Fetched<LoanBalance>>,
    bids: Option<Fetched<BidList>>,
}

impl<C: LedgerClient> PositionMonitor<C> {
    pub fn new(client: C, config: MonitorConfig) -> Self {
        Self {
            gateway: LedgerGateway::new(client, config.contracts),
            collateral_token: config.collateral_token,
            risk: config.risk,
            identity: None,
            prices: None,
            collaterals: None,
            loan: None,
            bids: None,
        }
    }

    /// Switch to a wallet. Snapshots of the previous wallet are dropped.
    pub fn connect(&mut self, identity: Identity) {
        tracing::info!(identity = %identity, "wallet connected");
        self.clear_snapshots();
        self.identity = Some(identity);
    }

    pub fn disconnect(&mut self) {
        if let Some(identity) = self.identity.take() {
            tracing::info!(identity = %identity, "wallet disconnected");
        }
        self.clear_snapshots();
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn gateway(&self) -> &LedgerGateway<C> {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut LedgerGateway<C> {
        &mut self.gateway
    }

    pub fn prices(&self) -> Option<&Fetched<PriceTable>> {
        self.prices.as_ref()
    }

    pub fn collaterals(&self) -> Option<&Fetched<CollateralTable>> {
        self.collaterals.as_ref()
    }

    pub fn loan(&self) -> Option<&Fetched<LoanBalance>> {
        self.loan.as_ref()
    }

    pub fn bids(&self) -> Option<&Fetched<BidList>> {
        self.bids.as_ref()
    }

    // prices aren't per user, but a disconnected monitor shows nothing at all
    pub fn refresh_prices(&mut self) -> Result<(), MonitorError> {
        let gateway = &self.gateway;
        refresh_slot(
            &mut self.prices,
            InputKind::Prices,
            self.identity.as_ref(),
            |_| gateway.fetch_prices(),
        )
    }

    pub fn refresh_collaterals(&mut self) -> Result<(), MonitorError> {
        let gateway = &self.gateway;
        refresh_slot(
            &mut self.collaterals,
            InputKind::Collaterals,
            self.identity.as_ref(),
            |identity| gateway.fetch_collaterals(identity),
        )
    }

    pub fn refresh_loan(&mut self) -> Result<(), MonitorError> {
        let gateway = &self.gateway;
        refresh_slot(
            &mut self.loan,
            InputKind::Loan,
            self.identity.as_ref(),
            |identity| gateway.fetch_loan_balance(identity),
        )
    }

    pub fn refresh_bids(&mut self) -> Result<(), MonitorError> {
        let gateway = &self.gateway;
        let token = self.collateral_token.as_str();
        refresh_slot(
            &mut self.bids,
            InputKind::Bids,
            self.identity.as_ref(),
            |identity| gateway.fetch_bids(identity, token),
        )
    }

    /// Refresh all four inputs. One failing never stops the others.
    pub fn refresh_all(&mut self) -> RefreshReport {
        let outcomes = vec![
            (InputKind::Prices, self.refresh_prices()),
            (InputKind::Collaterals, self.refresh_collaterals()),
            (InputKind::Loan, self.refresh_loan()),
            (InputKind::Bids, self.refresh_bids()),
        ];
        RefreshReport { outcomes }
    }

    pub fn metrics(&self) -> DerivedMetrics {
        let metrics = compute_metrics(
            self.prices.as_ref().map(|f| &f.value),
            self.collaterals.as_ref().map(|f| &f.value),
            self.loan.as_ref().map(|f| &f.value),
            self.bids.as_ref().map(|f| &f.value),
        );

        if let Some(UnknownReason::MissingPrice { asset }) = metrics.collateral_value.reason() {
            tracing::warn!(asset = %asset, "collateral held without an oracle price, LTV unavailable");
        }

        metrics
    }

    pub fn risk_level(&self) -> RiskLevel {
        classify_risk(&self.metrics().loan_to_value, &self.risk)
    }

    pub fn report(&self) -> PositionReport {
        let metrics = self.metrics();
        PositionReport {
            identity: self.identity.clone(),
            loan: self.loan.as_ref().map(|loan| loan.value.amount().value()),
            bids: self.bids.as_ref().map(|bids| bids.value.clone()),
            risk: classify_risk(&metrics.loan_to_value, &self.risk),
            ltv_headroom: ltv_headroom(&metrics.loan_to_value, &self.risk),
            metrics,
        }
    }

    fn clear_snapshots(&mut self) {
        self.prices = None;
        self.collaterals = None;
        self.loan = None;
        self.bids = None;
    }
}

fn refresh_slot<T>(
    slot: &mut Option<Fetched<T>>,
    input: InputKind,
    identity: Option<&Identity>,
    fetch: impl FnOnce(&Identity) -> Result<T, GatewayError>,
) -> Result<(), MonitorError> {
    let Some(identity) = identity else {
        *slot = None;
        return Err(MonitorError::NotConnected);
    };

    match fetch(identity) {
        Ok(value) => {
            tracing::debug!(input = %input, "snapshot refreshed");
            *slot = Some(Fetched {
                value,
                refreshed_at: Timestamp::now(),
            });
            Ok(())
        }
        Err(e) => {
            tracing::warn!(input = %input, error = %e, "refresh failed, keeping previous snapshot");
            Err(e.into())
        }
    }
}
