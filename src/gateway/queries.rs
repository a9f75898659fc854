// 9.1: the four read queries. each one is independent: its own contract, its
// own message, its own snapshot. nothing here caches or retries.

use super::client::{GatewayError, LedgerClient};
use super::wire::{BidsResponse, BorrowerInfoResponse, CollateralsResponse, PricesResponse};
use crate::config::ContractAddresses;
use crate::snapshot::{BidList, CollateralTable, LoanBalance, PriceTable};
use crate::types::Identity;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

pub fn prices_query() -> Value {
    json!({ "prices": {} })
}

pub fn collaterals_query(borrower: &Identity) -> Value {
    json!({ "collaterals": { "borrower": borrower.as_str() } })
}

pub fn borrower_info_query(borrower: &Identity) -> Value {
    json!({ "borrower_info": { "borrower": borrower.as_str() } })
}

pub fn bids_by_user_query(bidder: &Identity, collateral_token: &str) -> Value {
    json!({
        "bids_by_user": {
            "collateral_token": collateral_token,
            "bidder": bidder.as_str(),
        }
    })
}

/// Typed access to the Anchor contracts over any [`LedgerClient`].
#[derive(Debug, Clone)]
pub struct LedgerGateway<C> {
    client: C,
    contracts: ContractAddresses,
}

impl<C: LedgerClient> LedgerGateway<C> {
    pub fn new(client: C, contracts: ContractAddresses) -> Self {
        Self { client, contracts }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    pub fn contracts(&self) -> &ContractAddresses {
        &self.contracts
    }

    pub fn fetch_prices(&self) -> Result<PriceTable, GatewayError> {
        let response: PricesResponse =
            self.run("prices", &self.contracts.oracle, &prices_query())?;
        Ok(response.into_table()?)
    }

    pub fn fetch_collaterals(&self, borrower: &Identity) -> Result<CollateralTable, GatewayError> {
        let response: CollateralsResponse = self.run(
            "collaterals",
            &self.contracts.overseer,
            &collaterals_query(borrower),
        )?;
        Ok(response.into_table()?)
    }

    pub fn fetch_loan_balance(&self, borrower: &Identity) -> Result<LoanBalance, GatewayError> {
        let response: BorrowerInfoResponse = self.run(
            "borrower_info",
            &self.contracts.market,
            &borrower_info_query(borrower),
        )?;
        Ok(response.into_balance()?)
    }

    pub fn fetch_bids(
        &self,
        bidder: &Identity,
        collateral_token: &str,
    ) -> Result<BidList, GatewayError> {
        let response: BidsResponse = self.run(
            "bids_by_user",
            &self.contracts.liquidation_queue,
            &bids_by_user_query(bidder, collateral_token),
        )?;
        Ok(response.into_list()?)
    }

    fn run<T: DeserializeOwned>(
        &self,
        query: &'static str,
        contract: &str,
        msg: &Value,
    ) -> Result<T, GatewayError> {
        tracing::debug!(query, contract, "querying contract");
        let raw = self.client.query(contract, msg)?;
        serde_json::from_value(raw).map_err(|source| GatewayError::Decode { query, source })
    }
}
