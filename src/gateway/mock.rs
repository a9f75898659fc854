// 9.2 mock.rs: MOCKED. canned contract responses, no chain access.
// responses are keyed by (contract, query name), the query name being the
// top-level key of the message. every call is recorded for assertions.

use super::client::{GatewayError, LedgerClient};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::HashMap;

type QueryKey = (String, String);

#[derive(Debug, Default)]
pub struct MockLedger {
    responses: HashMap<QueryKey, Value>,
    failures: HashMap<QueryKey, String>,
    calls: RefCell<Vec<(String, Value)>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_response(&mut self, contract: &str, query: &str, response: Value) {
        self.responses
            .insert((contract.to_string(), query.to_string()), response);
    }

    // Make the query fail at the transport level until cleared
    pub fn fail(&mut self, contract: &str, query: &str, reason: &str) {
        self.failures
            .insert((contract.to_string(), query.to_string()), reason.to_string());
    }

    pub fn clear_failure(&mut self, contract: &str, query: &str) {
        self.failures
            .remove(&(contract.to_string(), query.to_string()));
    }

    // prices as decimal strings, e.g. ("terra1bluna", "87.5")
    pub fn set_prices(&mut self, oracle: &str, prices: &[(&str, &str)]) {
        let prices: Vec<Value> = prices
            .iter()
            .map(|(asset, price)| json!({ "asset": asset, "price": price }))
            .collect();
        self.set_response(oracle, "prices", json!({ "prices": prices }));
    }

    // balances in micro-units
    pub fn set_collaterals(&mut self, overseer: &str, collaterals: &[(&str, &str)]) {
        let collaterals: Vec<Value> = collaterals
            .iter()
            .map(|(asset, amount)| json!([asset, amount]))
            .collect();
        self.set_response(overseer, "collaterals", json!({ "collaterals": collaterals }));
    }

    pub fn set_loan(&mut self, market: &str, loan_amount: &str) {
        self.set_response(market, "borrower_info", json!({ "loan_amount": loan_amount }));
    }

    // (idx, premium_slot, amount, pending_liquidated_collateral), amounts in micro-units
    pub fn set_bids(&mut self, queue: &str, bids: &[(u64, u8, &str, &str)]) {
        let bids: Vec<Value> = bids
            .iter()
            .map(|(idx, slot, amount, liquidated)| {
                json!({
                    "idx": idx.to_string(),
                    "premium_slot": slot,
                    "amount": amount,
                    "pending_liquidated_collateral": liquidated,
                })
            })
            .collect();
        self.set_response(queue, "bids_by_user", json!({ "bids": bids }));
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl LedgerClient for MockLedger {
    fn query(&self, contract: &str, msg: &Value) -> Result<Value, GatewayError> {
        self.calls
            .borrow_mut()
            .push((contract.to_string(), msg.clone()));

        let query = msg
            .as_object()
            .and_then(|obj| obj.keys().next())
            .cloned()
            .ok_or_else(|| GatewayError::Transport("query message is not an object".to_string()))?;
        let key = (contract.to_string(), query);

        if let Some(reason) = self.failures.get(&key) {
            return Err(GatewayError::Transport(reason.clone()));
        }

        self.responses.get(&key).cloned().ok_or_else(|| {
            GatewayError::Transport(format!("no response for {} on {}", key.1, key.0))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_query_is_transport_error() {
        let ledger = MockLedger::new();
        let result = ledger.query("terra1oracle", &json!({ "prices": {} }));
        assert!(matches!(result, Err(GatewayError::Transport(_))));
        assert_eq!(ledger.call_count(), 1);
    }

    #[test]
    fn failure_overrides_response_until_cleared() {
        let mut ledger = MockLedger::new();
        ledger.set_loan("terra1market", "1");
        ledger.fail("terra1market", "borrower_info", "timeout");

        let msg = json!({ "borrower_info": { "borrower": "terra1me" } });
        assert!(ledger.query("terra1market", &msg).is_err());

        ledger.clear_failure("terra1market", "borrower_info");
        assert_eq!(
            ledger.query("terra1market", &msg).unwrap(),
            json!({ "loan_amount": "1" })
        );
    }
}
