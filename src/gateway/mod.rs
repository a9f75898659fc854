// 9.0: ledger query gateway. builds the four Anchor contract queries and decodes
// the responses into validated snapshots. the transport sits behind LedgerClient,
// so the gateway never knows whether it talks to an LCD node or a mock.

mod client;
mod mock;
mod queries;
mod wire;

pub use client::{GatewayError, LedgerClient};
pub use mock::MockLedger;
pub use queries::{
    bids_by_user_query, borrower_info_query, collaterals_query, prices_query, LedgerGateway,
};
