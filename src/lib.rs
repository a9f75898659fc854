// anchor-risk: position risk monitor for Anchor borrowers.
// reads collateral, debt and liquidation bids, derives collateral value, LTV
// and emergency LTV. the calculator is pure; all I/O sits behind LedgerClient.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: AssetId, Identity, Amount, Price, bid ids
//   2.x  snapshot.rs: validated price/collateral/loan/bid snapshots
//   3.x  calculator.rs: collateral value, bid totals, LTV, emergency LTV
//   6.x  risk.rs: LTV thresholds and risk level
//   7.x  config.rs: contract addresses, collateral token, risk params
//   8.x  monitor.rs: per-wallet snapshot holder with explicit refresh
//   9.x  gateway/: contract queries, response decoding, mock ledger

pub mod calculator;
pub mod config;
pub mod gateway;
pub mod monitor;
pub mod risk;
pub mod snapshot;
pub mod types;

// re exports for convenience
pub use calculator::*;
pub use config::{ConfigError, ContractAddresses, MonitorConfig};
pub use gateway::{GatewayError, LedgerClient, LedgerGateway, MockLedger};
pub use monitor::{Fetched, MonitorError, PositionMonitor, PositionReport, RefreshReport};
pub use risk::*;
pub use snapshot::*;
pub use types::*;
