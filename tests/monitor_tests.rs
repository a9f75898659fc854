//! Monitor lifecycle tests.
//!
//! These drive the monitor through the mock ledger the way a dashboard would:
//! connect, refresh inputs as they come in, survive failures, disconnect.

use anchor_risk::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const BORROWER: &str = "terra1borrower";

fn config() -> MonitorConfig {
    MonitorConfig::default()
}

/// 1000 bLUNA @ 40, 20,000 UST owed, 5,000 UST in bids.
fn seeded_ledger() -> MockLedger {
    let config = config();
    let bluna = config.collateral_token.as_str();
    let mut ledger = MockLedger::new();
    ledger.set_prices(&config.contracts.oracle, &[(bluna, "40")]);
    ledger.set_collaterals(&config.contracts.overseer, &[(bluna, "1000000000")]);
    ledger.set_loan(&config.contracts.market, "20000000000");
    ledger.set_bids(
        &config.contracts.liquidation_queue,
        &[(3, 4, "3000000000", "0"), (1, 4, "2000000000", "500000")],
    );
    ledger
}

fn connected_monitor() -> PositionMonitor<MockLedger> {
    let mut monitor = PositionMonitor::new(seeded_ledger(), config());
    monitor.connect(Identity::new(BORROWER));
    monitor
}

#[test]
fn nothing_loaded_means_everything_unknown() {
    let monitor = connected_monitor();
    let metrics = monitor.metrics();

    assert_eq!(metrics.collateral_value, Metric::missing(InputKind::Prices));
    assert_eq!(metrics.loan_to_value, Metric::missing(InputKind::Prices));
    assert_eq!(metrics.total_bid_capital, Metric::Known(Decimal::ZERO));
    assert!(!metrics.inputs.bids);
    assert_eq!(monitor.risk_level(), RiskLevel::Unknown);
}

#[test]
fn inputs_arrive_in_any_order() {
    let mut monitor = connected_monitor();

    monitor.refresh_bids().unwrap();
    let metrics = monitor.metrics();
    assert_eq!(metrics.total_bid_capital, Metric::Known(dec!(5000)));
    assert_eq!(metrics.total_liquidated_collateral, Metric::Known(dec!(0.5)));
    assert!(!metrics.loan_to_value.is_known());

    monitor.refresh_loan().unwrap();
    monitor.refresh_collaterals().unwrap();
    assert_eq!(
        monitor.metrics().collateral_value,
        Metric::missing(InputKind::Prices)
    );

    monitor.refresh_prices().unwrap();
    let metrics = monitor.metrics();
    assert_eq!(metrics.collateral_value, Metric::Known(dec!(40000)));
    assert_eq!(metrics.loan_to_value, Metric::Known(dec!(50)));
    assert_eq!(metrics.emergency_loan_to_value, Metric::Known(dec!(37.5)));
    assert_eq!(monitor.risk_level(), RiskLevel::Warning);
}

#[test]
fn bids_sorted_by_slot_then_index() {
    let mut monitor = connected_monitor();
    monitor.refresh_bids().unwrap();

    let indices: Vec<u64> = monitor
        .bids()
        .unwrap()
        .value
        .iter()
        .map(|bid| bid.index.0)
        .collect();
    assert_eq!(indices, vec![1, 3]);
}

#[test]
fn failed_refresh_keeps_previous_snapshot() {
    let market = config().contracts.market;
    let mut monitor = connected_monitor();
    monitor.refresh_all();

    monitor
        .gateway_mut()
        .client_mut()
        .set_loan(&market, "30000000000");
    monitor
        .gateway_mut()
        .client_mut()
        .fail(&market, "borrower_info", "lcd timeout");

    let report = monitor.refresh_all();
    assert_eq!(report.failed(), vec![InputKind::Loan]);
    assert_eq!(monitor.loan().unwrap().value.amount().value(), dec!(20000));

    monitor
        .gateway_mut()
        .client_mut()
        .clear_failure(&market, "borrower_info");
    monitor.refresh_loan().unwrap();
    assert_eq!(monitor.loan().unwrap().value.amount().value(), dec!(30000));
    assert_eq!(monitor.risk_level(), RiskLevel::Liquidatable);
}

#[test]
fn invalid_response_is_rejected_not_propagated() {
    let overseer = config().contracts.overseer;
    let mut monitor = connected_monitor();
    monitor.refresh_all();

    monitor
        .gateway_mut()
        .client_mut()
        .set_collaterals(&overseer, &[("terra1bluna", "lots")]);

    let result = monitor.refresh_collaterals();
    assert!(matches!(
        result,
        Err(MonitorError::Gateway(GatewayError::Snapshot(
            SnapshotError::Malformed { .. }
        )))
    ));
    assert_eq!(
        monitor.metrics().collateral_value,
        Metric::Known(dec!(40000))
    );
}

#[test]
fn missing_price_blocks_ltv() {
    let config = config();
    let mut ledger = seeded_ledger();
    ledger.set_collaterals(
        &config.contracts.overseer,
        &[
            (config.collateral_token.as_str(), "1000000000"),
            ("terra1beth", "1000000"),
        ],
    );
    let mut monitor = PositionMonitor::new(ledger, config);
    monitor.connect(Identity::new(BORROWER));
    assert!(monitor.refresh_all().is_success());

    let reason = UnknownReason::MissingPrice {
        asset: AssetId::from("terra1beth"),
    };
    let metrics = monitor.metrics();
    assert_eq!(metrics.collateral_value, Metric::Unknown(reason.clone()));
    assert_eq!(metrics.loan_to_value, Metric::Unknown(reason));
    assert_eq!(monitor.risk_level(), RiskLevel::Unknown);
}

#[test]
fn disconnect_clears_everything() {
    let mut monitor = connected_monitor();
    monitor.refresh_all();
    monitor.disconnect();

    assert!(monitor.identity().is_none());
    assert!(monitor.prices().is_none());
    assert!(monitor.bids().is_none());

    let calls_before = monitor.gateway().client().call_count();
    let report = monitor.refresh_all();
    assert_eq!(report.failed().len(), 4);
    assert!(report
        .outcomes
        .iter()
        .all(|(_, outcome)| matches!(outcome, Err(MonitorError::NotConnected))));
    assert_eq!(monitor.gateway().client().call_count(), calls_before);
}

#[test]
fn report_serializes_for_rendering() {
    let mut monitor = connected_monitor();
    monitor.refresh_all();

    let report = monitor.report();
    assert_eq!(report.risk, RiskLevel::Warning);
    assert_eq!(report.ltv_headroom, Some(dec!(10)));
    assert_eq!(report.loan, Some(dec!(20000)));
    let indices: Vec<u64> = report
        .bids
        .as_ref()
        .unwrap()
        .iter()
        .map(|bid| bid.index.0)
        .collect();
    assert_eq!(indices, vec![1, 3]);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["identity"], serde_json::json!(BORROWER));
    assert!(json["loan"].is_string());
    assert_eq!(json["bids"][0]["index"], serde_json::json!(1));
    assert_eq!(json["risk"], serde_json::json!("warning"));
    assert!(json["metrics"]["loan_to_value"]["known"].is_string());

    monitor.disconnect();
    let report = monitor.report();
    assert!(report.loan.is_none() && report.bids.is_none());
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(
        json["metrics"]["collateral_value"]["unknown"]["reason"],
        serde_json::json!("missing_input")
    );
}
