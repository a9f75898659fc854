//! Anchor position risk walkthrough.
//!
//! Drives the monitor against a mock ledger: a healthy borrower, inputs
//! arriving one at a time, a price crash, a missing oracle price and a failed
//! refresh.

use anchor_risk::*;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("anchor_risk=info")),
        )
        .init();

    println!("Anchor Position Risk Monitor");
    println!("Mock ledger, bLUNA collateral, UST debt\n");

    scenario_1_healthy_position();
    scenario_2_partial_inputs();
    scenario_3_price_crash();
    scenario_4_missing_price();
    scenario_5_refresh_failure();

    println!("\nAll scenarios completed.");
}

const BORROWER: &str = "terra1borrower0000000000000000000000000000";

fn seeded_ledger(config: &MonitorConfig, bluna_price: &str) -> MockLedger {
    let bluna = config.collateral_token.as_str();
    let mut ledger = MockLedger::new();
    ledger.set_prices(&config.contracts.oracle, &[(bluna, bluna_price)]);
    ledger.set_collaterals(&config.contracts.overseer, &[(bluna, "1000000000")]); // 1000 bLUNA
    ledger.set_loan(&config.contracts.market, "25000000000"); // 25,000 UST
    ledger.set_bids(
        &config.contracts.liquidation_queue,
        &[
            (14, 5, "4000000000", "0"),
            (9, 2, "6000000000", "1500000"),
            (11, 2, "2000000000", "0"),
        ],
    );
    ledger
}

fn print_report(monitor: &PositionMonitor<MockLedger>) {
    let report = monitor.report();
    let m = &report.metrics;
    match report.loan {
        Some(loan) => println!("  Loan:              {:.2}", loan),
        None => println!("  Loan:              not loaded"),
    }
    println!("  Collateral value:  {:.2}", m.collateral_value);
    println!("  LTV:               {:.2}", m.loan_to_value);
    println!("  Emergency LTV:     {:.2}", m.emergency_loan_to_value);
    println!("  UST in bids:       {:.2}", m.total_bid_capital);
    println!("  bLUNA liquidated:  {}", m.total_liquidated_collateral);
    println!("  Risk:              {:?}", report.risk);
    if let Some(headroom) = report.ltv_headroom {
        println!("  Headroom:          {:.2} pts", headroom);
    }
    let missing = m.inputs.missing();
    if !missing.is_empty() {
        println!("  Not loaded:        {:?}", missing);
    }
    println!();
}

/// All four inputs load, metrics fully known.
fn scenario_1_healthy_position() {
    println!("Scenario 1: Healthy Position\n");

    let config = MonitorConfig::default();
    let ledger = seeded_ledger(&config, "80");
    let mut monitor = PositionMonitor::new(ledger, config);
    monitor.connect(Identity::new(BORROWER));

    let refresh = monitor.refresh_all();
    println!("  Refreshed all inputs, success: {}", refresh.is_success());

    if let Some(bids) = monitor.bids() {
        for bid in &bids.value {
            println!(
                "  Bid {:>3}  slot {:>3}  {:>10.2} UST  {:>6} bLUNA",
                bid.index.0, bid.premium_slot, bid.amount.value(), bid.liquidated_amount
            );
        }
    }
    println!();
    print_report(&monitor);
}

/// Inputs arrive independently; metrics stay unknown until their operands are in.
fn scenario_2_partial_inputs() {
    println!("Scenario 2: Inputs Arriving One by One\n");

    let config = MonitorConfig::default();
    let ledger = seeded_ledger(&config, "80");
    let mut monitor = PositionMonitor::new(ledger, config);
    monitor.connect(Identity::new(BORROWER));

    println!("  Loan only:");
    let _ = monitor.refresh_loan();
    print_report(&monitor);

    println!("  Loan + collaterals + prices:");
    let _ = monitor.refresh_collaterals();
    let _ = monitor.refresh_prices();
    print_report(&monitor);

    println!("  After disconnect:");
    monitor.disconnect();
    print_report(&monitor);
}

/// bLUNA drops until the position crosses the liquidation threshold.
fn scenario_3_price_crash() {
    println!("Scenario 3: Price Crash\n");

    let config = MonitorConfig::default();
    let oracle = config.contracts.oracle.clone();
    let bluna = config.collateral_token.clone();
    let ledger = seeded_ledger(&config, "80");
    let mut monitor = PositionMonitor::new(ledger, config);
    monitor.connect(Identity::new(BORROWER));
    monitor.refresh_all();

    for price in ["80", "55", "45", "40"] {
        monitor
            .gateway_mut()
            .client_mut()
            .set_prices(&oracle, &[(bluna.as_str(), price)]);
        let _ = monitor.refresh_prices();
        let report = monitor.report();
        println!(
            "  bLUNA @ {:>3}: LTV {:.2}, emergency {:.2}, {:?}",
            price, report.metrics.loan_to_value, report.metrics.emergency_loan_to_value, report.risk
        );
    }
    println!();
}

/// Collateral in an asset the oracle doesn't price: LTV refuses to undercount.
fn scenario_4_missing_price() {
    println!("Scenario 4: Missing Oracle Price\n");

    let config = MonitorConfig::default();
    let mut ledger = seeded_ledger(&config, "80");
    ledger.set_collaterals(
        &config.contracts.overseer,
        &[
            (config.collateral_token.as_str(), "1000000000"),
            ("terra1beth000000000000000000000000000000000", "2000000"),
        ],
    );
    let mut monitor = PositionMonitor::new(ledger, config);
    monitor.connect(Identity::new(BORROWER));
    monitor.refresh_all();
    print_report(&monitor);
}

/// A failed refresh keeps the last good snapshot.
fn scenario_5_refresh_failure() {
    println!("Scenario 5: Refresh Failure\n");

    let config = MonitorConfig::default();
    let market = config.contracts.market.clone();
    let ledger = seeded_ledger(&config, "80");
    let mut monitor = PositionMonitor::new(ledger, config);
    monitor.connect(Identity::new(BORROWER));
    monitor.refresh_all();

    monitor
        .gateway_mut()
        .client_mut()
        .fail(&market, "borrower_info", "lcd timeout");
    let report = monitor.refresh_all();
    println!("  Failed inputs: {:?}", report.failed());
    print_report(&monitor);

    println!("{}", serde_json::to_string_pretty(&monitor.report()).unwrap_or_default());
}
