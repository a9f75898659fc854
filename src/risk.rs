//! LTV risk classification.
//!
//! Maps a computed LTV onto the thresholds the money market liquidates at.
//! The overseer liquidates a borrower once LTV reaches the collateral's max LTV,
//! so the warning band sits just below it.

use crate::calculator::Metric;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Thresholds in percent, the same unit as the computed LTV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskParams {
    /// LTV from which the position is flagged (e.g. 50 for 50%).
    pub warning_ltv: Decimal,
    /// LTV at which the overseer liquidates.
    pub max_ltv: Decimal,
}

impl Default for RiskParams {
    fn default() -> Self {
        Self {
            warning_ltv: dec!(50),
            max_ltv: dec!(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Safe,
    Warning,
    Liquidatable,
    /// LTV could not be computed.
    Unknown,
}

pub fn classify_risk(ltv: &Metric, params: &RiskParams) -> RiskLevel {
    let Some(ltv) = ltv.known() else {
        return RiskLevel::Unknown;
    };

    if ltv >= params.max_ltv {
        RiskLevel::Liquidatable
    } else if ltv >= params.warning_ltv {
        RiskLevel::Warning
    } else {
        RiskLevel::Safe
    }
}

/// Percentage points left before liquidation. Negative once past max LTV.
pub fn ltv_headroom(ltv: &Metric, params: &RiskParams) -> Option<Decimal> {
    ltv.known().map(|ltv| params.max_ltv - ltv)
}
