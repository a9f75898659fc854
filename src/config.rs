// 7.0 config.rs: everything the monitor needs to find the protocol on chain.
// contract addresses are passed in, never compiled into the gateway.

use serde::{Deserialize, Serialize};

use crate::risk::RiskParams;

const ADDRESS_PREFIX: &str = "terra1";

// Anchor contracts the four queries go to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAddresses {
    // Overseer: collateral balances per borrower
    pub overseer: String,
    // Oracle: collateral prices
    pub oracle: String,
    // Money market: loan balance per borrower
    pub market: String,
    // Liquidation queue: bids per bidder and collateral token
    pub liquidation_queue: String,
}

impl Default for ContractAddresses {
    fn default() -> Self {
        Self {
            overseer: "terra1tmnqgvg567ypvsvk6rwsga3srp7e3lg6u0elp8".to_string(),
            oracle: "terra1cgg6yef7qcdm070qftghfulaxmllgmvk77nc7t".to_string(),
            market: "terra1sepfj7s0aeg5967uxnfk4thzlerrsktkpelm5s".to_string(),
            liquidation_queue: "terra1e25zllgag7j9xsun3me4stnye2pcg66234je3u".to_string(),
        }
    }
}

impl ContractAddresses {
    fn named(&self) -> [(&'static str, &str); 4] {
        [
            ("overseer", &self.overseer),
            ("oracle", &self.oracle),
            ("market", &self.market),
            ("liquidation_queue", &self.liquidation_queue),
        ]
    }
}

/** 7.1: the full monitor config. defaults point at Anchor mainnet with bLUNA bids. */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub contracts: ContractAddresses,
    // cw20 token the liquidation bids are placed against (bLUNA)
    pub collateral_token: String,
    #[serde(default)]
    pub risk: RiskParams,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            contracts: ContractAddresses::default(),
            collateral_token: "terra1kc87mu460fwkqte29rquh4hc20m54fxwtsx7gp".to_string(),
            risk: RiskParams::default(),
        }
    }
}

impl MonitorConfig {
    // Parse a JSON config and reject it if inconsistent
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    // Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        let addresses = self
            .contracts
            .named()
            .into_iter()
            .chain(std::iter::once(("collateral_token", self.collateral_token.as_str())));

        for (field, address) in addresses {
            if !address.starts_with(ADDRESS_PREFIX) || address.len() <= ADDRESS_PREFIX.len() {
                return Err(ConfigError::InvalidAddress {
                    field,
                    address: address.to_string(),
                });
            }
        }

        if self.risk.warning_ltv <= rust_decimal::Decimal::ZERO {
            return Err(ConfigError::InvalidRisk {
                reason: "warning LTV must be positive".to_string(),
            });
        }

        if self.risk.warning_ltv >= self.risk.max_ltv {
            return Err(ConfigError::InvalidRisk {
                reason: "warning LTV must be below max LTV".to_string(),
            });
        }

        Ok(())
    }
}

// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {field} address: {address:?}")]
    InvalidAddress { field: &'static str, address: String },

    #[error("invalid risk params: {reason}")]
    InvalidRisk { reason: String },

    #[error("config parse error: {reason}")]
    Parse { reason: String },
}
