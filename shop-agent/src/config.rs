use ethers::types::Address;
use paid_tools_types::Price;
use std::sync::Arc;

use crate::chain::ChainConfig;
use crate::orchestrator::{AlwaysEligible, EligibilityPolicy, IntentScore, MinCartValue};

pub mod env_vars {
    /// Hex private key of the paying agent (required)
    pub const PRIVATE_KEY: &str = "SHOP_AGENT_PRIVATE_KEY";
    /// SpendRegistry contract address; spend logging is off when unset
    pub const SPEND_REGISTRY_CONTRACT: &str = "SPEND_REGISTRY_CONTRACT";
    pub const SPEND_LOG_GAS_LIMIT: &str = "SPEND_LOG_GAS_LIMIT";
    pub const RPC_URL: &str = "SKALE_RPC_URL";
    pub const CHAIN_ID: &str = "SKALE_CHAIN_ID";
    pub const TOOLS_BASE_URL: &str = "TOOLS_BASE_URL";
    pub const CHAIN_BUDGET: &str = "CHAIN_BUDGET";
    pub const CART_SUBTOTAL: &str = "CART_SUBTOTAL";
    pub const CART_ITEM_COUNT: &str = "CART_ITEM_COUNT";
    pub const MIN_CART_VALUE: &str = "MIN_CART_VALUE";
    pub const INTENT_SCORE: &str = "INTENT_SCORE";
}

const DEFAULT_TOOLS_BASE_URL: &str = "http://127.0.0.1:9102";
const DEFAULT_BUDGET: &str = "0.5";
const DEFAULT_CART_SUBTOTAL: &str = "34";
const DEFAULT_SPEND_LOG_GAS_LIMIT: u64 = 200_000;

#[derive(Debug, Clone)]
pub struct SpendRegistryConfig {
    pub contract_address: Address,
    pub gas_limit: u64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub chain: ChainConfig,
    pub tools_base_url: String,
    pub spend_registry: Option<SpendRegistryConfig>,
    pub budget: Price,
    pub cart_subtotal: Price,
    pub cart_item_count: u32,
    pub min_cart_value: Option<Price>,
    pub intent_score: Option<u32>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; `from_env` passes the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut chain = ChainConfig::skale_base_sepolia();
        if let Some(url) = var(env_vars::RPC_URL) {
            chain.rpc_url = url;
        }
        if let Some(id) = var(env_vars::CHAIN_ID) {
            chain.chain_id = id
                .parse()
                .map_err(|_| format!("{} must be a valid number", env_vars::CHAIN_ID))?;
        }

        let spend_registry = match var(env_vars::SPEND_REGISTRY_CONTRACT) {
            Some(addr) => {
                let contract_address = addr
                    .parse()
                    .map_err(|_| format!("{} is not a valid address: {}", env_vars::SPEND_REGISTRY_CONTRACT, addr))?;
                let gas_limit = match var(env_vars::SPEND_LOG_GAS_LIMIT) {
                    Some(v) => v
                        .parse()
                        .map_err(|_| format!("{} must be a valid number", env_vars::SPEND_LOG_GAS_LIMIT))?,
                    None => DEFAULT_SPEND_LOG_GAS_LIMIT,
                };
                Some(SpendRegistryConfig { contract_address, gas_limit })
            }
            None => None,
        };

        let price = |name: &str, default: Option<&str>| -> Result<Option<Price>, String> {
            match var(name).as_deref().or(default) {
                Some(v) => Price::parse_decimal(v)
                    .map(Some)
                    .map_err(|e| format!("{}: {}", name, e)),
                None => Ok(None),
            }
        };

        let budget = price(env_vars::CHAIN_BUDGET, Some(DEFAULT_BUDGET))?.unwrap_or_default();
        let cart_subtotal = price(env_vars::CART_SUBTOTAL, Some(DEFAULT_CART_SUBTOTAL))?.unwrap_or_default();
        let min_cart_value = price(env_vars::MIN_CART_VALUE, None)?;

        let cart_item_count = match var(env_vars::CART_ITEM_COUNT) {
            Some(v) => v
                .parse()
                .map_err(|_| format!("{} must be a valid number", env_vars::CART_ITEM_COUNT))?,
            None => 3,
        };

        let intent_score = match var(env_vars::INTENT_SCORE) {
            Some(v) => Some(
                v.parse()
                    .map_err(|_| format!("{} must be a valid number", env_vars::INTENT_SCORE))?,
            ),
            None => None,
        };

        Ok(Self {
            chain,
            tools_base_url: var(env_vars::TOOLS_BASE_URL)
                .unwrap_or_else(|| DEFAULT_TOOLS_BASE_URL.to_string()),
            spend_registry,
            budget,
            cart_subtotal,
            cart_item_count,
            min_cart_value,
            intent_score,
        })
    }

    /// Minimum cart value wins over intent score when both are set
    pub fn eligibility_policy(&self) -> Arc<dyn EligibilityPolicy> {
        if let Some(min_cart_value) = self.min_cart_value {
            Arc::new(MinCartValue {
                cart_subtotal: self.cart_subtotal,
                min_cart_value,
            })
        } else if let Some(score) = self.intent_score {
            Arc::new(IntentScore::new(score))
        } else {
            Arc::new(AlwaysEligible)
        }
    }
}
