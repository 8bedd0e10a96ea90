//! Paid tools service: sells each purchase step behind an x402 challenge.

pub mod routes;
pub mod verify;

use axum::Router;
use axum::routing::{get, post};
use ethers::types::Address;
use paid_tools_types::{AssetDomain, default_catalog};
use std::sync::Arc;

use routes::AppState;
use verify::PaymentVerifier;

pub mod env_vars {
    pub const PORT: &str = "PAID_TOOLS_PORT";
    /// Address that receives payments
    pub const PAY_TO: &str = "PAID_TOOLS_PAY_TO";
    /// EIP-3009 token contract named in requirements
    pub const ASSET: &str = "PAID_TOOLS_ASSET";
    pub const CHAIN_ID: &str = "PAID_TOOLS_CHAIN_ID";
}

const DEFAULT_PORT: u16 = 9102;
const DEFAULT_CHAIN_ID: u64 = 324705682;
// Hardhat account #1
const DEFAULT_PAY_TO: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
// Only used as the EIP-712 verifying contract; settlement is mocked
const DEFAULT_ASSET: &str = "0x036CbD53842c5426634e7929541eC2318f3dCF7e";

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    pub chain_id: u64,
    pub pay_to: Address,
    pub asset: Address,
    pub asset_domain: AssetDomain,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match var(env_vars::PORT) {
            Some(v) => v.parse().map_err(|_| format!("{} must be a valid port", env_vars::PORT))?,
            None => DEFAULT_PORT,
        };
        let chain_id = match var(env_vars::CHAIN_ID) {
            Some(v) => v
                .parse()
                .map_err(|_| format!("{} must be a valid number", env_vars::CHAIN_ID))?,
            None => DEFAULT_CHAIN_ID,
        };
        let pay_to = var(env_vars::PAY_TO).unwrap_or_else(|| DEFAULT_PAY_TO.to_string());
        let asset = var(env_vars::ASSET).unwrap_or_else(|| DEFAULT_ASSET.to_string());

        Ok(Self {
            port,
            chain_id,
            pay_to: pay_to
                .trim()
                .parse()
                .map_err(|_| format!("{} is not a valid address: {}", env_vars::PAY_TO, pay_to))?,
            asset: asset
                .trim()
                .parse()
                .map_err(|_| format!("{} is not a valid address: {}", env_vars::ASSET, asset))?,
            asset_domain: AssetDomain {
                name: "USD Coin".to_string(),
                version: "2".to_string(),
            },
        })
    }
}

pub fn build_state(config: &ServiceConfig) -> AppState {
    let verifier = PaymentVerifier::new(
        config.chain_id,
        config.pay_to,
        config.asset,
        config.asset_domain.clone(),
    );
    AppState::new(default_catalog(), verifier)
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = tower_http::cors::CorsLayer::permissive();

    Router::new()
        .route("/api/tools/:step", post(routes::call_tool))
        .route("/rpc/status", get(routes::status))
        .with_state(state)
        .layer(cors)
}
