//! EVM chain configuration and RPC access
//!
//! The spend registry lives on SKALE Base Sepolia by default: zero gas fees,
//! so every paid step can afford its own audit transaction.

mod rpc;

pub use rpc::EvmRpc;

use paid_tools_types::eip155_network;

/// SKALE Base Sepolia testnet chain ID
pub const SKALE_BASE_SEPOLIA_CHAIN_ID: u64 = 324705682;

pub const SKALE_BASE_SEPOLIA_RPC: &str =
    "https://base-sepolia-testnet.skalenodes.com/v1/base-testnet";

pub const SKALE_BASE_SEPOLIA_EXPLORER: &str =
    "https://base-sepolia-testnet-explorer.skalenodes.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub name: String,
    pub rpc_url: String,
    pub explorer_url: String,
}

impl ChainConfig {
    pub fn skale_base_sepolia() -> Self {
        Self {
            chain_id: SKALE_BASE_SEPOLIA_CHAIN_ID,
            name: "SKALE Base Sepolia Testnet".to_string(),
            rpc_url: SKALE_BASE_SEPOLIA_RPC.to_string(),
            explorer_url: SKALE_BASE_SEPOLIA_EXPLORER.to_string(),
        }
    }

    /// CAIP-2 network id used in x402 requirements
    pub fn network_id(&self) -> String {
        eip155_network(self.chain_id)
    }

    pub fn tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url.trim_end_matches('/'), tx_hash)
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::skale_base_sepolia()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_id_and_explorer() {
        let chain = ChainConfig::skale_base_sepolia();
        assert_eq!(chain.network_id(), "eip155:324705682");
        assert_eq!(
            chain.tx_url("0xabc"),
            "https://base-sepolia-testnet-explorer.skalenodes.com/tx/0xabc"
        );
    }
}
