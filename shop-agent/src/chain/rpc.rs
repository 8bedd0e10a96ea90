//! Thin JSON-RPC wrapper over an ethers HTTP provider

use ethers::providers::{Http, Middleware, Provider};
use ethers::types::{Address, BlockNumber, Bytes, H256, U256};

use super::ChainConfig;

pub struct EvmRpc {
    provider: Provider<Http>,
    chain: ChainConfig,
}

impl EvmRpc {
    pub fn new(chain: ChainConfig) -> Result<Self, String> {
        let provider = Provider::<Http>::try_from(chain.rpc_url.as_str())
            .map_err(|e| format!("Invalid RPC URL '{}': {}", chain.rpc_url, e))?;

        log::info!("[Chain] RPC for {} ({}) at {}", chain.name, chain.chain_id, chain.rpc_url);

        Ok(Self { provider, chain })
    }

    pub fn chain(&self) -> &ChainConfig {
        &self.chain
    }

    /// Transaction count including pending transactions
    pub async fn get_transaction_count(&self, address: Address) -> Result<U256, String> {
        self.provider
            .get_transaction_count(address, Some(BlockNumber::Pending.into()))
            .await
            .map_err(|e| format!("eth_getTransactionCount failed: {}", e))
    }

    pub async fn get_balance(&self, address: Address) -> Result<U256, String> {
        self.provider
            .get_balance(address, None)
            .await
            .map_err(|e| format!("eth_getBalance failed: {}", e))
    }

    pub async fn gas_price(&self) -> Result<U256, String> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| format!("eth_gasPrice failed: {}", e))
    }

    pub async fn send_raw_transaction(&self, signed_tx: Bytes) -> Result<H256, String> {
        let pending = self
            .provider
            .send_raw_transaction(signed_tx)
            .await
            .map_err(|e| format!("eth_sendRawTransaction failed: {}", e))?;
        Ok(pending.tx_hash())
    }
}
