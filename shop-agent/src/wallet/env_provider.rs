//! Environment-based Wallet Provider
//!
//! Loads the agent's wallet from SHOP_AGENT_PRIVATE_KEY. The same key pays for
//! tool calls and signs spend registry transactions.

use async_trait::async_trait;
use ethers::core::k256::ecdsa::SigningKey;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;

use super::WalletProvider;
use crate::config::env_vars;

/// Wallet provider backed by a private key from the environment
pub struct EnvWalletProvider {
    wallet: LocalWallet,
}

impl EnvWalletProvider {
    /// Create provider from environment variable
    ///
    /// Requires: SHOP_AGENT_PRIVATE_KEY
    pub fn from_env(chain_id: u64) -> Result<Self, String> {
        let private_key = std::env::var(env_vars::PRIVATE_KEY)
            .map_err(|_| format!("{} not set", env_vars::PRIVATE_KEY))?;

        Self::from_private_key(&private_key, chain_id)
    }

    /// Create provider from a hex private key, with or without 0x prefix
    pub fn from_private_key(private_key: &str, chain_id: u64) -> Result<Self, String> {
        let key_hex = private_key.trim().strip_prefix("0x").unwrap_or(private_key.trim());

        let key_bytes = hex::decode(key_hex)
            .map_err(|e| format!("Invalid private key hex: {}", e))?;
        if key_bytes.len() != 32 {
            return Err(format!("Invalid private key length: {} bytes", key_bytes.len()));
        }

        let signing_key = SigningKey::from_bytes(key_bytes.as_slice().into())
            .map_err(|e| format!("Invalid private key: {}", e))?;

        let wallet = LocalWallet::from(signing_key).with_chain_id(chain_id);

        Ok(Self { wallet })
    }

    pub fn wallet(&self) -> LocalWallet {
        self.wallet.clone()
    }
}

#[async_trait]
impl WalletProvider for EnvWalletProvider {
    async fn get_wallet(&self) -> Result<LocalWallet, String> {
        Ok(self.wallet.clone())
    }

    fn get_address(&self) -> Address {
        self.wallet.address()
    }

    fn mode_name(&self) -> &'static str {
        "env"
    }
}
