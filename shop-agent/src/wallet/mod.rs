//! Wallet Provider Abstraction
//!
//! The agent signs two kinds of things with the same identity: x402 payment
//! authorizations and spend registry transactions. Both get their key through
//! a `WalletProvider`, so a remote signer can replace the env key later
//! without touching the payment flow.

mod env_provider;

pub use env_provider::EnvWalletProvider;

use async_trait::async_trait;
use ethers::signers::LocalWallet;
use ethers::types::Address;

/// Trait for wallet providers - abstracts where the signing key comes from
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Get the wallet for signing, bound to the configured chain id
    async fn get_wallet(&self) -> Result<LocalWallet, String>;

    /// Get the wallet address (always available, cached)
    fn get_address(&self) -> Address;

    /// Get the mode name for logging
    fn mode_name(&self) -> &'static str;
}

/// Lowercase 0x-prefixed address, the form used in x402 payloads
pub fn format_address(address: Address) -> String {
    format!("{:?}", address).to_lowercase()
}
