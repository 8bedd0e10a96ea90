//! Ledger seam for spend logging
//!
//! `SpendLogger` only ever talks to a `SpendLedger`; `EvmSpendLedger` is the
//! production one, tests use in-memory fakes.

use async_trait::async_trait;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, H256, TransactionRequest, U256};
use std::sync::Arc;

use super::abi::encode_log_spend;
use super::types::SpendRecord;
use crate::chain::EvmRpc;
use crate::nonce::TransactionCountSource;

/// Write side of the spend registry, bound to one signing identity
#[async_trait]
pub trait SpendLedger: TransactionCountSource {
    fn signer_address(&self) -> Address;

    /// Submit one logSpend call with an explicit nonce. Returns the tx hash.
    async fn submit_log_spend(&self, record: &SpendRecord, nonce: U256) -> Result<H256, String>;
}

/// SpendRegistry contract reached over JSON-RPC, signed locally
pub struct EvmSpendLedger {
    rpc: Arc<EvmRpc>,
    wallet: LocalWallet,
    contract: Address,
    gas_limit: u64,
}

impl EvmSpendLedger {
    pub fn new(rpc: Arc<EvmRpc>, wallet: LocalWallet, contract: Address, gas_limit: u64) -> Self {
        let wallet = wallet.with_chain_id(rpc.chain().chain_id);
        Self {
            rpc,
            wallet,
            contract,
            gas_limit,
        }
    }
}

#[async_trait]
impl TransactionCountSource for EvmSpendLedger {
    async fn transaction_count(&self, address: Address) -> Result<U256, String> {
        self.rpc.get_transaction_count(address).await
    }
}

#[async_trait]
impl SpendLedger for EvmSpendLedger {
    fn signer_address(&self) -> Address {
        self.wallet.address()
    }

    async fn submit_log_spend(&self, record: &SpendRecord, nonce: U256) -> Result<H256, String> {
        let calldata = encode_log_spend(&record.step_id, record.amount.as_u256(), &record.memo);
        let gas_price = self.rpc.gas_price().await?;

        log::debug!(
            "[SpendRegistry] Signing logSpend: to={:?}, data_len={} bytes, gas={}, nonce={}",
            self.contract,
            calldata.len(),
            self.gas_limit,
            nonce
        );

        // Never let the signer pick the nonce; the sequencer owns it
        let tx = TransactionRequest::new()
            .from(self.wallet.address())
            .to(self.contract)
            .data(calldata)
            .nonce(nonce)
            .gas(self.gas_limit)
            .gas_price(gas_price)
            .chain_id(self.wallet.chain_id());

        let typed_tx: TypedTransaction = tx.into();
        let signature = self
            .wallet
            .sign_transaction(&typed_tx)
            .await
            .map_err(|e| format!("Failed to sign transaction: {}", e))?;

        let signed_tx = typed_tx.rlp_signed(&signature);
        self.rpc.send_raw_transaction(signed_tx).await
    }
}
