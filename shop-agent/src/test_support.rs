//! Shared fakes for unit tests

use async_trait::async_trait;
use ethers::types::{Address, H256, U256};
use ethers::utils::keccak256;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crate::nonce::TransactionCountSource;
use crate::spend_registry::{SpendLedger, SpendRecord};

/// Hardhat account #0, never holds real funds
pub const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub const TEST_NETWORK: &str = "eip155:324705682";

/// In-memory ledger that records every submission
#[derive(Default)]
pub struct RecordingLedger {
    pub chain_count: u64,
    pub count_calls: AtomicUsize,
    pub fail_submit: AtomicBool,
    pub submitted: Mutex<Vec<(SpendRecord, U256)>>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl RecordingLedger {
    pub fn new(chain_count: u64) -> Arc<Self> {
        Arc::new(Self {
            chain_count,
            ..Default::default()
        })
    }

    pub fn records(&self) -> Vec<(SpendRecord, U256)> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransactionCountSource for RecordingLedger {
    async fn transaction_count(&self, _address: Address) -> Result<U256, String> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        Ok(U256::from(self.chain_count))
    }
}

#[async_trait]
impl SpendLedger for RecordingLedger {
    fn signer_address(&self) -> Address {
        Address::from_low_u64_be(0xbeef)
    }

    async fn submit_log_spend(&self, record: &SpendRecord, nonce: U256) -> Result<H256, String> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(2)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_submit.load(Ordering::SeqCst) {
            return Err("execution reverted".to_string());
        }
        self.submitted.lock().unwrap().push((record.clone(), nonce));
        Ok(H256::from(keccak256(nonce.as_u64().to_be_bytes())))
    }
}
