//! Spend logger
//!
//! Submits one logSpend transaction per paid step. Submissions for one
//! identity are fully serialized: the nonce lease is held from issuance until
//! the RPC node has accepted (or refused) the transaction.

use ethers::types::H256;
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use paid_tools_types::Price;
use std::sync::Arc;
use std::time::Duration;

use super::ledger::SpendLedger;
use super::types::{SpendLogError, SpendRecord};
use crate::nonce::{NonceSequencer, TransactionCountSource};

/// Keys remembered for idempotency; one per paid step
const IDEMPOTENCY_CAPACITY: u64 = 10_000;
/// A retry of the same step comes well within this
const IDEMPOTENCY_TTL: Duration = Duration::from_secs(6 * 3600);

fn idempotency_cache(capacity: u64) -> Cache<String, H256> {
    Cache::builder()
        .max_capacity(capacity)
        .time_to_live(IDEMPOTENCY_TTL)
        .eviction_policy(EvictionPolicy::lru())
        .build()
}

pub struct SpendLogger {
    ledger: Arc<dyn SpendLedger>,
    sequencer: Arc<NonceSequencer>,
    /// Idempotency key -> tx hash of the submission that used it
    submitted: Cache<String, H256>,
}

impl SpendLogger {
    /// Create a logger with its own sequencer for the ledger's signer
    pub fn new<L: SpendLedger + 'static>(ledger: Arc<L>) -> Self {
        let source: Arc<dyn TransactionCountSource> = ledger.clone();
        let sequencer = Arc::new(NonceSequencer::new(ledger.signer_address(), source));
        Self {
            ledger,
            sequencer,
            submitted: idempotency_cache(IDEMPOTENCY_CAPACITY),
        }
    }

    pub async fn log_spend(&self, step_id: &str, amount: Price, memo: &str) -> Result<H256, SpendLogError> {
        self.log_spend_once(step_id, amount, memo, None).await
    }

    /// Log a spend. With an idempotency key, a key that already produced a
    /// transaction in this process returns that hash instead of resubmitting.
    ///
    /// Failures are logged here and returned; they must never undo the
    /// payment that triggered the log.
    pub async fn log_spend_once(
        &self,
        step_id: &str,
        amount: Price,
        memo: &str,
        idempotency_key: Option<&str>,
    ) -> Result<H256, SpendLogError> {
        let record = SpendRecord {
            step_id: step_id.to_string(),
            amount,
            memo: memo.to_string(),
            payer: self.ledger.signer_address(),
            idempotency_key: idempotency_key.map(str::to_string),
        };

        log::info!(
            "[SpendRegistry] Logging spend: {}, {} minor units, {}",
            record.step_id,
            record.amount.minor_units(),
            record.memo
        );

        let mut lease = self.sequencer.lease().await;

        // Checked under the lease so two callers with one key cannot both submit
        if let Some(key) = record.idempotency_key.as_deref() {
            if let Some(existing) = self.submitted.get(key) {
                log::info!("[SpendRegistry] Spend '{}' already logged in tx {:?}", key, existing);
                return Ok(existing);
            }
        }

        let nonce = match lease.next().await {
            Ok(nonce) => nonce,
            Err(e) => {
                log::error!("[SpendRegistry] Failed to log spend: {}", e);
                return Err(e.into());
            }
        };

        match self.ledger.submit_log_spend(&record, nonce).await {
            Ok(tx_hash) => {
                if let Some(key) = record.idempotency_key {
                    self.submitted.insert(key, tx_hash);
                }
                log::info!("[SpendRegistry] Spend logged. Tx: {:?} (nonce {})", tx_hash, nonce);
                Ok(tx_hash)
            }
            Err(reason) => {
                // The node may or may not have seen it; re-sync before the next one
                lease.invalidate();
                log::error!("[SpendRegistry] Failed to log spend with nonce {}: {}", nonce, reason);
                Err(SpendLogError::Submission { nonce, reason })
            }
        }
    }
}
