use async_trait::async_trait;
use ethers::types::{Address, U256};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};

use crate::chain::EvmRpc;

/// Maximum time a lease can be held before warning
const LEASE_HOLD_WARNING_SECS: u64 = 60;

/// Authoritative source of an address's transaction count
#[async_trait]
pub trait TransactionCountSource: Send + Sync {
    async fn transaction_count(&self, address: Address) -> Result<U256, String>;
}

#[async_trait]
impl TransactionCountSource for EvmRpc {
    async fn transaction_count(&self, address: Address) -> Result<U256, String> {
        self.get_transaction_count(address).await
    }
}

#[derive(Debug, Error)]
pub enum NonceError {
    #[error("failed to fetch transaction count for {address:?}: {reason}")]
    Fetch { address: Address, reason: String },
    #[error("transaction sequence number overflow")]
    Overflow,
}

/// Issues strictly increasing nonces for one address.
///
/// Construct one per signing identity per process and share it behind an
/// `Arc`. The internal tokio mutex is fair, so waiters are served in FIFO
/// order.
pub struct NonceSequencer {
    address: Address,
    source: Arc<dyn TransactionCountSource>,
    /// Last issued nonce; `None` until synced from the source
    last_issued: Mutex<Option<U256>>,
}

impl NonceSequencer {
    pub fn new(address: Address, source: Arc<dyn TransactionCountSource>) -> Self {
        Self {
            address,
            source,
            last_issued: Mutex::new(None),
        }
    }

    /// Enter the critical section. Blocks behind earlier leases.
    pub async fn lease(&self) -> NonceLease<'_> {
        let last_issued = self.last_issued.lock().await;
        NonceLease {
            address: self.address,
            source: self.source.as_ref(),
            last_issued,
            acquired_at: Instant::now(),
        }
    }

    /// Issue the next nonce and release the critical section immediately
    pub async fn acquire_next(&self) -> Result<U256, NonceError> {
        self.lease().await.next().await
    }

    /// Last issued nonce, if any
    #[cfg(test)]
    pub(crate) async fn peek(&self) -> Option<U256> {
        *self.last_issued.lock().await
    }
}

/// Exclusive hold on a sequencer. Released when dropped.
pub struct NonceLease<'a> {
    address: Address,
    source: &'a dyn TransactionCountSource,
    last_issued: MutexGuard<'a, Option<U256>>,
    acquired_at: Instant,
}

impl NonceLease<'_> {
    /// Issue the next nonce. Syncs from the source on first use; a failed
    /// sync leaves the counter unset so the next call retries.
    pub async fn next(&mut self) -> Result<U256, NonceError> {
        let nonce = match *self.last_issued {
            Some(last) => last.checked_add(U256::one()).ok_or(NonceError::Overflow)?,
            None => {
                let count = self
                    .source
                    .transaction_count(self.address)
                    .await
                    .map_err(|reason| NonceError::Fetch {
                        address: self.address,
                        reason,
                    })?;
                log::info!("[Nonce] Synced {:?} from chain at nonce {}", self.address, count);
                count
            }
        };

        *self.last_issued = Some(nonce);
        Ok(nonce)
    }

    /// Forget the cached counter; the next issue re-syncs from the source.
    /// Use after a submission whose outcome on chain is unknown.
    pub fn invalidate(&mut self) {
        if let Some(last) = self.last_issued.take() {
            log::warn!("[Nonce] Invalidated counter for {:?} (last issued {})", self.address, last);
        }
    }

    #[cfg(test)]
    pub(crate) fn last_issued(&self) -> Option<U256> {
        *self.last_issued
    }
}

impl Drop for NonceLease<'_> {
    fn drop(&mut self) {
        let held = self.acquired_at.elapsed();
        if held.as_secs() > LEASE_HOLD_WARNING_SECS {
            log::warn!(
                "[Nonce] Lease for {:?} held for {} seconds (unusually long)",
                self.address,
                held.as_secs()
            );
        }
    }
}
