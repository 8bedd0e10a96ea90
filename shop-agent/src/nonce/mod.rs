//! Transaction sequence numbers for one signing identity
//!
//! ## Flow
//! 1. The first issue in a process fetches the pending transaction count
//! 2. Every later issue hands out `last + 1` with no RPC round-trip
//! 3. Callers that submit transactions hold a `NonceLease` for the whole
//!    submission, so issuance and broadcast never interleave
//!
//! The counter is a cache of chain state. A second process signing with the
//! same key will collide with this one.

mod sequencer;

pub use sequencer::{NonceError, NonceLease, NonceSequencer, TransactionCountSource};
