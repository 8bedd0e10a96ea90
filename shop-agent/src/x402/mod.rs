//! x402 Protocol implementation for paid tool calls
//!
//! This module handles the x402 payment protocol flow:
//! 1. Make initial request
//! 2. If 402 returned, parse the challenge and payment requirements
//! 3. Sign an EIP-3009 authorization for exactly the challenged step and price
//! 4. Retry once with the X-PAYMENT header
//! 5. Hand the paid amount to the spend logger, if one is attached

mod client;
mod signer;
mod types;

pub use client::X402Client;
pub use signer::X402Signer;
pub use types::*;
