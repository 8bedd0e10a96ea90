//! Shop agent: pays for a chain of priced tool calls over x402 and mirrors
//! each payment to an on-chain spend registry.

pub mod chain;
pub mod config;
pub mod http;
pub mod nonce;
pub mod orchestrator;
pub mod spend_registry;
pub mod wallet;
pub mod x402;

#[cfg(test)]
mod test_support;
