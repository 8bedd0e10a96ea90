//! SpendRegistry ABI encoding
//!
//! Manual ABI encoding for the one write entrypoint, without the abigen! macro:
//!
//! ```solidity
//! function logSpend(string calldata stepId, uint256 amount, string calldata memo) external;
//! event SpendLogged(address indexed payer, string stepId, uint256 amount, string memo);
//! ```

use ethers::abi::Token;
use ethers::types::U256;
use ethers::utils::keccak256;
use once_cell::sync::Lazy;

pub const LOG_SPEND_SIGNATURE: &str = "logSpend(string,uint256,string)";

/// Function selector for logSpend(string,uint256,string)
pub static LOG_SPEND_SELECTOR: Lazy<[u8; 4]> = Lazy::new(|| {
    let hash = keccak256(LOG_SPEND_SIGNATURE.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
});

/// Encode a logSpend(stepId, amount, memo) call
pub fn encode_log_spend(step_id: &str, amount: U256, memo: &str) -> Vec<u8> {
    let mut data = LOG_SPEND_SELECTOR.to_vec();
    data.extend_from_slice(&ethers::abi::encode(&[
        Token::String(step_id.to_string()),
        Token::Uint(amount),
        Token::String(memo.to_string()),
    ]));
    data
}
