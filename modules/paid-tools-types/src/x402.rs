//! x402 Protocol data types
//!
//! Shared by the paying agent and the paid tools server. Header values are
//! base64-encoded JSON.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// x402 protocol version
pub const X402_VERSION: u8 = 2;

/// The only payment scheme this workspace signs and verifies
pub const SCHEME_EXACT: &str = "exact";

/// Server -> client: accepted payment options
pub const PAYMENT_REQUIRED_HEADER: &str = "payment-required";

/// Client -> server: signed payment payload
pub const PAYMENT_HEADER: &str = "x-payment";

/// Server -> client: settlement result on the paid response
pub const PAYMENT_RESPONSE_HEADER: &str = "payment-response";

/// Payment requirements returned by server in 402 response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequired {
    pub x402_version: u8,
    pub accepts: Vec<PaymentRequirements>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    pub scheme: String,
    pub network: String,
    /// Amount in the asset's minor units, decimal string
    pub max_amount_required: String,
    pub pay_to_address: String,
    pub asset: String,
    #[serde(default)]
    pub max_timeout_seconds: u64,
    /// Step the payment unlocks
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// EIP-712 domain name/version of the asset contract
    #[serde(default)]
    pub extra: Option<AssetDomain>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDomain {
    pub name: String,
    pub version: String,
}

/// Payment payload sent to server with X-PAYMENT header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    pub x402_version: u8,
    pub accepted: AcceptedPayment,
    pub payload: ExactEvmPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedPayment {
    pub scheme: String,
    pub network: String,
    pub amount: String,
    pub pay_to: String,
    pub max_timeout_seconds: u64,
    pub asset: String,
    #[serde(default)]
    pub resource: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactEvmPayload {
    pub signature: String,
    pub authorization: Eip3009Authorization,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eip3009Authorization {
    pub from: String,
    pub to: String,
    pub value: String,
    pub valid_after: String,
    pub valid_before: String,
    pub nonce: String,
}

/// Settlement result attached to a successful paid response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleResponse {
    pub success: bool,
    #[serde(default)]
    pub transaction: Option<String>,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub payer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
}

/// Encode any header payload as base64 JSON
pub fn encode_header<T: Serialize>(value: &T) -> Result<String, String> {
    let json = serde_json::to_string(value)
        .map_err(|e| format!("Failed to serialize header payload: {}", e))?;
    Ok(STANDARD.encode(json))
}

/// Decode a base64 JSON header payload
pub fn decode_header<T: DeserializeOwned>(encoded: &str) -> Result<T, String> {
    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|e| format!("Failed to decode header: {}", e))?;
    let json = String::from_utf8(decoded)
        .map_err(|e| format!("Invalid UTF-8 in header: {}", e))?;
    serde_json::from_str(&json).map_err(|e| format!("Failed to parse header payload: {}", e))
}

impl PaymentPayload {
    /// Encode payment payload to base64 for X-PAYMENT header
    pub fn to_base64(&self) -> Result<String, String> {
        encode_header(self)
    }

    pub fn from_base64(encoded: &str) -> Result<Self, String> {
        decode_header(encoded)
    }
}

impl PaymentRequired {
    pub fn to_base64(&self) -> Result<String, String> {
        encode_header(self)
    }

    /// Decode payment requirements from base64 PAYMENT-REQUIRED header
    pub fn from_base64(encoded: &str) -> Result<Self, String> {
        decode_header(encoded)
    }
}

impl SettleResponse {
    pub fn to_base64(&self) -> Result<String, String> {
        encode_header(self)
    }

    pub fn from_base64(encoded: &str) -> Result<Self, String> {
        decode_header(encoded)
    }
}

/// Extract the numeric chain id from a CAIP-2 network id ("eip155:8453")
pub fn parse_eip155_chain_id(network: &str) -> Result<u64, String> {
    let id = network
        .strip_prefix("eip155:")
        .ok_or_else(|| format!("Unsupported network '{}'", network))?;
    id.parse()
        .map_err(|_| format!("Invalid chain id in network '{}'", network))
}

pub fn eip155_network(chain_id: u64) -> String {
    format!("eip155:{}", chain_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_required_header_uses_camel_case() {
        let required = PaymentRequired {
            x402_version: X402_VERSION,
            accepts: vec![PaymentRequirements {
                scheme: SCHEME_EXACT.to_string(),
                network: "eip155:324705682".to_string(),
                max_amount_required: "400".to_string(),
                pay_to_address: "0x0000000000000000000000000000000000000001".to_string(),
                asset: "0x0000000000000000000000000000000000000002".to_string(),
                max_timeout_seconds: 60,
                resource: Some("quote".to_string()),
                description: None,
                extra: None,
            }],
            error: None,
        };

        let encoded = required.to_base64().unwrap();
        let raw: serde_json::Value = decode_header(&encoded).unwrap();
        assert_eq!(raw["x402Version"], 2);
        assert_eq!(raw["accepts"][0]["maxAmountRequired"], "400");
        assert_eq!(raw["accepts"][0]["payToAddress"], "0x0000000000000000000000000000000000000001");
        assert!(raw.get("error").is_none());

        assert_eq!(PaymentRequired::from_base64(&encoded).unwrap(), required);
    }

    #[test]
    fn test_decode_header_rejects_garbage() {
        assert!(PaymentPayload::from_base64("not base64!").is_err());
        // valid base64, not JSON
        assert!(PaymentPayload::from_base64("aGVsbG8=").is_err());
    }

    #[test]
    fn test_parse_eip155_chain_id() {
        assert_eq!(parse_eip155_chain_id("eip155:324705682").unwrap(), 324705682);
        assert!(parse_eip155_chain_id("solana:mainnet").is_err());
        assert!(parse_eip155_chain_id("eip155:abc").is_err());
        assert_eq!(eip155_network(8453), "eip155:8453");
    }
}
