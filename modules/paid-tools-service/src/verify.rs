//! Payment proof verification
//!
//! Checks an `x-payment` header against the tool being bought: right step,
//! right amount, right payee, inside its validity window, signed by the
//! address it claims, and never seen before. Settlement itself is mocked.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use ethers::types::{Address, H256, Signature, U256};
use ethers::utils::keccak256;
use paid_tools_types::eip712::{Eip712Domain, TransferWithAuthorization, signing_digest};
use paid_tools_types::{
    AssetDomain, PaymentPayload, PaymentRequirements, SCHEME_EXACT, ToolListing, eip155_network,
};
use std::str::FromStr;

/// Seconds a signed authorization may be in flight
const MAX_TIMEOUT_SECONDS: u64 = 60;

/// Payer clock may run ahead of ours by this much
const CLOCK_SKEW_SECONDS: u64 = 30;

/// Accepted, not yet settled on chain
#[derive(Debug, Clone)]
pub struct Settlement {
    pub payer: Address,
    /// Mock settlement reference, keccak256 of the signature
    pub reference: H256,
}

pub struct PaymentVerifier {
    chain_id: u64,
    pay_to: Address,
    asset: Address,
    asset_domain: AssetDomain,
    /// "{payer}:{nonce}" -> unix time it was settled
    used_authorizations: DashMap<String, i64>,
}

impl PaymentVerifier {
    pub fn new(chain_id: u64, pay_to: Address, asset: Address, asset_domain: AssetDomain) -> Self {
        Self {
            chain_id,
            pay_to,
            asset,
            asset_domain,
            used_authorizations: DashMap::new(),
        }
    }

    pub fn network(&self) -> String {
        eip155_network(self.chain_id)
    }

    pub fn pay_to(&self) -> Address {
        self.pay_to
    }

    pub fn settled_count(&self) -> usize {
        self.used_authorizations.len()
    }

    /// The single payment option offered for a tool
    pub fn requirements(&self, tool: &ToolListing) -> PaymentRequirements {
        PaymentRequirements {
            scheme: SCHEME_EXACT.to_string(),
            network: self.network(),
            max_amount_required: tool.price.minor_units().to_string(),
            pay_to_address: format!("{:?}", self.pay_to),
            asset: format!("{:?}", self.asset),
            max_timeout_seconds: MAX_TIMEOUT_SECONDS,
            resource: Some(tool.id.clone()),
            description: Some(tool.description.clone()),
            extra: Some(self.asset_domain.clone()),
        }
    }

    pub fn verify(&self, header: &str, tool: &ToolListing, now: u64) -> Result<Settlement, String> {
        let payment = PaymentPayload::from_base64(header)?;
        let accepted = &payment.accepted;
        let auth = &payment.payload.authorization;

        if accepted.scheme != SCHEME_EXACT {
            return Err(format!("Unsupported scheme '{}'", accepted.scheme));
        }
        if accepted.network != self.network() {
            return Err(format!("Wrong network '{}'", accepted.network));
        }
        if accepted.resource.as_deref() != Some(tool.id.as_str()) {
            return Err("Payment is for a different step".to_string());
        }

        let price = U256::from(tool.price.minor_units());
        let value = U256::from_dec_str(&auth.value).map_err(|_| "Invalid authorization value".to_string())?;
        if accepted.amount != price.to_string() || value != price {
            return Err(format!("Amount does not match price {}", tool.price));
        }

        let to = parse_address(&auth.to, "payee")?;
        if to != self.pay_to || parse_address(&accepted.pay_to, "payee")? != self.pay_to {
            return Err("Wrong payee".to_string());
        }
        if parse_address(&accepted.asset, "asset")? != self.asset {
            return Err("Wrong asset".to_string());
        }

        let valid_after = parse_u256(&auth.valid_after, "validAfter")?;
        let valid_before = parse_u256(&auth.valid_before, "validBefore")?;
        let now = U256::from(now);
        if valid_after > now {
            return Err("Authorization not yet valid".to_string());
        }
        if valid_before <= now {
            return Err("Authorization expired".to_string());
        }
        if valid_before - now > U256::from(MAX_TIMEOUT_SECONDS + CLOCK_SKEW_SECONDS) {
            return Err("Authorization valid for too long".to_string());
        }

        let from = parse_address(&auth.from, "payer")?;
        let nonce = H256::from_str(&auth.nonce).map_err(|_| "Invalid authorization nonce".to_string())?;
        let domain = Eip712Domain {
            name: self.asset_domain.name.clone(),
            version: self.asset_domain.version.clone(),
            chain_id: self.chain_id,
            verifying_contract: self.asset,
        };
        let message = TransferWithAuthorization {
            from,
            to,
            value,
            valid_after,
            valid_before,
            nonce,
        };

        let signature = Signature::from_str(&payment.payload.signature)
            .map_err(|e| format!("Invalid signature: {}", e))?;
        let signer = signature
            .recover(signing_digest(&domain, &message))
            .map_err(|e| format!("Invalid signature: {}", e))?;
        if signer != from {
            return Err("Signature does not match payer".to_string());
        }

        // Last, so a rejected proof never burns its nonce
        let key = format!("{:?}:{:?}", from, nonce);
        match self.used_authorizations.entry(key) {
            Entry::Occupied(_) => return Err("Authorization already used".to_string()),
            Entry::Vacant(slot) => {
                slot.insert(chrono::Utc::now().timestamp());
            }
        }

        Ok(Settlement {
            payer: from,
            reference: H256::from(keccak256(signature.to_vec())),
        })
    }
}

fn parse_address(value: &str, what: &str) -> Result<Address, String> {
    value.parse().map_err(|_| format!("Invalid {} address '{}'", what, value))
}

fn parse_u256(value: &str, what: &str) -> Result<U256, String> {
    U256::from_dec_str(value).map_err(|_| format!("Invalid {} '{}'", what, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use paid_tools_types::default_catalog;
    use shop_agent::x402::X402Signer;

    const PAYER_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const CHAIN_ID: u64 = 324705682;

    fn verifier() -> PaymentVerifier {
        PaymentVerifier::new(
            CHAIN_ID,
            "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".parse().unwrap(),
            "0x036CbD53842c5426634e7929541eC2318f3dCF7e".parse().unwrap(),
            AssetDomain {
                name: "USD Coin".to_string(),
                version: "2".to_string(),
            },
        )
    }

    fn tool(id: &str) -> ToolListing {
        default_catalog().into_iter().find(|t| t.id == id).unwrap()
    }

    fn now() -> u64 {
        chrono::Utc::now().timestamp() as u64
    }

    fn signed(verifier: &PaymentVerifier, tool: &ToolListing) -> PaymentPayload {
        let signer = X402Signer::new(PAYER_KEY, CHAIN_ID).unwrap();
        signer.sign_payment(&verifier.requirements(tool), &tool.id).unwrap()
    }

    fn header(payload: &PaymentPayload) -> String {
        payload.to_base64().unwrap()
    }

    #[test]
    fn test_valid_payment_settles() {
        let verifier = verifier();
        let quote = tool("quote");
        let payment = signed(&verifier, &quote);

        let settlement = verifier.verify(&header(&payment), &quote, now()).unwrap();

        assert_eq!(
            format!("{:?}", settlement.payer),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
        assert_eq!(verifier.settled_count(), 1);
    }

    #[test]
    fn test_replay_is_rejected() {
        let verifier = verifier();
        let quote = tool("quote");
        let encoded = header(&signed(&verifier, &quote));

        verifier.verify(&encoded, &quote, now()).unwrap();
        let err = verifier.verify(&encoded, &quote, now()).unwrap_err();
        assert_eq!(err, "Authorization already used");
        assert_eq!(verifier.settled_count(), 1);
    }

    #[test]
    fn test_proof_for_other_step_is_rejected() {
        let verifier = verifier();
        let payment = signed(&verifier, &tool("quote"));

        let err = verifier.verify(&header(&payment), &tool("reserve"), now()).unwrap_err();
        assert_eq!(err, "Payment is for a different step");
    }

    #[test]
    fn test_proof_for_other_amount_is_rejected() {
        let verifier = verifier();
        let mut cheap = tool("quote");
        cheap.price = paid_tools_types::Price::from_minor_units(1);
        let payment = signed(&verifier, &cheap);

        let err = verifier.verify(&header(&payment), &tool("quote"), now()).unwrap_err();
        assert!(err.starts_with("Amount does not match"), "{}", err);
    }

    #[test]
    fn test_forged_payer_is_rejected() {
        let verifier = verifier();
        let quote = tool("quote");
        let mut payment = signed(&verifier, &quote);
        payment.payload.authorization.from = "0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc".to_string();

        let err = verifier.verify(&header(&payment), &quote, now()).unwrap_err();
        assert_eq!(err, "Signature does not match payer");
        // A rejected proof does not count as settled
        assert_eq!(verifier.settled_count(), 0);
    }

    #[test]
    fn test_expired_authorization_is_rejected() {
        let verifier = verifier();
        let quote = tool("quote");
        let payment = signed(&verifier, &quote);

        let err = verifier.verify(&header(&payment), &quote, now() + 7200).unwrap_err();
        assert_eq!(err, "Authorization expired");
    }

    #[test]
    fn test_long_lived_authorization_is_rejected() {
        let verifier = verifier();
        let quote = tool("quote");
        let mut requirements = verifier.requirements(&quote);
        requirements.max_timeout_seconds = 3600;
        let signer = X402Signer::new(PAYER_KEY, CHAIN_ID).unwrap();
        let payment = signer.sign_payment(&requirements, &quote.id).unwrap();

        let err = verifier.verify(&header(&payment), &quote, now()).unwrap_err();
        assert_eq!(err, "Authorization valid for too long");
        assert_eq!(verifier.settled_count(), 0);
    }

    #[test]
    fn test_garbage_header_is_rejected() {
        assert!(verifier().verify("not base64!", &tool("quote"), now()).is_err());
    }
}
