//! EIP-3009 signing for x402 payments

use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, H256, U256};
use ethers::utils::keccak256;
use paid_tools_types::eip712::{Eip712Domain, TransferWithAuthorization, signing_digest};
use paid_tools_types::{
    AcceptedPayment, Eip3009Authorization, ExactEvmPayload, PaymentPayload, PaymentRequirements,
    X402_VERSION, parse_eip155_chain_id,
};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::wallet::{EnvWalletProvider, WalletProvider, format_address};

/// Lifetime used when a requirement does not advertise one
const DEFAULT_TIMEOUT_SECS: u64 = 60;

const DEFAULT_ASSET_NAME: &str = "USD Coin";
const DEFAULT_ASSET_VERSION: &str = "2";

/// x402 payment signer using a local wallet
pub struct X402Signer {
    wallet: LocalWallet,
}

impl X402Signer {
    /// Create a new signer from a private key (hex string with or without 0x prefix)
    pub fn new(private_key: &str, chain_id: u64) -> Result<Self, String> {
        let provider = EnvWalletProvider::from_private_key(private_key, chain_id)?;
        Ok(Self {
            wallet: provider.wallet(),
        })
    }

    pub fn from_wallet(wallet: LocalWallet) -> Self {
        Self { wallet }
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// Generate a cryptographically secure nonce
    fn generate_nonce() -> Result<H256, String> {
        let mut bytes = [0u8; 32];
        getrandom::getrandom(&mut bytes).map_err(|e| format!("Failed to generate random bytes: {}", e))?;
        Ok(H256::from(keccak256(bytes)))
    }

    /// Sign an EIP-3009 TransferWithAuthorization for exactly the required
    /// amount, scoped to `resource`
    pub fn sign_payment(
        &self,
        requirements: &PaymentRequirements,
        resource: &str,
    ) -> Result<PaymentPayload, String> {
        let chain_id = parse_eip155_chain_id(&requirements.network)?;
        let verifying_contract: Address = requirements
            .asset
            .parse()
            .map_err(|e| format!("Invalid asset address: {}", e))?;
        let pay_to: Address = requirements
            .pay_to_address
            .parse()
            .map_err(|e| format!("Invalid pay_to_address: {}", e))?;
        let value = U256::from_dec_str(&requirements.max_amount_required)
            .map_err(|e| format!("Invalid amount: {}", e))?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| format!("Time error: {}", e))?;
        let timeout = match requirements.max_timeout_seconds {
            0 => DEFAULT_TIMEOUT_SECS,
            secs => secs,
        };
        let valid_before = now.as_secs() + timeout;

        let nonce = Self::generate_nonce()?;

        let (name, version) = match &requirements.extra {
            Some(extra) => (extra.name.clone(), extra.version.clone()),
            None => (DEFAULT_ASSET_NAME.to_string(), DEFAULT_ASSET_VERSION.to_string()),
        };
        let domain = Eip712Domain {
            name,
            version,
            chain_id,
            verifying_contract,
        };
        let message = TransferWithAuthorization {
            from: self.wallet.address(),
            to: pay_to,
            value,
            valid_after: U256::zero(),
            valid_before: U256::from(valid_before),
            nonce,
        };

        let signature = self
            .wallet
            .sign_hash(signing_digest(&domain, &message))
            .map_err(|e| format!("Failed to sign: {}", e))?;

        Ok(PaymentPayload {
            x402_version: X402_VERSION,
            accepted: AcceptedPayment {
                scheme: requirements.scheme.clone(),
                network: requirements.network.clone(),
                amount: requirements.max_amount_required.clone(),
                pay_to: requirements.pay_to_address.clone(),
                max_timeout_seconds: timeout,
                asset: requirements.asset.clone(),
                resource: Some(resource.to_string()),
            },
            payload: ExactEvmPayload {
                signature: format!("0x{}", hex::encode(signature.to_vec())),
                authorization: Eip3009Authorization {
                    from: format_address(self.wallet.address()),
                    to: format_address(pay_to),
                    value: value.to_string(),
                    valid_after: "0".to_string(),
                    valid_before: valid_before.to_string(),
                    nonce: format!("{:?}", nonce),
                },
            },
        })
    }
}
