//! x402-aware HTTP client

use paid_tools_types::{
    ChallengeBody, PAYMENT_HEADER, PAYMENT_REQUIRED_HEADER, PAYMENT_RESPONSE_HEADER, PaymentRequired,
    PaymentRequirements, SCHEME_EXACT, SettleResponse,
};
use reqwest::{Client, Response, StatusCode, header};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::signer::X402Signer;
use super::types::{PaidResponse, PaymentOptions, PaymentOutcome, PaymentProof, X402Error};
use crate::http::shared_client;
use crate::spend_registry::{SpendLogStatus, SpendLogger};

/// HTTP client that automatically handles the x402 payment flow.
///
/// One call makes at most two requests: the original and one paid retry.
pub struct X402Client {
    client: Client,
    signer: Arc<X402Signer>,
    /// CAIP-2 network this client pays on
    network: String,
    spend_logger: Option<Arc<SpendLogger>>,
}

impl X402Client {
    pub fn new(signer: X402Signer, network: impl Into<String>) -> Self {
        let network = network.into();
        log::info!(
            "[X402] Initialized with wallet address: {:?} on {}",
            signer.address(),
            network
        );

        Self {
            client: shared_client().clone(),
            signer: Arc::new(signer),
            network,
            spend_logger: None,
        }
    }

    /// Log every successful payment to the spend registry
    pub fn with_spend_logger(mut self, spend_logger: Arc<SpendLogger>) -> Self {
        self.spend_logger = Some(spend_logger);
        self
    }

    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    /// Make a POST request with automatic x402 payment handling
    pub async fn post_with_payment<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        options: &PaymentOptions,
    ) -> Result<PaidResponse, X402Error> {
        log::info!("[X402] Making request to {}", url);

        // First request without payment
        let initial_response = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await?;

        let status = initial_response.status();
        if status.is_success() {
            log::info!("[X402] No payment required, status: {}", status);
            return Ok(PaidResponse {
                status: status.as_u16(),
                body: read_body(initial_response).await?,
                payment: None,
            });
        }

        if status != StatusCode::PAYMENT_REQUIRED {
            let body = initial_response.text().await.unwrap_or_default();
            log::warn!("[X402] Upstream failure {} from {}", status, url);
            return Err(X402Error::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        log::info!("[X402] Received 402 Payment Required");

        let (challenge, accepts) = parse_challenge(initial_response).await?;
        let proof = self.build_proof(&challenge, &accepts, options)?;
        let payment_header_value = proof
            .payload
            .to_base64()
            .map_err(X402Error::Signing)?;

        log::info!(
            "[X402] Signed {} for '{}', retrying request with {} header",
            proof.amount,
            proof.step_id,
            PAYMENT_HEADER
        );

        // Retry with payment; same body, proof travels in the header only
        let paid_response = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(PAYMENT_HEADER, payment_header_value)
            .json(body)
            .send()
            .await?;

        let status = paid_response.status();
        log::info!("[X402] Payment sent, response status: {}", status);

        if status == StatusCode::PAYMENT_REQUIRED {
            return Err(X402Error::ChallengeRepeated {
                step: proof.step_id,
            });
        }
        if !status.is_success() {
            let body = paid_response.text().await.unwrap_or_default();
            return Err(X402Error::PaymentRejected {
                status: status.as_u16(),
                body,
            });
        }

        // Settled from here on: a broken body must not hide the payment
        let settlement = read_settlement(&paid_response);
        let spend = self.log_spend(&proof, url, options).await;
        let body = match read_body(paid_response).await {
            Ok(body) => body,
            Err(e) => {
                log::warn!("[X402] Paid response for '{}' had an unreadable body: {}", proof.step_id, e);
                Value::Null
            }
        };

        Ok(PaidResponse {
            status: status.as_u16(),
            body,
            payment: Some(PaymentOutcome {
                step_id: proof.step_id,
                amount: proof.amount,
                settlement,
                spend,
            }),
        })
    }

    /// Pick the option this client can pay and sign for exactly the
    /// challenged step and price
    pub(crate) fn build_proof(
        &self,
        challenge: &ChallengeBody,
        accepts: &[PaymentRequirements],
        options: &PaymentOptions,
    ) -> Result<PaymentProof, X402Error> {
        let requirements = self.select_requirement(accepts)?;

        if let Some(resource) = requirements.resource.as_deref() {
            if resource != challenge.step {
                return Err(X402Error::StepMismatch {
                    expected: challenge.step.clone(),
                    found: resource.to_string(),
                });
            }
        }

        let requested: u64 = requirements.max_amount_required.parse().map_err(|_| {
            X402Error::MalformedChallenge(format!(
                "invalid amount '{}'",
                requirements.max_amount_required
            ))
        })?;
        if requested != challenge.price.minor_units() {
            return Err(X402Error::PriceMismatch {
                challenged: challenge.price.minor_units(),
                requested,
            });
        }

        if let Some(limit) = options.max_amount {
            if challenge.price > limit {
                return Err(X402Error::PriceAboveLimit {
                    price: challenge.price,
                    limit,
                });
            }
        }

        let payload = self
            .signer
            .sign_payment(requirements, &challenge.step)
            .map_err(X402Error::Signing)?;

        Ok(PaymentProof {
            step_id: challenge.step.clone(),
            amount: challenge.price,
            payload,
        })
    }

    fn select_requirement<'a>(
        &self,
        accepts: &'a [PaymentRequirements],
    ) -> Result<&'a PaymentRequirements, X402Error> {
        accepts
            .iter()
            .find(|r| r.scheme == SCHEME_EXACT && r.network == self.network)
            .ok_or_else(|| X402Error::NoAcceptedScheme {
                network: self.network.clone(),
            })
    }

    async fn log_spend(&self, proof: &PaymentProof, url: &str, options: &PaymentOptions) -> SpendLogStatus {
        let Some(logger) = &self.spend_logger else {
            return SpendLogStatus::Disabled;
        };

        let memo = format!("Paid for resource: {}", url);
        let key = options
            .order_ref
            .as_ref()
            .map(|order_ref| format!("{}:{}", proof.step_id, order_ref));

        // Already logged inside; the payment outcome stands either way
        let result = logger
            .log_spend_once(&proof.step_id, proof.amount, &memo, key.as_deref())
            .await;
        SpendLogStatus::from(&result)
    }
}

/// Challenge body plus the payment options from the header, or from the
/// body when the header is absent
async fn parse_challenge(
    response: Response,
) -> Result<(ChallengeBody, Vec<PaymentRequirements>), X402Error> {
    let header_value = match response.headers().get(PAYMENT_REQUIRED_HEADER) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|e| X402Error::MalformedChallenge(format!("invalid {} header: {}", PAYMENT_REQUIRED_HEADER, e)))?
                .to_string(),
        ),
        None => None,
    };

    let text = response.text().await?;
    let challenge: ChallengeBody = serde_json::from_str(&text)
        .map_err(|e| X402Error::MalformedChallenge(format!("invalid challenge body: {}", e)))?;

    let accepts = match header_value {
        Some(encoded) => {
            PaymentRequired::from_base64(&encoded)
                .map_err(X402Error::MalformedChallenge)?
                .accepts
        }
        None => challenge.accepts.clone(),
    };

    log::info!(
        "[X402] Challenge for '{}': {} ({} option(s))",
        challenge.step,
        challenge.price,
        accepts.len()
    );

    Ok((challenge, accepts))
}

fn read_settlement(response: &Response) -> Option<SettleResponse> {
    let encoded = response.headers().get(PAYMENT_RESPONSE_HEADER)?.to_str().ok()?;
    match SettleResponse::from_base64(encoded) {
        Ok(settlement) => {
            if !settlement.success {
                log::warn!(
                    "[X402] Settlement reported failure: {}",
                    settlement.error_reason.as_deref().unwrap_or("unknown")
                );
            }
            Some(settlement)
        }
        Err(e) => {
            log::warn!("[X402] Ignoring undecodable {} header: {}", PAYMENT_RESPONSE_HEADER, e);
            None
        }
    }
}

/// JSON body, or the raw text when the server did not send JSON
async fn read_body(response: Response) -> Result<Value, X402Error> {
    let text = response.text().await?;
    if text.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
}
