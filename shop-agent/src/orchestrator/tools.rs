//! Executes chain steps against a paid tools server

use async_trait::async_trait;
use paid_tools_types::{ToolRequest, ToolResponse};
use std::sync::Arc;

use super::runner::PaidStepExecutor;
use super::types::{PricedStep, StepReceipt};
use crate::x402::{PaymentOptions, X402Client};

/// Calls `POST {base_url}/api/tools/{step_id}` through the x402 client
pub struct ToolsEndpoint {
    client: Arc<X402Client>,
    base_url: String,
    request: ToolRequest,
}

impl ToolsEndpoint {
    pub fn new(client: Arc<X402Client>, base_url: impl Into<String>, request: ToolRequest) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request,
        }
    }

    pub fn step_url(&self, step_id: &str) -> String {
        format!("{}/api/tools/{}", self.base_url, step_id)
    }
}

#[async_trait]
impl PaidStepExecutor for ToolsEndpoint {
    async fn execute(&self, step: &PricedStep, run_id: &str) -> Result<StepReceipt, String> {
        // Never pay more than the step was priced at when the chain was planned
        let options = PaymentOptions {
            max_amount: Some(step.price),
            order_ref: Some(run_id.to_string()),
        };

        let response = self
            .client
            .post_with_payment(&self.step_url(&step.id), &self.request, &options)
            .await
            .map_err(|e| e.to_string())?;

        let mut receipt = StepReceipt::default();
        match serde_json::from_value::<ToolResponse>(response.body) {
            Ok(tool) => {
                receipt.id = Some(tool.receipt.id);
                receipt.paid_at = Some(tool.receipt.paid_at);
            }
            Err(e) => log::debug!("[Chain] '{}' returned no tool receipt: {}", step.id, e),
        }
        if let Some(payment) = response.payment {
            receipt.settlement_tx = payment.settlement_tx();
            receipt.spend_tx = payment.spend_tx();
        }
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::build_client;
    use crate::test_support::{TEST_KEY, TEST_NETWORK};
    use crate::x402::X402Signer;
    use mockito::Server;
    use paid_tools_types::Price;
    use std::time::Duration;

    fn endpoint(base_url: &str) -> ToolsEndpoint {
        let signer = X402Signer::new(TEST_KEY, 324705682).unwrap();
        let client = X402Client::new(signer, TEST_NETWORK)
            .with_http_client(build_client(Duration::from_secs(10)).unwrap());
        let client = Arc::new(client);
        ToolsEndpoint::new(client, format!("{}/", base_url), ToolRequest::default())
    }

    #[test]
    fn test_step_url() {
        let endpoint = endpoint("http://127.0.0.1:9102");
        assert_eq!(endpoint.step_url("quote"), "http://127.0.0.1:9102/api/tools/quote");
    }

    #[tokio::test]
    async fn test_receipt_taken_from_tool_response() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/tools/quote")
            .with_status(200)
            .with_body(
                r#"{"step":"quote","price":0.0004,"status":"ok","payload":{},"receipt":{"id":"rcpt_quote_1","paidAt":"2026-01-01T00:00:00Z"}}"#,
            )
            .create_async()
            .await;

        let step = PricedStep::new("quote", "Dynamic Price Quote", Price::from_minor_units(400));
        let receipt = endpoint(&server.url()).execute(&step, "run-1").await.unwrap();

        assert_eq!(receipt.id.as_deref(), Some("rcpt_quote_1"));
        assert!(receipt.spend_tx.is_none());
    }

    #[tokio::test]
    async fn test_unknown_step_is_an_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/tools/nope")
            .with_status(404)
            .with_body(r#"{"error":"Unknown step"}"#)
            .create_async()
            .await;

        let step = PricedStep::new("nope", "Nope", Price::from_minor_units(1));
        let err = endpoint(&server.url()).execute(&step, "run-1").await.unwrap_err();
        assert!(err.contains("404"));
    }
}
