//! Axum route handlers for the paid tools API.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use chrono::Utc;
use paid_tools_types::*;
use std::sync::Arc;
use std::time::Instant;

use crate::verify::PaymentVerifier;

pub struct AppState {
    pub catalog: Vec<ToolListing>,
    pub verifier: PaymentVerifier,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(catalog: Vec<ToolListing>, verifier: PaymentVerifier) -> Self {
        Self {
            catalog,
            verifier,
            start_time: Instant::now(),
        }
    }

    fn tool(&self, step: &str) -> Option<&ToolListing> {
        self.catalog.iter().find(|t| t.id == step)
    }
}

// POST /api/tools/:step
pub async fn call_tool(
    State(state): State<Arc<AppState>>,
    Path(step): Path<String>,
    headers: HeaderMap,
) -> Response {
    let Some(tool) = state.tool(&step) else {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                error: "Unknown step".to_string(),
            }),
        )
            .into_response();
    };

    let Some(payment) = headers.get(PAYMENT_HEADER).and_then(|v| v.to_str().ok()) else {
        return challenge(&state, tool, None);
    };

    let now = Utc::now();
    let settlement = match state.verifier.verify(payment, tool, now.timestamp() as u64) {
        Ok(settlement) => settlement,
        Err(e) => {
            log::warn!("[PaidTools] Rejected payment for '{}': {}", tool.id, e);
            return challenge(&state, tool, Some(e));
        }
    };

    log::info!(
        "[PaidTools] '{}' paid {} by {:?} (ref {:?})",
        tool.id,
        tool.price,
        settlement.payer,
        settlement.reference
    );

    let body = ToolResponse {
        step: tool.id.clone(),
        price: tool.price,
        status: "ok".to_string(),
        payload: tool.payload.clone(),
        receipt: ToolReceipt {
            id: format!("rcpt_{}_{}", tool.id, now.timestamp_millis()),
            paid_at: now.to_rfc3339(),
        },
    };
    let settle = SettleResponse {
        success: true,
        transaction: Some(format!("{:?}", settlement.reference)),
        network: Some(state.verifier.network()),
        payer: Some(format!("{:?}", settlement.payer)),
        error_reason: None,
    };

    let mut response = (StatusCode::OK, Json(body)).into_response();
    attach_header(&mut response, PAYMENT_RESPONSE_HEADER, settle.to_base64());
    response
}

// GET /rpc/status
pub async fn status(State(state): State<Arc<AppState>>) -> (StatusCode, Json<ServiceStatus>) {
    (
        StatusCode::OK,
        Json(ServiceStatus {
            running: true,
            uptime_secs: state.start_time.elapsed().as_secs(),
            settled_payments: state.verifier.settled_count(),
            network: state.verifier.network(),
            pay_to: format!("{:?}", state.verifier.pay_to()),
        }),
    )
}

/// 402 with the challenge in the body and the payment options in the
/// `payment-required` header
fn challenge(state: &AppState, tool: &ToolListing, error: Option<String>) -> Response {
    let requirements = state.verifier.requirements(tool);
    let required = PaymentRequired {
        x402_version: X402_VERSION,
        accepts: vec![requirements],
        error: error.clone(),
    };
    let body = ChallengeBody {
        error: error.unwrap_or_else(|| "Payment required".to_string()),
        step: tool.id.clone(),
        price: tool.price,
        description: tool.description.clone(),
        accepts: vec![],
    };

    let mut response = (StatusCode::PAYMENT_REQUIRED, Json(body)).into_response();
    attach_header(&mut response, PAYMENT_REQUIRED_HEADER, required.to_base64());
    response
}

fn attach_header(response: &mut Response, name: &'static str, encoded: Result<String, String>) {
    match encoded.and_then(|v| HeaderValue::from_str(&v).map_err(|e| e.to_string())) {
        Ok(value) => {
            response.headers_mut().insert(name, value);
        }
        Err(e) => log::error!("[PaidTools] Failed to build {} header: {}", name, e),
    }
}
