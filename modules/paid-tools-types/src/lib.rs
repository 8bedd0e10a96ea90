//! Shared types for the paid tools service and the agents that pay for it.

pub mod eip712;
pub mod price;
pub mod x402;

pub use price::{PRICE_DECIMALS, Price};
pub use x402::*;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

// =====================================================
// Catalog
// =====================================================

/// One billable tool the server sells, priced per call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolListing {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Price,
    /// Canned result returned once the call is paid
    pub payload: Value,
}

/// The purchase chain sold by the demo shop, in execution order
pub fn default_catalog() -> Vec<ToolListing> {
    vec![
        ToolListing {
            id: "quote".to_string(),
            name: "Dynamic Price Quote".to_string(),
            description: "Dynamic price quote for cart items".to_string(),
            price: Price::from_minor_units(400),
            payload: json!({ "items": 3, "subtotal": 34, "discount": 2 }),
        },
        ToolListing {
            id: "reserve".to_string(),
            name: "Inventory Hold".to_string(),
            description: "Inventory reservation hold".to_string(),
            price: Price::from_minor_units(700),
            payload: json!({ "holds": 3, "holdMinutes": 20 }),
        },
        ToolListing {
            id: "checkout".to_string(),
            name: "Checkout Fee".to_string(),
            description: "Checkout processing fee".to_string(),
            price: Price::from_minor_units(600),
            payload: json!({ "orderId": "ord_1024", "total": 38 }),
        },
        ToolListing {
            id: "fulfill".to_string(),
            name: "Fulfillment".to_string(),
            description: "Fulfillment + shipping label".to_string(),
            price: Price::from_minor_units(500),
            payload: json!({ "shipmentId": "shp_3341", "etaDays": 3 }),
        },
    ]
}

// =====================================================
// Request / Response Bodies
// =====================================================

/// Body of a 402 response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeBody {
    pub error: String,
    pub step: String,
    pub price: Price,
    pub description: String,
    /// Some servers put the options in the body instead of the header
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accepts: Vec<PaymentRequirements>,
}

/// Body sent by the agent when calling a tool
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolRequest {
    pub item_count: u32,
    pub cart_subtotal: Price,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolReceipt {
    pub id: String,
    pub paid_at: String,
}

/// Body of a successful paid tool call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResponse {
    pub step: String,
    pub price: Price,
    pub status: String,
    pub payload: Value,
    pub receipt: ToolReceipt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub running: bool,
    pub uptime_secs: u64,
    pub settled_payments: usize,
    pub network: String,
    pub pay_to: String,
}
