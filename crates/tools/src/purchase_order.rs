//! Purchase-order tool: drafts an order on the ordering service.
//!
//! Orders are created in `PENDING_APPROVAL`; a human approves them later.

use async_trait::async_trait;
use stockclaw_core::error::ToolError;
use stockclaw_core::tool::{Tool, ToolKind, ToolOutput};
use tracing::{info, warn};

use crate::models::{NewOrder, PurchaseOrder};

pub struct CreatePurchaseOrderTool {
    client: reqwest::Client,
    base_url: String,
}

impl CreatePurchaseOrderTool {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

/// Read an integer argument, tolerating models that quote numbers or send `20.0`.
fn integer_arg(arguments: &serde_json::Value, key: &str) -> Result<i64, ToolError> {
    let value = &arguments[key];
    value
        .as_i64()
        .or_else(|| value.as_f64().and_then(whole_number))
        .or_else(|| {
            let s = value.as_str()?.trim();
            s.parse::<i64>().ok().or_else(|| s.parse::<f64>().ok().and_then(whole_number))
        })
        .ok_or_else(|| ToolError::InvalidArguments(format!("Missing or non-integer '{key}'")))
}

fn whole_number(f: f64) -> Option<i64> {
    (f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

#[async_trait]
impl Tool for CreatePurchaseOrderTool {
    fn kind(&self) -> ToolKind {
        ToolKind::CreatePurchaseOrder
    }

    fn description(&self) -> &str {
        "Drafts a purchase order for a specific product. Requires product_id and quantity. \
         The order is created pending human approval."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "product_id": {
                    "type": "integer",
                    "description": "The product ID from the inventory data"
                },
                "quantity": {
                    "type": "integer",
                    "description": "Number of units to order (at least 1)",
                    "minimum": 1
                },
                "reasoning": {
                    "type": "string",
                    "description": "Why this order is needed"
                }
            },
            "required": ["product_id", "quantity", "reasoning"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let product_id = integer_arg(&arguments, "product_id")?;
        let quantity = integer_arg(&arguments, "quantity")?;
        if quantity < 1 {
            return Err(ToolError::InvalidArguments(format!(
                "quantity must be at least 1, got {quantity}"
            )));
        }
        let reasoning = arguments["reasoning"].as_str().unwrap_or_default();
        info!(product_id, quantity, reasoning, "create_purchase_order");

        let response = match self
            .client
            .post(format!("{}/orders", self.base_url))
            .json(&NewOrder {
                product_id,
                quantity,
            })
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Ordering service unreachable");
                return Ok(ToolOutput::failure(format!("Error creating order: {e}")));
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Ok(ToolOutput::failure(format!(
                "Failed to create order. Status: {}",
                status.as_u16()
            )));
        }

        match response.json::<PurchaseOrder>().await {
            Ok(order) => Ok(ToolOutput::success(format!(
                "SUCCESS: Order #{} created. Status: {}.",
                order.id, order.status
            ))),
            Err(e) => Ok(ToolOutput::failure(format!("Error creating order: {e}"))),
        }
    }
}
