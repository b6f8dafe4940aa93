//! Inventory lookup tool: reads every product from the inventory service.

use std::fmt::Write as _;

use async_trait::async_trait;
use stockclaw_core::error::ToolError;
use stockclaw_core::tool::{Tool, ToolKind, ToolOutput};
use tracing::{debug, warn};

use crate::models::Product;

pub struct CheckInventoryTool {
    client: reqwest::Client,
    base_url: String,
}

impl CheckInventoryTool {
    /// `base_url` is the service API root, e.g. `http://core-service:8080/api`.
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Render the product list the way the model is prompted to read it.
pub fn render_report(products: &[Product]) -> String {
    let mut report = String::from("Current Inventory Data:\n");
    for p in products {
        let _ = writeln!(
            report,
            "- ID {}: {} (Stock: {}, Min: {}, Supplier: {})",
            p.id, p.name, p.stock_quantity, p.min_stock_level, p.supplier.name
        );
    }
    report
}

#[async_trait]
impl Tool for CheckInventoryTool {
    fn kind(&self) -> ToolKind {
        ToolKind::CheckInventory
    }

    fn description(&self) -> &str {
        "Checks the current stock levels of products in the warehouse. Returns every product \
         with its ID, stock quantity, minimum stock level and supplier."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "product_name": {
                    "type": "string",
                    "description": "Optional product name the user is asking about"
                }
            }
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        // The full catalog is always fetched; the name only shows up in logs.
        let product_name = arguments["product_name"].as_str().unwrap_or("<all>");
        debug!(product_name, "check_inventory");

        let url = format!("{}/products", self.base_url);
        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, url = %url, "Inventory service unreachable");
                return Ok(ToolOutput::failure(format!(
                    "System Error: Cannot connect to Inventory Database at {}. \
                     Is the inventory service running? DO NOT RETRY.",
                    self.base_url
                )));
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Inventory service returned error");
            return Ok(ToolOutput::failure(format!(
                "Error: Failed to fetch inventory (Status {}). DO NOT RETRY.",
                status.as_u16()
            )));
        }

        match response.json::<Vec<Product>>().await {
            Ok(products) => {
                let low_stock = products.iter().filter(|p| p.is_below_threshold()).count();
                debug!(count = products.len(), low_stock, "Inventory fetched");
                Ok(ToolOutput::success(render_report(&products)))
            }
            Err(e) => {
                warn!(error = %e, "Inventory response did not parse");
                Ok(ToolOutput::failure(
                    "Error: Inventory service returned an unreadable response. DO NOT RETRY.",
                ))
            }
        }
    }
}
