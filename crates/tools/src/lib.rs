//! Tool implementations for StockClaw.
//!
//! Three tools give the agent access to the warehouse:
//! check stock, look up supplier policy, and draft purchase orders.
//! Every upstream failure comes back as text the model can read.

pub mod inventory;
pub mod models;
pub mod policy;
pub mod purchase_order;

use std::sync::Arc;
use std::time::Duration;

use stockclaw_config::AppConfig;
use stockclaw_core::error::{Error, Result};
use stockclaw_core::tool::ToolRegistry;
use tracing::{info, warn};

pub use inventory::CheckInventoryTool;
pub use policy::{
    HuggingFaceEmbedder, LookupPolicyTool, PineconeIndex, PolicyIndex, PolicyMatch,
    PolicySearchError,
};
pub use purchase_order::CreatePurchaseOrderTool;

/// An HTTP client with a whole-request timeout.
pub fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Error::Config {
            message: format!("failed to build HTTP client: {e}"),
        })
}

/// Build the policy tool, falling back to offline mode when Pinecone is not configured.
pub fn policy_tool(config: &AppConfig) -> Result<LookupPolicyTool> {
    let policy = &config.policy;
    let Some((api_key, host)) = policy.pinecone() else {
        warn!("Pinecone not configured, policy lookup runs in offline mode");
        return Ok(LookupPolicyTool::offline());
    };

    let client = http_client(policy.timeout_secs)?;
    let embedder = HuggingFaceEmbedder::new(
        client.clone(),
        &policy.embedding_url,
        &policy.embedding_model,
        policy.huggingface_token.clone(),
    );
    let index = PineconeIndex::new(client, host, api_key, embedder);
    info!(host = %host, top_k = policy.top_k, "Policy index ready");
    Ok(LookupPolicyTool::new(Arc::new(index), policy.top_k))
}

/// Create the tool registry from configuration.
pub fn build_registry(config: &AppConfig) -> Result<ToolRegistry> {
    let client = http_client(config.inventory.timeout_secs)?;
    let base_url = &config.inventory.base_url;

    ToolRegistry::new(
        Arc::new(CheckInventoryTool::new(client.clone(), base_url)),
        Arc::new(policy_tool(config)?),
        Arc::new(CreatePurchaseOrderTool::new(client, base_url)),
    )
}
