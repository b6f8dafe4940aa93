pub mod ask;
pub mod doctor;
pub mod onboard;
pub mod serve;

use std::sync::Arc;

use stockclaw_agent::AgentLoop;
use stockclaw_config::AppConfig;
use stockclaw_core::event::EventBus;

/// Load config or explain where it is expected.
pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// Wire provider, tools and event bus into an agent loop.
pub fn build_agent(config: &AppConfig) -> Result<AgentLoop, Box<dyn std::error::Error>> {
    let router = stockclaw_providers::build_from_config(config);
    let provider = router
        .default_provider()
        .ok_or("No default provider configured")?;
    let tools = Arc::new(stockclaw_tools::build_registry(config)?);
    let event_bus = Arc::new(EventBus::default());
    Ok(AgentLoop::from_config(config, provider, tools, event_bus))
}
