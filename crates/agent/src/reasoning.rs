//! The reasoning step: one model backend call per turn.

use std::sync::Arc;

use stockclaw_core::error::Result;
use stockclaw_core::event::{DomainEvent, EventBus};
use stockclaw_core::provider::{Provider, ProviderRequest, ToolDefinition};
use stockclaw_core::session::Session;
use stockclaw_core::tool::ToolRegistry;
use tracing::{debug, warn};

pub struct ReasoningStep {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    /// Sent with every request, in registry order
    definitions: Vec<ToolDefinition>,
    event_bus: Arc<EventBus>,
}

impl ReasoningStep {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: &ToolRegistry,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
            max_tokens: None,
            definitions: tools.definitions(),
            event_bus,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the backend for the next assistant message and append it.
    ///
    /// No retry: any backend failure fails the step and leaves the log as it was.
    pub async fn reason(&self, session: &mut Session) -> Result<()> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: session.log.messages().to_vec(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: self.definitions.clone(),
        };

        let response = self.provider.complete(request).await.inspect_err(|e| {
            warn!(session_id = %session.id, provider = self.provider.name(), error = %e, "Backend call failed");
        })?;

        let tool_calls = response.message.tool_calls.len();
        session.log.push_assistant(response.message)?;
        let turn = session.record_turn();

        debug!(session_id = %session.id, turn, tool_calls, "Reasoning step complete");

        if let Some(usage) = &response.usage {
            self.event_bus.publish(DomainEvent::ResponseGenerated {
                session_id: session.id.to_string(),
                model: response.model.clone(),
                tool_calls,
                tokens_used: usage.total_tokens,
                timestamp: chrono::Utc::now(),
            });
        }

        Ok(())
    }
}
