//! Tool dispatch: answer every pending tool call with exactly one result.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use stockclaw_core::error::Result;
use stockclaw_core::event::{DomainEvent, EventBus};
use stockclaw_core::message::{Message, MessageToolCall};
use stockclaw_core::session::Session;
use stockclaw_core::tool::ToolRegistry;
use tracing::{debug, info};

/// How calls from one assistant message are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// All calls in flight at once; results still appended in call order.
    #[default]
    Concurrent,
    /// One call at a time, in order.
    Sequential,
}

impl DispatchMode {
    pub fn from_concurrent_flag(concurrent: bool) -> Self {
        if concurrent {
            Self::Concurrent
        } else {
            Self::Sequential
        }
    }
}

pub struct ToolDispatcher {
    tools: Arc<ToolRegistry>,
    event_bus: Arc<EventBus>,
    mode: DispatchMode,
}

impl ToolDispatcher {
    pub fn new(tools: Arc<ToolRegistry>, event_bus: Arc<EventBus>) -> Self {
        Self {
            tools,
            event_bus,
            mode: DispatchMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Execute `calls` and return one tool-result message per call, same order.
    pub async fn dispatch(&self, calls: &[MessageToolCall]) -> Vec<Message> {
        match self.mode {
            DispatchMode::Concurrent => join_all(calls.iter().map(|c| self.run_one(c))).await,
            DispatchMode::Sequential => {
                let mut results = Vec::with_capacity(calls.len());
                for call in calls {
                    results.push(self.run_one(call).await);
                }
                results
            }
        }
    }

    /// Dispatch the pending calls of the session's last assistant message
    /// and append the results. Returns how many were answered.
    pub async fn dispatch_pending(&self, session: &mut Session) -> Result<usize> {
        let calls = session.log.pending_tool_calls();
        debug!(session_id = %session.id, count = calls.len(), mode = ?self.mode, "Dispatching tool calls");

        let results = self.dispatch(&calls).await;
        let answered = results.len();
        for message in results {
            session.log.push_tool_result(message)?;
        }
        Ok(answered)
    }

    async fn run_one(&self, call: &MessageToolCall) -> Message {
        let start = Instant::now();
        let result = self.tools.execute(call).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            tool = %result.tool_name,
            call_id = %result.call_id,
            success = result.success,
            duration_ms,
            "Tool executed"
        );
        self.event_bus.publish(DomainEvent::ToolExecuted {
            tool_name: result.tool_name.clone(),
            success: result.success,
            duration_ms,
            timestamp: chrono::Utc::now(),
        });

        Message::tool_result(result.call_id, result.output, result.retryable)
    }
}
