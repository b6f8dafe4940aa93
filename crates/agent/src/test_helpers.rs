//! Shared test helpers for loop tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use stockclaw_core::error::{ProviderError, ToolError};
use stockclaw_core::message::{Message, MessageToolCall};
use stockclaw_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use stockclaw_core::tool::{Tool, ToolKind, ToolOutput, ToolRegistry};

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue and
/// records the request it was given. Panics if the script runs out.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self::scripted(responses.into_iter().map(Ok).collect())
    }

    pub fn scripted(responses: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let idx = requests.len();
        if idx >= responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{idx}, have {})",
                responses.len()
            );
        }
        requests.push(request);
        responses[idx].clone()
    }
}

/// A provider that requests inventory on every turn.
pub struct AlwaysToolsProvider {
    calls: Mutex<usize>,
}

impl AlwaysToolsProvider {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Provider for AlwaysToolsProvider {
    fn name(&self) -> &str {
        "always_tools"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        let call = MessageToolCall::new(
            format!("call_{}", *calls),
            "check_inventory",
            "{}",
        );
        Ok(make_tool_call_response(vec![call], "Let me check again."))
    }
}

/// Create a simple text response (no tool calls).
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Create a response with tool calls and optional thought content.
pub fn make_tool_call_response(tool_calls: Vec<MessageToolCall>, thought: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant_with_calls(thought, tool_calls),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Helper to create a tool call with id `call_<name>`.
pub fn make_tool_call(name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall::new(format!("call_{name}"), name, args.to_string())
}

/// A tool with a canned reply that counts its invocations.
pub struct CannedTool {
    kind: ToolKind,
    reply: ToolOutput,
    delay_ms: u64,
    invocations: Mutex<usize>,
}

impl CannedTool {
    pub fn new(kind: ToolKind, reply: ToolOutput) -> Arc<Self> {
        Arc::new(Self {
            kind,
            reply,
            delay_ms: 0,
            invocations: Mutex::new(0),
        })
    }

    pub fn slow(kind: ToolKind, reply: ToolOutput, delay_ms: u64) -> Arc<Self> {
        Arc::new(Self {
            kind,
            reply,
            delay_ms,
            invocations: Mutex::new(0),
        })
    }

    pub fn invocations(&self) -> usize {
        *self.invocations.lock().unwrap()
    }
}

#[async_trait]
impl Tool for CannedTool {
    fn kind(&self) -> ToolKind {
        self.kind
    }

    fn description(&self) -> &str {
        "canned"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        *self.invocations.lock().unwrap() += 1;
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        Ok(self.reply.clone())
    }
}

pub struct Tools {
    pub inventory: Arc<CannedTool>,
    pub policy: Arc<CannedTool>,
    pub orders: Arc<CannedTool>,
    pub registry: Arc<ToolRegistry>,
}

/// Registry whose three tools give the same replies as a low-stock warehouse
/// with an empty policy index.
pub fn low_stock_tools() -> Tools {
    tools_from(
        CannedTool::new(
            ToolKind::CheckInventory,
            ToolOutput::success(
                "Current Inventory Data:\n- ID 2: Standing Desk Pro (Stock: 3, Min: 10, Supplier: Apex Furniture)\n",
            ),
        ),
        CannedTool::new(
            ToolKind::LookupPolicy,
            ToolOutput::failure(
                "Result: No specific policy found in the database. DO NOT RETRY. Proceed with available information.",
            ),
        ),
        CannedTool::new(
            ToolKind::CreatePurchaseOrder,
            ToolOutput::success("SUCCESS: Order #42 created. Status: PENDING_APPROVAL."),
        ),
    )
}

pub fn tools_from(
    inventory: Arc<CannedTool>,
    policy: Arc<CannedTool>,
    orders: Arc<CannedTool>,
) -> Tools {
    let registry = ToolRegistry::new(inventory.clone(), policy.clone(), orders.clone()).unwrap();
    Tools {
        inventory,
        policy,
        orders,
        registry: Arc::new(registry),
    }
}
