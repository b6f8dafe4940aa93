//! Tool trait and the fixed Tool Registry.
//!
//! The agent has exactly three capabilities: inventory lookup, policy
//! lookup and purchase-order creation. They are identified by [`ToolKind`],
//! a closed enum, so the registry can hold one handle per kind and every
//! lookup is an exhaustive match instead of a string-keyed map.
//!
//! Executing a call through the registry never fails: unknown names, bad
//! arguments and tool errors all come back as a [`ToolResult`] whose text
//! tells the model not to retry.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, ToolError};
use crate::message::MessageToolCall;
use crate::provider::ToolDefinition;

/// The closed set of tools the model may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    CheckInventory,
    LookupPolicy,
    CreatePurchaseOrder,
}

impl ToolKind {
    /// Every kind, in the order definitions are presented to the model.
    pub const ALL: [ToolKind; 3] = [
        ToolKind::CheckInventory,
        ToolKind::LookupPolicy,
        ToolKind::CreatePurchaseOrder,
    ];

    /// The wire name the model uses in tool calls.
    pub const fn name(self) -> &'static str {
        match self {
            ToolKind::CheckInventory => "check_inventory",
            ToolKind::LookupPolicy => "lookup_policy",
            ToolKind::CreatePurchaseOrder => "create_purchase_order",
        }
    }

    /// Resolve a wire name. Exact match only.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ToolKind {
    type Err = ToolError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ToolError::NotFound(s.to_string()))
    }
}

/// What a tool hands back: always a string for the model, plus annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Text shown to the model
    pub content: String,

    /// Whether the tool did what was asked
    pub success: bool,

    /// Whether repeating the call could plausibly produce a different result
    pub retryable: bool,
}

impl ToolOutput {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            success: true,
            retryable: false,
        }
    }

    /// A failure the model should not try to repeat.
    pub fn failure(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            success: false,
            retryable: false,
        }
    }
}

/// A tool call whose name has been resolved and whose arguments parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    /// Call ID from the model's request
    pub id: String,

    pub kind: ToolKind,

    pub arguments: serde_json::Value,
}

impl ToolCall {
    /// Resolve the raw call emitted by the model.
    ///
    /// An empty argument string is treated as `{}`; some backends send that
    /// for tools whose parameters are all optional.
    pub fn resolve(raw: &MessageToolCall) -> std::result::Result<Self, ToolError> {
        let kind: ToolKind = raw.name.parse()?;
        let arguments = if raw.arguments.trim().is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(&raw.arguments)
                .map_err(|e| ToolError::InvalidArguments(format!("arguments are not valid JSON: {e}")))?
        };
        if !arguments.is_object() {
            return Err(ToolError::InvalidArguments(
                "arguments must be a JSON object".into(),
            ));
        }
        Ok(Self {
            id: raw.id.clone(),
            kind,
            arguments,
        })
    }
}

/// The outcome of one call routed through the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result is for
    pub call_id: String,

    /// Name as requested by the model (may not be a known tool)
    pub tool_name: String,

    pub success: bool,

    pub retryable: bool,

    /// The output content
    pub output: String,
}

/// One of the three tool implementations.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Which slot of the registry this tool fills.
    fn kind(&self) -> ToolKind;

    /// The wire name (e.g., "check_inventory").
    fn name(&self) -> &str {
        self.kind().name()
    }

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool.
    ///
    /// Upstream failures (network, non-2xx, empty results) must be returned
    /// as `Ok(ToolOutput::failure(..))` with text that discourages a retry.
    /// `Err` is reserved for arguments the tool cannot work with.
    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<ToolOutput, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// The fixed catalog of callable tools, built once at startup.
pub struct ToolRegistry {
    inventory: Arc<dyn Tool>,
    policy: Arc<dyn Tool>,
    purchase_orders: Arc<dyn Tool>,
}

impl ToolRegistry {
    /// Build the registry. Each handle must report the kind of its slot.
    pub fn new(
        inventory: Arc<dyn Tool>,
        policy: Arc<dyn Tool>,
        purchase_orders: Arc<dyn Tool>,
    ) -> Result<Self> {
        let slots = [
            (ToolKind::CheckInventory, &inventory),
            (ToolKind::LookupPolicy, &policy),
            (ToolKind::CreatePurchaseOrder, &purchase_orders),
        ];
        for (expected, tool) in slots {
            if tool.kind() != expected {
                return Err(Error::Config {
                    message: format!(
                        "tool registered as {expected} reports kind {}",
                        tool.kind()
                    ),
                });
            }
        }
        Ok(Self {
            inventory,
            policy,
            purchase_orders,
        })
    }

    /// Get the tool for a kind.
    pub fn get(&self, kind: ToolKind) -> &dyn Tool {
        match kind {
            ToolKind::CheckInventory => self.inventory.as_ref(),
            ToolKind::LookupPolicy => self.policy.as_ref(),
            ToolKind::CreatePurchaseOrder => self.purchase_orders.as_ref(),
        }
    }

    /// Get all tool definitions (for sending to the LLM), in fixed order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        ToolKind::ALL
            .iter()
            .map(|k| self.get(*k).to_definition())
            .collect()
    }

    /// List all tool names.
    pub fn names(&self) -> Vec<&'static str> {
        ToolKind::ALL.iter().map(|k| k.name()).collect()
    }

    /// Execute a raw tool call. Never returns an error.
    pub async fn execute(&self, raw: &MessageToolCall) -> ToolResult {
        let outcome = match ToolCall::resolve(raw) {
            Ok(call) => self
                .get(call.kind)
                .execute(call.arguments)
                .await
                .unwrap_or_else(|e| self.describe_error(&raw.name, &e)),
            Err(e) => self.describe_error(&raw.name, &e),
        };

        ToolResult {
            call_id: raw.id.clone(),
            tool_name: raw.name.clone(),
            success: outcome.success,
            retryable: outcome.retryable,
            output: outcome.content,
        }
    }

    fn describe_error(&self, tool_name: &str, err: &ToolError) -> ToolOutput {
        let text = match err {
            ToolError::NotFound(name) => format!(
                "Error: Unknown tool '{name}'. Available tools: {}. DO NOT RETRY.",
                self.names().join(", ")
            ),
            ToolError::InvalidArguments(reason) => {
                format!("Error: Invalid arguments for '{tool_name}': {reason}. DO NOT RETRY.")
            }
            ToolError::ExecutionFailed { reason, .. } => {
                format!("Error: '{tool_name}' failed: {reason}. DO NOT RETRY.")
            }
        };
        ToolOutput::failure(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A fake tool that echoes its arguments or fails on demand.
    struct FakeTool {
        kind: ToolKind,
    }

    #[async_trait]
    impl Tool for FakeTool {
        fn kind(&self) -> ToolKind {
            self.kind
        }
        fn description(&self) -> &str {
            "fake"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({ "type": "object", "properties": {} })
        }
        async fn execute(
            &self,
            arguments: serde_json::Value,
        ) -> std::result::Result<ToolOutput, ToolError> {
            if arguments.get("explode").is_some() {
                return Err(ToolError::ExecutionFailed {
                    tool_name: self.kind.name().into(),
                    reason: "boom".into(),
                });
            }
            Ok(ToolOutput::success(format!("{} ran with {arguments}", self.kind)))
        }
    }

    fn registry() -> ToolRegistry {
        ToolRegistry::new(
            Arc::new(FakeTool { kind: ToolKind::CheckInventory }),
            Arc::new(FakeTool { kind: ToolKind::LookupPolicy }),
            Arc::new(FakeTool { kind: ToolKind::CreatePurchaseOrder }),
        )
        .unwrap()
    }

    #[test]
    fn kind_names_roundtrip() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
        }
        assert!(ToolKind::from_name("Check_Inventory").is_none());
        assert!("order_pizza".parse::<ToolKind>().is_err());
    }

    #[test]
    fn mismatched_slot_rejected() {
        let result = ToolRegistry::new(
            Arc::new(FakeTool { kind: ToolKind::LookupPolicy }),
            Arc::new(FakeTool { kind: ToolKind::LookupPolicy }),
            Arc::new(FakeTool { kind: ToolKind::CreatePurchaseOrder }),
        );
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn definitions_in_fixed_order() {
        let names: Vec<String> = registry()
            .definitions()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(
            names,
            vec!["check_inventory", "lookup_policy", "create_purchase_order"]
        );
    }

    #[test]
    fn empty_arguments_resolve_to_object() {
        let call = ToolCall::resolve(&MessageToolCall::new("c1", "check_inventory", "")).unwrap();
        assert_eq!(call.kind, ToolKind::CheckInventory);
        assert!(call.arguments.as_object().unwrap().is_empty());
    }

    #[tokio::test]
    async fn execute_known_tool() {
        let result = registry()
            .execute(&MessageToolCall::new("c1", "lookup_policy", r#"{"query":"apex"}"#))
            .await;
        assert!(result.success);
        assert_eq!(result.call_id, "c1");
        assert!(result.output.contains("apex"));
    }

    #[tokio::test]
    async fn unknown_tool_becomes_result() {
        let result = registry()
            .execute(&MessageToolCall::new("c9", "order_pizza", "{}"))
            .await;
        assert!(!result.success);
        assert!(!result.retryable);
        assert_eq!(result.call_id, "c9");
        assert!(result.output.contains("Unknown tool 'order_pizza'"));
        assert!(result.output.contains("DO NOT RETRY"));
    }

    #[tokio::test]
    async fn malformed_arguments_become_result() {
        let result = registry()
            .execute(&MessageToolCall::new("c2", "check_inventory", "{not json"))
            .await;
        assert!(!result.success);
        assert!(result.output.contains("Invalid arguments for 'check_inventory'"));
    }

    #[tokio::test]
    async fn tool_error_becomes_result() {
        let result = registry()
            .execute(&MessageToolCall::new(
                "c3",
                "create_purchase_order",
                r#"{"explode":true}"#,
            ))
            .await;
        assert!(!result.success);
        assert!(result.output.contains("boom"));
    }
}
