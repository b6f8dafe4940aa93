//! Message and MessageLog domain types.
//!
//! These are the value objects threaded through the agent loop:
//! user asks → model reasons → tools execute → model answers.
//!
//! The [`MessageLog`] is append-only. Its API is the only way to grow a
//! conversation, and it refuses any append that would break the ordering
//! invariants the model backend relies on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The model
    Assistant,
    /// Persona and operating rules
    System,
    /// Tool execution result
    Tool,
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content (may be empty when an assistant only requests tools)
    pub content: String,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,

    /// If this is a tool result, which tool call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// For tool results: whether repeating the same call could plausibly help
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, content: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            tool_calls: Vec::new(),
            tool_call_id: None,
            retryable: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content.into())
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content.into())
    }

    /// Create an assistant message that requests tool calls.
    pub fn assistant_with_calls(content: impl Into<String>, calls: Vec<MessageToolCall>) -> Self {
        let mut msg = Self::assistant(content);
        msg.tool_calls = calls;
        msg
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content.into())
    }

    /// Create a tool result message.
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        content: impl Into<String>,
        retryable: bool,
    ) -> Self {
        let mut msg = Self::with_role(Role::Tool, content.into());
        msg.tool_call_id = Some(tool_call_id.into());
        msg.retryable = Some(retryable);
        msg
    }

    /// Whether this assistant message asks for at least one tool call.
    pub fn requests_tools(&self) -> bool {
        self.role == Role::Assistant && !self.tool_calls.is_empty()
    }
}

/// A tool call embedded in an assistant message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageToolCall {
    /// Unique ID for this tool call
    pub id: String,

    /// Name of the tool to invoke, exactly as the model emitted it
    pub name: String,

    /// Arguments as JSON string
    pub arguments: String,
}

impl MessageToolCall {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// The append-only, ordered record of one conversation.
///
/// Invariants:
/// - the first message is the only system message;
/// - a tool result answers exactly one earlier, still-unanswered tool call;
/// - no user or assistant message is appended while tool calls are unanswered.
#[derive(Debug, Clone, Serialize)]
pub struct MessageLog {
    messages: Vec<Message>,

    /// Call ids requested by assistant messages that have no result yet.
    #[serde(skip)]
    unanswered: Vec<String>,
}

impl MessageLog {
    /// Start a log with the persona/instructions message in first position.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
            unanswered: Vec::new(),
        }
    }

    /// Append a user message.
    pub fn push_user(&mut self, content: impl Into<String>) -> Result<()> {
        self.ensure_no_unanswered("user message")?;
        self.messages.push(Message::user(content));
        Ok(())
    }

    /// Append an assistant message returned by the model backend.
    pub fn push_assistant(&mut self, message: Message) -> Result<()> {
        if message.role != Role::Assistant {
            return Err(Error::LogViolation(format!(
                "expected an assistant message, got {:?}",
                message.role
            )));
        }
        self.ensure_no_unanswered("assistant message")?;
        self.unanswered
            .extend(message.tool_calls.iter().map(|tc| tc.id.clone()));
        self.messages.push(message);
        Ok(())
    }

    /// Append a tool result. Its call id must match an unanswered tool call.
    pub fn push_tool_result(&mut self, message: Message) -> Result<()> {
        if message.role != Role::Tool {
            return Err(Error::LogViolation(format!(
                "expected a tool result, got {:?}",
                message.role
            )));
        }
        let call_id = message.tool_call_id.as_deref().ok_or_else(|| {
            Error::LogViolation("tool result carries no tool_call_id".into())
        })?;
        let Some(pos) = self.unanswered.iter().position(|id| id == call_id) else {
            return Err(Error::LogViolation(format!(
                "tool result for '{call_id}' does not answer any pending tool call"
            )));
        };
        self.unanswered.remove(pos);
        self.messages.push(message);
        Ok(())
    }

    fn ensure_no_unanswered(&self, what: &str) -> Result<()> {
        if self.unanswered.is_empty() {
            Ok(())
        } else {
            Err(Error::LogViolation(format!(
                "cannot append {what}: {} tool call(s) still unanswered",
                self.unanswered.len()
            )))
        }
    }

    /// All messages in order, system message first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The most recent message. A log is never empty.
    pub fn last(&self) -> &Message {
        // `new` seeds the system message and nothing ever removes it.
        &self.messages[self.messages.len() - 1]
    }

    /// The leading system message.
    pub fn system(&self) -> &Message {
        &self.messages[0]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The most recent assistant message, if the model has spoken yet.
    pub fn last_assistant(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::Assistant)
    }

    /// Tool calls of the last assistant message that have not been answered.
    pub fn pending_tool_calls(&self) -> Vec<MessageToolCall> {
        let Some(last) = self.last_assistant() else {
            return Vec::new();
        };
        last.tool_calls
            .iter()
            .filter(|tc| self.unanswered.contains(&tc.id))
            .cloned()
            .collect()
    }
}
