//! # StockClaw Core
//!
//! Domain types, traits, and error definitions for the StockClaw supply-chain
//! agent. This crate has **no framework dependencies**; it defines the
//! domain model that the provider, tool, agent and gateway crates implement
//! against.
//!
//! ## Design Philosophy
//!
//! The two things that leave the process (the model backend and the tools)
//! are traits here. Implementations live in their respective crates, so the
//! agent loop can be exercised with scripted providers and fake tools.

pub mod error;
pub mod event;
pub mod message;
pub mod persona;
pub mod provider;
pub mod session;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use event::{DomainEvent, EventBus};
pub use message::{Message, MessageLog, MessageToolCall, Role};
pub use persona::Persona;
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition};
pub use session::{Session, SessionId};
pub use tool::{Tool, ToolCall, ToolKind, ToolOutput, ToolRegistry};
