//! The bounded control loop at the heart of StockClaw.
//!
//! A session alternates between two kinds of step:
//!
//! 1. **Reason**: send the whole log to the model backend, append its reply
//! 2. **Route**: stop if the reply carries no tool calls
//! 3. **Dispatch**: run every requested tool, append one result per call,
//!    and go back to step 1
//!
//! The loop ends when the model answers without requesting tools, or when
//! the per-session turn budget runs out.

pub mod dispatch;
pub mod loop_runner;
pub mod reasoning;
pub mod routing;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use dispatch::{DispatchMode, ToolDispatcher};
pub use loop_runner::{AgentLoop, RunOutcome, StopReason};
pub use reasoning::ReasoningStep;
pub use routing::{Route, route};
