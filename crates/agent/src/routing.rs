//! The routing decision between reasoning and tool dispatch.

use stockclaw_core::message::{MessageLog, Role};
use tracing::warn;

/// Where the loop goes after a reasoning step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The model requested tools; dispatch them.
    Continue,
    /// The model answered; the session is finished.
    Stop,
}

/// Decide the next step from the tail of the log. Pure.
pub fn route(log: &MessageLog) -> Route {
    let last = log.last();
    if last.role != Role::Assistant {
        warn!(role = ?last.role, "Routing on a non-assistant message, stopping");
        return Route::Stop;
    }
    if last.requests_tools() {
        Route::Continue
    } else {
        Route::Stop
    }
}
