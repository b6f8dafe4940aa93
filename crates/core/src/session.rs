//! Session state: one caller request's private log and turn counter.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::Result;
use crate::message::MessageLog;

/// Unique identifier for one invocation of the agent loop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The state owned by exactly one run of the loop. Never shared.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: SessionId,

    /// The conversation, system prompt first
    pub log: MessageLog,

    /// Reasoning steps executed so far
    turns: u32,

    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Seed a fresh session with the persona and one user message.
    pub fn start(system_prompt: impl Into<String>, user_text: impl Into<String>) -> Result<Self> {
        let mut log = MessageLog::new(system_prompt);
        log.push_user(user_text)?;
        Ok(Self {
            id: SessionId::new(),
            log,
            turns: 0,
            created_at: Utc::now(),
        })
    }

    pub fn turns(&self) -> u32 {
        self.turns
    }

    /// Record one completed reasoning step. Returns the new count.
    pub fn record_turn(&mut self) -> u32 {
        self.turns += 1;
        self.turns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    #[test]
    fn start_seeds_system_then_user() {
        let session = Session::start("rules", "check standing desks").unwrap();
        let msgs = session.log.messages();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].role, Role::System);
        assert_eq!(msgs[1].role, Role::User);
        assert_eq!(session.turns(), 0);
    }

    #[test]
    fn turn_counter_is_monotonic() {
        let mut session = Session::start("rules", "hi").unwrap();
        assert_eq!(session.record_turn(), 1);
        assert_eq!(session.record_turn(), 2);
        assert_eq!(session.turns(), 2);
    }

    #[test]
    fn sessions_get_distinct_ids() {
        let a = Session::start("rules", "a").unwrap();
        let b = Session::start("rules", "b").unwrap();
        assert_ne!(a.id, b.id);
    }
}
