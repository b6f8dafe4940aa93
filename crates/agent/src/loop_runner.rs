//! The loop driver: runs one session from user text to final answer.

use std::sync::Arc;
use std::time::Duration;

use stockclaw_config::AppConfig;
use stockclaw_core::error::{Error, Result};
use stockclaw_core::event::{DomainEvent, EventBus};
use stockclaw_core::persona::Persona;
use stockclaw_core::provider::Provider;
use stockclaw_core::session::Session;
use stockclaw_core::tool::ToolRegistry;
use tracing::{info, warn};

use crate::dispatch::{DispatchMode, ToolDispatcher};
use crate::reasoning::ReasoningStep;
use crate::routing::{Route, route};

/// Default reasoning-step budget per session.
pub const DEFAULT_MAX_TURNS: u32 = 10;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The model replied without requesting tools.
    Answered,
    /// The model still wanted tools when the turn budget ran out.
    TurnBudgetExhausted,
}

/// The full result of one invocation.
#[derive(Debug)]
pub struct RunOutcome {
    pub answer: String,
    pub stop_reason: StopReason,
    pub session: Session,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Reason,
    Route,
    Dispatch,
    Done(StopReason),
}

/// Orchestrates reasoning and tool dispatch for one request at a time.
///
/// The loop holds only shared, read-only handles; each call to
/// [`AgentLoop::run`] owns its session, so one `AgentLoop` can serve
/// concurrent requests.
pub struct AgentLoop {
    persona: Persona,
    reasoning: ReasoningStep,
    dispatcher: ToolDispatcher,
    max_turns: u32,
    event_bus: Arc<EventBus>,
}

impl AgentLoop {
    /// Create a new agent loop.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: Arc<ToolRegistry>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            persona: Persona::default(),
            reasoning: ReasoningStep::new(provider, model, &tools, event_bus.clone()),
            dispatcher: ToolDispatcher::new(tools, event_bus.clone()),
            max_turns: DEFAULT_MAX_TURNS,
            event_bus,
        }
    }

    /// Create an agent loop with every knob taken from configuration.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let mut agent = Self::new(provider, &config.default_model, tools, event_bus)
            .with_persona(Persona::with_override(
                config.agent.system_prompt_override.as_deref(),
            ))
            .with_max_turns(config.agent.max_turns)
            .with_dispatch_mode(DispatchMode::from_concurrent_flag(
                config.agent.concurrent_dispatch,
            ));
        agent.reasoning = agent
            .reasoning
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens);
        agent
    }

    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.persona = persona;
        self
    }

    /// Set the reasoning-step budget. Values below 1 are raised to 1.
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns.max(1);
        self
    }

    pub fn with_dispatch_mode(mut self, mode: DispatchMode) -> Self {
        self.dispatcher = self.dispatcher.with_mode(mode);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.reasoning = self.reasoning.with_temperature(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.reasoning = self.reasoning.with_max_tokens(max_tokens);
        self
    }

    pub fn model(&self) -> &str {
        self.reasoning.model()
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    pub fn max_turns(&self) -> u32 {
        self.max_turns
    }

    /// Run one invocation and return the final answer text.
    pub async fn run(&self, user_text: &str) -> Result<String> {
        Ok(self.run_detailed(user_text).await?.answer)
    }

    /// Like [`AgentLoop::run`], but fails with [`Error::Timeout`] after `limit`.
    ///
    /// On timeout the in-flight session is dropped along with any pending
    /// backend or tool call.
    pub async fn run_with_timeout(&self, user_text: &str, limit: Duration) -> Result<String> {
        match tokio::time::timeout(limit, self.run(user_text)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_secs = limit.as_secs(), "Invocation timed out");
                Err(Error::Timeout {
                    secs: limit.as_secs(),
                })
            }
        }
    }

    /// Run one invocation and return the answer with the finished session.
    pub async fn run_detailed(&self, user_text: &str) -> Result<RunOutcome> {
        let mut session = Session::start(&self.persona.system_prompt, user_text)?;
        info!(session_id = %session.id, "Session started");
        self.event_bus.publish(DomainEvent::SessionStarted {
            session_id: session.id.to_string(),
            query_preview: user_text.chars().take(80).collect(),
            timestamp: chrono::Utc::now(),
        });

        let mut state = LoopState::Reason;
        let stop_reason = loop {
            state = match state {
                LoopState::Reason => {
                    if let Err(e) = self.reasoning.reason(&mut session).await {
                        self.event_bus.publish(DomainEvent::ErrorOccurred {
                            context: format!("session {} turn {}", session.id, session.turns() + 1),
                            error_message: e.to_string(),
                            timestamp: chrono::Utc::now(),
                        });
                        return Err(e);
                    }
                    LoopState::Route
                }
                LoopState::Route => match route(&session.log) {
                    Route::Stop => LoopState::Done(StopReason::Answered),
                    Route::Continue if session.turns() >= self.max_turns => {
                        warn!(
                            session_id = %session.id,
                            turns = session.turns(),
                            "Turn budget exhausted with tool calls pending"
                        );
                        LoopState::Done(StopReason::TurnBudgetExhausted)
                    }
                    Route::Continue => LoopState::Dispatch,
                },
                LoopState::Dispatch => {
                    self.dispatcher.dispatch_pending(&mut session).await?;
                    LoopState::Reason
                }
                LoopState::Done(reason) => break reason,
            };
        };

        let answer = match stop_reason {
            StopReason::Answered => session.log.last().content.clone(),
            StopReason::TurnBudgetExhausted => partial_answer(&session),
        };

        info!(
            session_id = %session.id,
            turns = session.turns(),
            stop_reason = ?stop_reason,
            "Session complete"
        );
        self.event_bus.publish(DomainEvent::SessionCompleted {
            session_id: session.id.to_string(),
            turns: session.turns(),
            budget_exhausted: stop_reason == StopReason::TurnBudgetExhausted,
            timestamp: chrono::Utc::now(),
        });

        Ok(RunOutcome {
            answer,
            stop_reason,
            session,
        })
    }
}

/// Best-effort answer for a session cut off by the turn budget.
fn partial_answer(session: &Session) -> String {
    let note = format!(
        "(Stopped after {} reasoning turns before the task was finished.)",
        session.turns()
    );
    match session.log.last_assistant().map(|m| m.content.trim()) {
        Some(content) if !content.is_empty() => format!("{content}\n\n{note}"),
        _ => format!("I could not complete this request. {note}"),
    }
}
