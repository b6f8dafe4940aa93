//! Persona: the system instructions every session starts with.
//!
//! The loop has no retry budget of its own beyond the turn cap, so these
//! rules are what keep the model from re-issuing a call whose result said
//! "DO NOT RETRY". Keep them in sync with the tool result texts.

use serde::{Deserialize, Serialize};

/// Built-in supply-chain operating rules.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are an Autonomous Supply Chain Agent.
Your goal is to monitor inventory and purchase supplies based on company policy.

RULES:
1. Always check inventory levels first.
2. If stock is below a product's minimum stock level, you must TRY to search the 'lookup_policy' tool to find supplier rules.
3. CRITICAL: If the 'lookup_policy' tool returns \"No specific policy found\" or similar, DO NOT SEARCH AGAIN. Instead, just report the low stock level to the user and warn them that policy data is missing.
4. If any tool result says \"DO NOT RETRY\", never call that tool again with the same intent. Work with the information you have.
5. Never hallucinate contract terms.
6. When you create a purchase order, always report the order number and its status.";

/// The agent's persona and operating rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    /// Display name (health endpoint, CLI banner)
    pub name: String,

    /// The system prompt placed first in every session
    pub system_prompt: String,
}

impl Persona {
    /// Build a persona, replacing the built-in rules when an override is set.
    pub fn with_override(system_prompt_override: Option<&str>) -> Self {
        match system_prompt_override {
            Some(prompt) if !prompt.trim().is_empty() => Self {
                system_prompt: prompt.to_string(),
                ..Self::default()
            },
            _ => Self::default(),
        }
    }
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            name: "StockClaw Agent".into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prompt_forbids_repeat_policy_search() {
        let persona = Persona::default();
        assert!(persona.system_prompt.contains("DO NOT SEARCH AGAIN"));
        assert!(persona.system_prompt.contains("lookup_policy"));
    }

    #[test]
    fn blank_override_keeps_builtin_rules() {
        let persona = Persona::with_override(Some("   "));
        assert_eq!(persona.system_prompt, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn override_replaces_prompt() {
        let persona = Persona::with_override(Some("Only answer in haiku."));
        assert_eq!(persona.system_prompt, "Only answer in haiku.");
        assert_eq!(persona.name, "StockClaw Agent");
    }
}
