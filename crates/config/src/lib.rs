//! Configuration loading, validation, and management for StockClaw.
//!
//! Loads configuration from `~/.stockclaw/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.stockclaw/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the model backend (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// HTTP gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Agent loop configuration
    #[serde(default)]
    pub agent: AgentConfig,

    /// Inventory / ordering service
    #[serde(default)]
    pub inventory: InventoryConfig,

    /// Policy search (embeddings + vector index)
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "groq".into()
}
fn default_model() -> String {
    "llama-3.3-70b-versatile".into()
}
fn default_temperature() -> f32 {
    0.0
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_true() -> bool {
    true
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("gateway", &self.gateway)
            .field("agent", &self.agent)
            .field("inventory", &self.inventory)
            .field("policy", &self.policy)
            .field("providers", &self.providers)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Upper bound for one `/chat` invocation, tool calls included
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_request_timeout() -> u64 {
    120
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum reasoning steps per request before a partial answer is returned
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,

    /// Run the tool calls of one assistant message concurrently
    #[serde(default = "default_true")]
    pub concurrent_dispatch: bool,

    /// Replace the built-in supply-chain rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_override: Option<String>,
}

fn default_max_turns() -> u32 {
    10
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            concurrent_dispatch: true,
            system_prompt_override: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Base URL of the inventory API (`/products` and `/orders` live under it)
    #[serde(default = "default_inventory_url")]
    pub base_url: String,

    #[serde(default = "default_inventory_timeout")]
    pub timeout_secs: u64,
}

fn default_inventory_url() -> String {
    "http://core-service:8080/api".into()
}
fn default_inventory_timeout() -> u64 {
    5
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            base_url: default_inventory_url(),
            timeout_secs: default_inventory_timeout(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinecone_api_key: Option<String>,

    /// Index host, e.g. `https://policies-abc123.svc.pinecone.io`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinecone_index_host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub huggingface_token: Option<String>,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Base URL of the Hugging Face feature-extraction pipeline
    #[serde(default = "default_embedding_url")]
    pub embedding_url: String,

    /// Number of passages returned per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_policy_timeout")]
    pub timeout_secs: u64,
}

fn default_embedding_model() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".into()
}
fn default_embedding_url() -> String {
    "https://api-inference.huggingface.co/pipeline/feature-extraction".into()
}
fn default_top_k() -> usize {
    3
}
fn default_policy_timeout() -> u64 {
    10
}

impl PolicyConfig {
    /// Pinecone API key and index host, when both are set.
    ///
    /// The Hugging Face token is optional; anonymous embedding calls work
    /// at a lower rate limit.
    pub fn pinecone(&self) -> Option<(&str, &str)> {
        match (&self.pinecone_api_key, &self.pinecone_index_host) {
            (Some(key), Some(host)) => Some((key.as_str(), host.as_str())),
            _ => None,
        }
    }

    /// Policy search runs online when Pinecone is configured.
    pub fn is_configured(&self) -> bool {
        self.pinecone().is_some()
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            pinecone_api_key: None,
            pinecone_index_host: None,
            huggingface_token: None,
            embedding_model: default_embedding_model(),
            embedding_url: default_embedding_url(),
            top_k: default_top_k(),
            timeout_secs: default_policy_timeout(),
        }
    }
}

impl std::fmt::Debug for PolicyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyConfig")
            .field("pinecone_api_key", &redact(&self.pinecone_api_key))
            .field("pinecone_index_host", &self.pinecone_index_host)
            .field("huggingface_token", &redact(&self.huggingface_token))
            .field("embedding_model", &self.embedding_model)
            .field("embedding_url", &self.embedding_url)
            .field("top_k", &self.top_k)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.stockclaw/config.toml),
    /// then apply environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup` (normally `std::env::var`).
    ///
    /// Credentials only fill gaps left by the file; endpoints and the
    /// provider/model selection always win over the file.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| keys.iter().find_map(|k| lookup(k).filter(|v| !v.is_empty()));

        if let Some(provider) = first(&["STOCKCLAW_PROVIDER"]) {
            self.default_provider = provider;
        }
        if self.api_key.is_none() {
            self.api_key = match self.default_provider.as_str() {
                "groq" => first(&["STOCKCLAW_API_KEY", "GROQ_API_KEY"]),
                "openai" => first(&["STOCKCLAW_API_KEY", "OPENAI_API_KEY"]),
                _ => first(&["STOCKCLAW_API_KEY"]),
            };
        }
        if let Some(model) = first(&["STOCKCLAW_MODEL"]) {
            self.default_model = model;
        }
        if let Some(url) = first(&["INVENTORY_SERVICE_URL", "JAVA_SERVICE_URL"]) {
            self.inventory.base_url = url;
        }
        if self.policy.pinecone_api_key.is_none() {
            self.policy.pinecone_api_key = first(&["PINECONE_API_KEY"]);
        }
        if self.policy.pinecone_index_host.is_none() {
            self.policy.pinecone_index_host = first(&["PINECONE_INDEX_HOST"]);
        }
        if self.policy.huggingface_token.is_none() {
            self.policy.huggingface_token = first(&["HUGGINGFACE_TOKEN"]);
        }
        match first(&["AGENT_PORT"]).map(|p| p.parse::<u16>()) {
            Some(Ok(port)) => self.gateway.port = port,
            Some(Err(e)) => tracing::warn!("Ignoring invalid AGENT_PORT: {e}"),
            None => {}
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".stockclaw")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.default_temperature) {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.max_turns == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_turns must be at least 1".into(),
            ));
        }

        if !self.inventory.base_url.starts_with("http://")
            && !self.inventory.base_url.starts_with("https://")
        {
            return Err(ConfigError::ValidationError(format!(
                "inventory.base_url must be an http(s) URL, got '{}'",
                self.inventory.base_url
            )));
        }

        if self.policy.top_k == 0 || self.policy.top_k > 10 {
            return Err(ConfigError::ValidationError(
                "policy.top_k must be between 1 and 10".into(),
            ));
        }

        if self.gateway.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.request_timeout_secs must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self
                .providers
                .get(&self.default_provider)
                .is_some_and(|p| p.api_key.is_some())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            gateway: GatewayConfig::default(),
            agent: AgentConfig::default(),
            inventory: InventoryConfig::default(),
            policy: PolicyConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
