//! Engine configuration.
//!
//! Values come from defaults, an optional TOML file, then `TRAINBOT_*`
//! environment overrides. API keys are only ever read from the environment.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ChatError, ChatResult};

/// Default number of messages kept per session.
pub const DEFAULT_MAX_HISTORY: usize = 20;

/// Default provider request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// LLM provider type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAI,
    Anthropic,
}

impl LlmProvider {
    /// Environment variable holding this provider's API key.
    pub fn key_var(&self) -> &'static str {
        match self {
            Self::OpenAI => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    /// Model used when nothing is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAI => "gpt-3.5-turbo",
            Self::Anthropic => "claude-3-5-haiku-latest",
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            other => Err(ChatError::Config(format!("unknown LLM provider '{}'", other))),
        }
    }
}

/// Models used for each kind of call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub default: String,
    pub classification: String,
    pub generation: String,
}

impl ModelSelection {
    pub fn uniform(model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            default: model.clone(),
            classification: model.clone(),
            generation: model,
        }
    }
}

impl Default for ModelSelection {
    fn default() -> Self {
        Self::uniform(LlmProvider::OpenAI.default_model())
    }
}

/// Language-model settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmSettings {
    /// Explicit provider; detected from the available API keys when unset.
    pub provider: Option<LlmProvider>,
    pub default_model: Option<String>,
    pub classification_model: Option<String>,
    pub generation_model: Option<String>,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: None,
            default_model: None,
            classification_model: None,
            generation_model: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl LlmSettings {
    /// Pick the provider and its API key.
    ///
    /// With no explicit provider, checks in order:
    /// 1. OPENAI_API_KEY
    /// 2. ANTHROPIC_API_KEY
    ///
    /// A missing key is not an error here; the client reports it on first use.
    pub fn resolve_credentials<F>(&self, lookup: F) -> (LlmProvider, Option<String>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let key_for = |provider: LlmProvider| lookup(provider.key_var()).filter(|k| !k.is_empty());

        if let Some(provider) = self.provider {
            return (provider, key_for(provider));
        }

        for provider in [LlmProvider::OpenAI, LlmProvider::Anthropic] {
            if let Some(key) = key_for(provider) {
                return (provider, Some(key));
            }
        }

        (LlmProvider::OpenAI, None)
    }

    /// Resolve the model for each call kind against `provider`'s default.
    pub fn models(&self, provider: LlmProvider) -> ModelSelection {
        let default = self
            .default_model
            .clone()
            .unwrap_or_else(|| provider.default_model().to_string());

        ModelSelection {
            classification: self
                .classification_model
                .clone()
                .unwrap_or_else(|| default.clone()),
            generation: self
                .generation_model
                .clone()
                .unwrap_or_else(|| default.clone()),
            default,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub max_history: usize,
    pub knowledge_dir: PathBuf,
    pub llm: LlmSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
            knowledge_dir: PathBuf::from("knowledge"),
            llm: LlmSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration: defaults, then `path` if given, then environment.
    pub fn load(path: Option<&Path>) -> ChatResult<Self> {
        let mut config = match path {
            Some(path) => {
                debug!("Loading engine config from {:?}", path);
                let content = std::fs::read_to_string(path).map_err(|e| {
                    ChatError::Config(format!("cannot read {}: {}", path.display(), e))
                })?;
                Self::from_toml_str(&content)?
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> ChatResult<Self> {
        toml::from_str(content).map_err(|e| ChatError::Config(e.to_string()))
    }

    /// Apply `TRAINBOT_*` overrides (plus `OPENAI_AGENT_MODEL`) from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ChatResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("TRAINBOT_MAX_HISTORY") {
            self.max_history = value.trim().parse().map_err(|_| {
                ChatError::Config(format!("TRAINBOT_MAX_HISTORY must be an integer, got '{}'", value))
            })?;
        }
        if let Some(value) = lookup("TRAINBOT_KNOWLEDGE_DIR") {
            self.knowledge_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("TRAINBOT_LLM_PROVIDER") {
            self.llm.provider = Some(value.parse()?);
        }
        if let Some(value) = lookup("TRAINBOT_LLM_MODEL") {
            self.llm.default_model = Some(value);
        }
        if let Some(value) = lookup("TRAINBOT_CLASSIFICATION_MODEL") {
            self.llm.classification_model = Some(value);
        }
        if let Some(value) = lookup("TRAINBOT_GENERATION_MODEL").or_else(|| lookup("OPENAI_AGENT_MODEL")) {
            self.llm.generation_model = Some(value);
        }
        if let Some(value) = lookup("TRAINBOT_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = value.trim().parse().map_err(|_| {
                ChatError::Config(format!(
                    "TRAINBOT_LLM_TIMEOUT_SECS must be an integer, got '{}'",
                    value
                ))
            })?;
        }

        if self.max_history == 0 {
            return Err(ChatError::Config("max_history must be at least 1".to_string()));
        }
        Ok(())
    }
}
