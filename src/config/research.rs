use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::env::EnvConfig;
use crate::error::{FlowError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAI,
    Anthropic,
}

impl LlmProvider {
    pub fn default_model(self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "gpt-4o-mini",
            LlmProvider::Anthropic => "claude-3-5-sonnet-20240620",
        }
    }

    pub fn api_key_var(self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "OPENAI_API_KEY",
            LlmProvider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = FlowError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAI),
            "anthropic" | "claude" => Ok(LlmProvider::Anthropic),
            other => Err(FlowError::Config(format!("unsupported llm provider `{other}`"))),
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmProvider::OpenAI => f.write_str("openai"),
            LlmProvider::Anthropic => f.write_str("anthropic"),
        }
    }
}

/// Settings for the research workflow and its collaborators.
#[derive(Clone, Debug, PartialEq)]
pub struct ResearchConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub firecrawl_api_key: Option<String>,
    pub batch_mode: bool,
    /// Attempts per LLM-backed node, the first call included.
    pub max_attempts: u32,
    pub retry_wait: Duration,
    /// Supervisor rejections tolerated before a report is accepted as is.
    pub max_revisions: u32,
    pub max_search_results: usize,
    pub auto_approve: bool,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        let provider = LlmProvider::OpenAI;
        Self {
            provider,
            model: provider.default_model().to_string(),
            base_url: None,
            api_key: None,
            firecrawl_api_key: None,
            batch_mode: false,
            max_attempts: 3,
            retry_wait: Duration::from_secs(2),
            max_revisions: 2,
            max_search_results: 5,
            auto_approve: false,
        }
    }
}

impl ResearchConfig {
    /// Reads the configuration from the environment. Call
    /// [`EnvConfig::load_dotenv`] first to pick up a `.env` file.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(provider) = EnvConfig::get_parsed::<LlmProvider>("LLM_PROVIDER")? {
            config.provider = provider;
            config.model = provider.default_model().to_string();
        }
        if let Some(model) = EnvConfig::get_env_optional("LLM_MODEL") {
            config.model = model;
        }
        config.base_url = EnvConfig::get_env_optional("LLM_BASE_URL");
        config.api_key = EnvConfig::get_env_optional(config.provider.api_key_var());
        config.firecrawl_api_key = EnvConfig::get_env_optional("FIRECRAWL_API_KEY");
        config.batch_mode = EnvConfig::get_flag("BATCH_MODE");
        config.auto_approve = EnvConfig::get_flag("RESEARCHFLOW_AUTO_APPROVE");

        if let Some(attempts) = EnvConfig::get_parsed::<u32>("RESEARCHFLOW_MAX_RETRIES")? {
            config.max_attempts = attempts.max(1);
        }
        if let Some(wait_ms) = EnvConfig::get_parsed::<u64>("RESEARCHFLOW_RETRY_WAIT_MS")? {
            config.retry_wait = Duration::from_millis(wait_ms);
        }
        if let Some(revisions) = EnvConfig::get_parsed::<u32>("RESEARCHFLOW_MAX_REVISIONS")? {
            config.max_revisions = revisions;
        }
        if let Some(results) = EnvConfig::get_parsed::<usize>("RESEARCHFLOW_MAX_SEARCH_RESULTS")? {
            config.max_search_results = results.max(1);
        }

        Ok(config)
    }

    pub fn with_provider(mut self, provider: LlmProvider) -> Self {
        if self.provider != provider {
            self.model = provider.default_model().to_string();
            self.api_key = EnvConfig::get_env_optional(provider.api_key_var());
        }
        self.provider = provider;
        self
    }

    /// The API key for the configured provider, or a configuration error
    /// naming the variable to set.
    pub fn require_api_key(&self) -> Result<String> {
        match &self.api_key {
            Some(key) => EnvConfig::get_api_key(key, self.provider.api_key_var()),
            None => EnvConfig::get_env(self.provider.api_key_var()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parsing_is_case_insensitive() {
        assert_eq!("OpenAI".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAI);
        assert_eq!("claude".parse::<LlmProvider>().unwrap(), LlmProvider::Anthropic);
        assert!("gemini".parse::<LlmProvider>().is_err());
    }

    #[test]
    fn explicit_key_wins_over_environment() {
        let config = ResearchConfig {
            api_key: Some("sk-inline".to_string()),
            ..ResearchConfig::default()
        };
        assert_eq!(config.require_api_key().unwrap(), "sk-inline");
    }

    #[test]
    fn defaults_are_sane() {
        let config = ResearchConfig::default();
        assert_eq!(config.model, LlmProvider::OpenAI.default_model());
        assert!(config.max_attempts >= 1);
        assert!(!config.batch_mode);
    }
}
