use serde::Deserialize;

use crate::agent::{prompt::SYSTEM_PROMPT, AgentConfig};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// PostgreSQL database connection URL
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Anthropic API key
    pub anthropic_api_key: String,

    /// Anthropic API base URL
    #[serde(default = "default_anthropic_api_url")]
    pub anthropic_api_url: String,

    /// Model identifier used by the recommendation agent
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Timeout for a single model call, in seconds
    #[serde(default = "default_model_timeout_secs")]
    pub model_timeout_secs: u64,

    /// Maximum output tokens per model call
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Maximum model rounds per agent run
    #[serde(default = "default_max_agent_turns")]
    pub max_agent_turns: usize,

    /// Search API key (Tavily)
    pub search_api_key: String,

    /// Search API base URL
    #[serde(default = "default_search_api_url")]
    pub search_api_url: String,

    /// Number of results requested per search
    #[serde(default = "default_search_max_results")]
    pub search_max_results: u32,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_database_url() -> String {
    "postgres://localhost/canny".to_string()
}

fn default_anthropic_api_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_model() -> String {
    "claude-sonnet-4-5-20250929".to_string()
}

fn default_temperature() -> f32 {
    0.5
}

fn default_model_timeout_secs() -> u64 {
    30
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_max_agent_turns() -> usize {
    8
}

fn default_search_api_url() -> String {
    "https://api.tavily.com".to_string()
}

fn default_search_max_results() -> u32 {
    5
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Address the HTTP listener binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Agent settings that never vary between requests
    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            system_prompt: SYSTEM_PROMPT.to_string(),
            max_turns: self.max_agent_turns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_when_only_keys_are_set() {
        let vars = vec![
            ("ANTHROPIC_API_KEY".to_string(), "sk-test".to_string()),
            ("SEARCH_API_KEY".to_string(), "tvly-test".to_string()),
        ];

        let config: Config = tokio_test::assert_ok!(envy::from_iter(vars));

        assert_eq!(config.model, "claude-sonnet-4-5-20250929");
        assert_eq!(config.max_tokens, 1000);
        assert_eq!(config.max_agent_turns, 8);
        assert_eq!(config.bind_address(), "127.0.0.1:5000");
        assert!(config.agent_config().system_prompt.contains("JSON array"));
    }

    #[test]
    fn test_missing_api_key_fails() {
        let vars = vec![("SEARCH_API_KEY".to_string(), "tvly-test".to_string())];
        tokio_test::assert_err!(envy::from_iter::<_, Config>(vars));
    }
}
