use std::sync::Arc;
use std::time::Duration;

use crate::{
    agent::{
        model::ChatModel, tool::ToolRegistry, Agent, AgentConfig, AnthropicModel, ModelSettings,
    },
    config::Config,
    db::{MaterialsStore, PgMaterialsStore},
    services::{MaterialsReader, SearchProvider, TavilyProvider, WebSearchTool},
};

/// Shared application state
///
/// Only immutable configuration and external clients live here; nothing
/// request-specific is shared.
pub struct AppState {
    pub model: Arc<dyn ChatModel>,
    pub store: Arc<dyn MaterialsStore>,
    pub search: Arc<dyn SearchProvider>,
    pub agent_config: Arc<AgentConfig>,
}

impl AppState {
    pub fn new(
        model: Arc<dyn ChatModel>,
        store: Arc<dyn MaterialsStore>,
        search: Arc<dyn SearchProvider>,
        agent_config: AgentConfig,
    ) -> Self {
        Self {
            model,
            store,
            search,
            agent_config: Arc::new(agent_config),
        }
    }

    /// Wires the production backends from configuration
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let model = AnthropicModel::new(
            config.anthropic_api_key.clone(),
            config.anthropic_api_url.clone(),
            ModelSettings {
                model: config.model.clone(),
                temperature: config.temperature,
                max_tokens: config.max_tokens,
                timeout: Duration::from_secs(config.model_timeout_secs),
            },
        )?;

        let search = TavilyProvider::new(
            config.search_api_key.clone(),
            config.search_api_url.clone(),
            config.search_max_results,
        );

        Ok(Self::new(
            Arc::new(model),
            Arc::new(PgMaterialsStore::new(config.database_url.clone())),
            Arc::new(search),
            config.agent_config(),
        ))
    }

    /// Builds a fresh agent with both tools for one request
    pub fn build_agent(&self) -> Agent {
        let tools = ToolRegistry::new()
            .with(Arc::new(MaterialsReader::new(self.store.clone())))
            .with(Arc::new(WebSearchTool::new(self.search.clone())));

        Agent::new(self.model.clone(), tools, self.agent_config.clone())
    }
}
