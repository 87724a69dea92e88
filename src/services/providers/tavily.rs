/// Tavily search API provider
///
/// POST {api_url}/search with the query; the JSON results are flattened into
/// plain text blocks the agent can read directly.
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::instrument;

use crate::{
    error::{AppError, AppResult},
    services::providers::SearchProvider,
};

#[derive(Debug, Deserialize)]
struct ApiSearchResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<ApiSearchResult>,
}

#[derive(Debug, Deserialize)]
struct ApiSearchResult {
    title: String,
    url: String,
    #[serde(default)]
    content: String,
}

#[derive(Clone)]
pub struct TavilyProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    max_results: u32,
}

impl TavilyProvider {
    pub fn new(api_key: String, api_url: String, max_results: u32) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            max_results,
        }
    }

    fn request_body(&self, query: &str) -> Value {
        json!({
            "query": query,
            "max_results": self.max_results,
            "search_depth": "basic",
            "include_answer": true,
        })
    }

    fn render(query: &str, response: ApiSearchResponse) -> String {
        let mut blocks = Vec::new();

        if let Some(answer) = response.answer.filter(|a| !a.trim().is_empty()) {
            blocks.push(format!("Answer: {}", answer.trim()));
        }

        for result in response.results {
            blocks.push(format!(
                "{}\n{}\n{}",
                result.title,
                result.url,
                result.content.trim()
            ));
        }

        if blocks.is_empty() {
            return format!("No results found for \"{}\".", query);
        }

        blocks.join("\n\n")
    }
}

#[async_trait::async_trait]
impl SearchProvider for TavilyProvider {
    #[instrument(skip(self), fields(provider = "tavily"))]
    async fn search(&self, query: &str) -> AppResult<String> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let url = format!("{}/search", self.api_url);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(query))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "API returned status {}: {}",
                status, body
            )));
        }

        let parsed: ApiSearchResponse = response.json().await?;

        tracing::info!(results = parsed.results.len(), "Web search completed");

        Ok(Self::render(query, parsed))
    }

    fn name(&self) -> &'static str {
        "tavily"
    }
}
