/// Web search provider abstraction
///
/// Providers take a free-text query and hand back the combined result text
/// unchanged in meaning; ranking and deduplication are left to the provider.
use crate::error::AppResult;

pub mod tavily;

pub use tavily::TavilyProvider;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    /// Runs a single search and returns the result text
    async fn search(&self, query: &str) -> AppResult<String>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
