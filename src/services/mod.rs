pub mod materials;
pub mod providers;
pub mod recommendations;
pub mod web_search;

pub use materials::MaterialsReader;
pub use providers::{SearchProvider, TavilyProvider};
pub use web_search::WebSearchTool;
