use serde::{Deserialize, Serialize};

/// Analytics views exposed by the backend. Each has a stats endpoint and a
/// daily-series endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Overview,
    Embeddings,
    DeepResearch,
    WebSearch,
    ScholarMode,
    CacheAnalytics,
}

impl Feature {
    pub fn id(&self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::Embeddings => "embeddings",
            Self::DeepResearch => "deep_research",
            Self::WebSearch => "web_search",
            Self::ScholarMode => "scholar",
            Self::CacheAnalytics => "cache",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Overview => "Token Usage",
            Self::Embeddings => "Embeddings",
            Self::DeepResearch => "Deep Research",
            Self::WebSearch => "Web Search",
            Self::ScholarMode => "Scholar Mode",
            Self::CacheAnalytics => "Cache Analytics",
        }
    }

    /// Stats endpoint, relative to the API base URL.
    pub fn stats_path(&self) -> &'static str {
        match self {
            // Cache analytics is derived from the token usage rollup.
            Self::Overview | Self::CacheAnalytics => "/api/admin/token-usage",
            Self::Embeddings => "/api/admin/embedding-usage",
            Self::DeepResearch => "/api/deep-research/analytics",
            Self::WebSearch => "/api/web-search/analytics",
            Self::ScholarMode => "/api/scholar/analytics",
        }
    }

    pub fn daily_path(&self) -> String {
        format!("{}/daily", self.stats_path())
    }
}
