use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::blend::{CostProvider, ProviderCostBreakdown};
use crate::core::models::de;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeepResearchUser {
    #[serde(default, deserialize_with = "de::nullable")]
    pub user_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub total_queries: u64,
    #[serde(default)]
    pub openai_tokens: u64,
    #[serde(default)]
    pub claude_tokens: u64,
    #[serde(default)]
    pub cohere_searches: u64,
    #[serde(default)]
    pub total_cost: f64,
    #[serde(default, deserialize_with = "de::timestamp")]
    pub last_query: Option<DateTime<Utc>>,
}

/// Deep research: OpenAI clarification, Claude synthesis, Cohere reranking.
///
/// `total_queries` is required so that an unrelated body fails to decode
/// instead of showing up as an all-zero panel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeepResearchStats {
    pub total_queries: u64,
    #[serde(default)]
    pub completed_queries: u64,
    #[serde(default)]
    pub failed_queries: u64,
    #[serde(default)]
    pub success_rate: Option<String>,
    #[serde(default)]
    pub total_openai_input_tokens: u64,
    #[serde(default)]
    pub total_openai_output_tokens: u64,
    #[serde(default)]
    pub total_claude_input_tokens: u64,
    #[serde(default)]
    pub total_claude_output_tokens: u64,
    #[serde(default)]
    pub total_cohere_searches: u64,
    #[serde(default)]
    pub total_sources_retrieved: u64,
    #[serde(default)]
    pub total_openai_cost: Option<f64>,
    #[serde(default)]
    pub total_claude_cost: Option<f64>,
    #[serde(default)]
    pub total_cohere_cost: Option<f64>,
    #[serde(default)]
    pub total_cost: Option<f64>,
    #[serde(default)]
    pub avg_processing_time_ms: f64,
    #[serde(default)]
    pub user_count: u64,
    #[serde(default)]
    pub users: Vec<DeepResearchUser>,
}

impl DeepResearchStats {
    pub fn provider_breakdown(&self) -> Vec<ProviderCostBreakdown> {
        vec![
            ProviderCostBreakdown::tokens(
                CostProvider::OpenAi,
                self.total_openai_input_tokens,
                self.total_openai_output_tokens,
                self.total_openai_cost,
            ),
            ProviderCostBreakdown::tokens(
                CostProvider::Claude,
                self.total_claude_input_tokens,
                self.total_claude_output_tokens,
                self.total_claude_cost,
            ),
            ProviderCostBreakdown::searches(
                CostProvider::Cohere,
                self.total_cohere_searches,
                self.total_cohere_cost,
            ),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebSearchUser {
    #[serde(default, deserialize_with = "de::nullable")]
    pub user_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub total_searches: u64,
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub search_cost: f64,
    #[serde(default)]
    pub token_cost: f64,
    #[serde(default)]
    pub total_cost: f64,
    #[serde(default)]
    pub request_count: u64,
    #[serde(default, deserialize_with = "de::timestamp")]
    pub last_search: Option<DateTime<Utc>>,
}

/// Web search: Claude tokens plus a per-search API fee.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebSearchStats {
    pub total_searches: u64,
    #[serde(default)]
    pub total_input_tokens: u64,
    #[serde(default)]
    pub total_output_tokens: u64,
    #[serde(default)]
    pub total_search_cost: Option<f64>,
    #[serde(default)]
    pub total_token_cost: Option<f64>,
    #[serde(default)]
    pub total_cost: Option<f64>,
    #[serde(default)]
    pub total_requests: u64,
    #[serde(default)]
    pub user_count: u64,
    #[serde(default)]
    pub users: Vec<WebSearchUser>,
}

impl WebSearchStats {
    pub fn provider_breakdown(&self) -> Vec<ProviderCostBreakdown> {
        vec![
            ProviderCostBreakdown::tokens(
                CostProvider::Claude,
                self.total_input_tokens,
                self.total_output_tokens,
                self.total_token_cost,
            ),
            ProviderCostBreakdown::searches(
                CostProvider::SearchApi,
                self.total_searches,
                self.total_search_cost,
            ),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScholarUser {
    #[serde(default, deserialize_with = "de::nullable")]
    pub user_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub total_queries: u64,
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub deep_research_sources: u64,
    #[serde(default)]
    pub web_search_sources: u64,
    #[serde(default)]
    pub total_cost: f64,
    #[serde(default, deserialize_with = "de::timestamp")]
    pub last_query: Option<DateTime<Utc>>,
}

/// Scholar mode: Claude tokens plus retrieved deep-research/web sources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScholarStats {
    pub total_queries: u64,
    #[serde(default)]
    pub total_input_tokens: u64,
    #[serde(default)]
    pub total_output_tokens: u64,
    #[serde(default)]
    pub total_deep_research_sources: u64,
    #[serde(default)]
    pub total_web_search_sources: u64,
    #[serde(default)]
    pub total_token_cost: Option<f64>,
    #[serde(default)]
    pub total_source_cost: Option<f64>,
    #[serde(default)]
    pub total_cost: Option<f64>,
    #[serde(default)]
    pub user_count: u64,
    #[serde(default)]
    pub users: Vec<ScholarUser>,
}

impl ScholarStats {
    pub fn provider_breakdown(&self) -> Vec<ProviderCostBreakdown> {
        vec![
            ProviderCostBreakdown::tokens(
                CostProvider::Claude,
                self.total_input_tokens,
                self.total_output_tokens,
                self.total_token_cost,
            ),
            ProviderCostBreakdown::searches(
                CostProvider::SearchApi,
                self.total_deep_research_sources + self.total_web_search_sources,
                self.total_source_cost,
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_research_breakdown_has_three_providers() {
        let json = r#"{
            "total_queries": 5,
            "total_openai_input_tokens": 1000,
            "total_openai_output_tokens": 200,
            "total_claude_input_tokens": 5000,
            "total_claude_output_tokens": 800,
            "total_cohere_searches": 5,
            "total_openai_cost": 0.02,
            "total_claude_cost": 0.10,
            "total_cohere_cost": 0.03,
            "total_cost": 0.15,
            "users": [{ "user_id": "u1", "user_name": null, "total_queries": 5, "last_query": "2025-01-02T03:04:05.678" }]
        }"#;
        let stats: DeepResearchStats = serde_json::from_str(json).unwrap();
        let breakdown = stats.provider_breakdown();
        assert_eq!(breakdown.len(), 3);
        assert_eq!(breakdown[0].provider, CostProvider::OpenAi);
        assert_eq!(breakdown[1].tokens_in, 5000);
        assert_eq!(breakdown[2].searches, 5);
        assert!((breakdown[2].cost - 0.03).abs() < 1e-12);
        assert!(stats.users[0].last_query.is_some());
    }

    #[test]
    fn scholar_sources_are_combined() {
        let stats = ScholarStats {
            total_deep_research_sources: 7,
            total_web_search_sources: 3,
            total_source_cost: Some(0.05),
            ..Default::default()
        };
        let breakdown = stats.provider_breakdown();
        assert_eq!(breakdown[1].searches, 10);
        assert_eq!(breakdown[1].provider, CostProvider::SearchApi);
    }

    #[test]
    fn quota_body_is_not_deep_research_stats() {
        let quota = r#"{ "used": 2, "remaining": 8, "limit": 10, "can_access": true }"#;
        assert!(serde_json::from_str::<DeepResearchStats>(quota).is_err());
        assert!(serde_json::from_str::<WebSearchStats>("{}").is_err());
        assert!(serde_json::from_str::<ScholarStats>(r#"{ "users": [] }"#).is_err());
        let empty: ScholarStats = serde_json::from_str(r#"{ "total_queries": 0 }"#).unwrap();
        assert_eq!(empty.user_count, 0);
    }

    #[test]
    fn missing_costs_read_as_zero() {
        let stats: WebSearchStats = serde_json::from_str(r#"{ "total_searches": 2 }"#).unwrap();
        let breakdown = stats.provider_breakdown();
        assert_eq!(breakdown[0].cost, 0.0);
        assert_eq!(breakdown[1].cost, 0.0);
        assert_eq!(breakdown[1].searches, 2);
    }
}
