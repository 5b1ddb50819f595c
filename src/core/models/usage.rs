use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::models::de;

/// Per-user token usage rollup as returned by the backend.
///
/// Every counter defaults to zero when the backend omits it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    #[serde(default, deserialize_with = "de::nullable")]
    pub user_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub cache_creation_tokens: u64,
    #[serde(default)]
    pub cache_read_tokens: u64,
    #[serde(default)]
    pub request_count: u64,
    #[serde(default)]
    pub cached_count: u64,
    /// Pre-formatted by the backend, e.g. "42.0%".
    #[serde(default)]
    pub cache_hit_rate: Option<String>,
    #[serde(default)]
    pub cache_savings: Option<f64>,
    #[serde(default, deserialize_with = "de::timestamp")]
    pub last_request: Option<DateTime<Utc>>,
}

impl UsageRecord {
    /// Input plus output; cache tokens are tracked separately.
    pub fn billable_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    /// Reported total, or input plus output when the backend left it at zero.
    pub fn tokens(&self) -> u64 {
        if self.total_tokens > 0 {
            self.total_tokens
        } else {
            self.billable_tokens()
        }
    }
}

/// Chatbot token usage overview for all users.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverviewStats {
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default)]
    pub total_input_tokens: u64,
    #[serde(default)]
    pub total_output_tokens: u64,
    #[serde(default)]
    pub total_cache_creation_tokens: u64,
    #[serde(default)]
    pub total_cache_read_tokens: u64,
    #[serde(default)]
    pub total_requests: u64,
    #[serde(default)]
    pub cached_requests: u64,
    #[serde(default)]
    pub cache_hit_rate: Option<String>,
    #[serde(default)]
    pub prompt_cache_hit_rate: Option<String>,
    #[serde(default)]
    pub total_cache_savings: Option<f64>,
    #[serde(default)]
    pub user_count: u64,
    #[serde(default)]
    pub users: Vec<UsageRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingUser {
    #[serde(default, deserialize_with = "de::nullable")]
    pub user_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default)]
    pub total_cost: f64,
    #[serde(default)]
    pub request_count: u64,
    #[serde(default)]
    pub avg_tokens_per_request: f64,
    #[serde(default, deserialize_with = "de::timestamp")]
    pub last_request: Option<DateTime<Utc>>,
}

/// Embedding (vector search) usage overview.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddingStats {
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default)]
    pub total_cost: f64,
    #[serde(default)]
    pub total_requests: u64,
    #[serde(default)]
    pub avg_tokens_per_request: f64,
    #[serde(default)]
    pub user_count: u64,
    #[serde(default)]
    pub users: Vec<EmbeddingUser>,
}

/// Currently configured chatbot model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelSettings {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_overview_stats() {
        let json = r#"{
            "total_tokens": 1500,
            "total_input_tokens": 1000,
            "total_output_tokens": 500,
            "total_requests": 4,
            "cached_requests": 1,
            "cache_hit_rate": "25.0%",
            "prompt_cache_hit_rate": "10.5%",
            "total_cache_savings": 0.0123,
            "user_count": 1,
            "users": [{
                "user_id": "u1",
                "user_name": "Ada",
                "total_tokens": 1500,
                "input_tokens": 1000,
                "output_tokens": 500,
                "cache_creation_tokens": 0,
                "cache_read_tokens": 200,
                "request_count": 4,
                "cached_count": 1,
                "cache_hit_rate": "25.0%",
                "cache_savings": 0.0005,
                "last_request": "2025-01-05T10:30:00Z"
            }]
        }"#;
        let stats: OverviewStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.total_requests, 4);
        assert_eq!(stats.users.len(), 1);
        let user = &stats.users[0];
        assert_eq!(user.billable_tokens(), user.total_tokens);
        assert_eq!(user.cache_hit_rate.as_deref(), Some("25.0%"));
        assert!(user.last_request.is_some());
    }

    #[test]
    fn missing_fields_default_to_zero() {
        let stats: OverviewStats = serde_json::from_str(r#"{ "users": [{}] }"#).unwrap();
        assert_eq!(stats.total_tokens, 0);
        assert!(stats.total_cache_savings.is_none());
        let user = &stats.users[0];
        assert_eq!(user.request_count, 0);
        assert!(user.user_name.is_none());
        assert!(user.last_request.is_none());
    }

    #[test]
    fn null_last_request_is_none() {
        let user: UsageRecord =
            serde_json::from_str(r#"{ "user_id": "x", "last_request": null }"#).unwrap();
        assert!(user.last_request.is_none());
    }

    #[test]
    fn deserialize_embedding_stats() {
        let json = r#"{
            "total_tokens": 2000000,
            "total_cost": 0.04,
            "total_requests": 10,
            "avg_tokens_per_request": 200000,
            "user_count": 1,
            "users": [{ "user_id": "u1", "total_tokens": 2000000, "total_cost": 0.04, "request_count": 10 }]
        }"#;
        let stats: EmbeddingStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.users[0].request_count, 10);
        assert!((stats.total_cost - 0.04).abs() < 1e-12);
    }
}
