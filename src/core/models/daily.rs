use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::models::de;

/// One calendar day of pre-aggregated usage.
///
/// The same shape serves every feature: chat buckets report `cost`, the
/// feature variants report `total_cost` and `queries`/`requests`, which are
/// read through aliases. Fields a feature does not report stay zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyUsageBucket {
    #[serde(deserialize_with = "de::bucket_date")]
    pub date: NaiveDate,
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
    #[serde(default, alias = "queries", alias = "requests")]
    pub request_count: u64,
    #[serde(default)]
    pub cached_count: u64,
    #[serde(default)]
    pub unique_users: u64,
    #[serde(default, alias = "total_cost", deserialize_with = "de::nullable")]
    pub cost: f64,
    #[serde(default)]
    pub prompt_cache_savings: Option<f64>,
    #[serde(default)]
    pub response_cache_savings: Option<f64>,
    #[serde(default, alias = "cohere_searches")]
    pub searches: u64,
    #[serde(default)]
    pub openai_tokens: u64,
    #[serde(default)]
    pub claude_tokens: u64,
    #[serde(default)]
    pub openai_cost: Option<f64>,
    #[serde(default)]
    pub claude_cost: Option<f64>,
    #[serde(default)]
    pub cohere_cost: Option<f64>,
    #[serde(default, alias = "source_cost")]
    pub search_cost: Option<f64>,
    #[serde(default)]
    pub token_cost: Option<f64>,
}

impl DailyUsageBucket {
    /// An all-zero bucket for `date`.
    #[cfg(test)]
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            total_tokens: 0,
            input_tokens: 0,
            output_tokens: 0,
            cache_creation_tokens: 0,
            cache_read_tokens: 0,
            request_count: 0,
            cached_count: 0,
            unique_users: 0,
            cost: 0.0,
            prompt_cache_savings: None,
            response_cache_savings: None,
            searches: 0,
            openai_tokens: 0,
            claude_tokens: 0,
            openai_cost: None,
            claude_cost: None,
            cohere_cost: None,
            search_cost: None,
            token_cost: None,
        }
    }

    /// Token count for charting; falls back to the per-provider counts
    /// when the feature does not report a total.
    pub fn tokens(&self) -> u64 {
        if self.total_tokens > 0 {
            self.total_tokens
        } else if self.input_tokens + self.output_tokens > 0 {
            self.input_tokens + self.output_tokens
        } else {
            self.openai_tokens + self.claude_tokens
        }
    }
}

/// Summary block as computed by the backend. Used only for cross-checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportedSummary {
    #[serde(default)]
    pub total_cost: Option<f64>,
    #[serde(default)]
    pub avg_daily_cost: Option<f64>,
    #[serde(default)]
    pub projected_monthly_cost: Option<f64>,
    #[serde(default)]
    pub total_prompt_cache_savings: Option<f64>,
    #[serde(default)]
    pub total_response_cache_savings: Option<f64>,
    #[serde(default)]
    pub days_with_data: Option<u32>,
}

/// Daily-series response. Chat endpoints nest the summary, the feature
/// endpoints put it at the top level.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailySeriesResponse {
    #[serde(default, deserialize_with = "de::nullable")]
    pub daily_usage: Vec<DailyUsageBucket>,
    #[serde(default)]
    pub summary: Option<ReportedSummary>,
    #[serde(default)]
    pub period_days: Option<u32>,
    #[serde(default)]
    pub days_with_data: Option<u32>,
    #[serde(default)]
    pub total_cost: Option<f64>,
    #[serde(default)]
    pub avg_daily_cost: Option<f64>,
    #[serde(default)]
    pub projected_monthly_cost: Option<f64>,
}

impl DailySeriesResponse {
    /// Merge the nested and top-level summary fields.
    pub fn reported(&self) -> ReportedSummary {
        let nested = self.summary.clone().unwrap_or_default();
        ReportedSummary {
            total_cost: nested.total_cost.or(self.total_cost),
            avg_daily_cost: nested.avg_daily_cost.or(self.avg_daily_cost),
            projected_monthly_cost: nested.projected_monthly_cost.or(self.projected_monthly_cost),
            total_prompt_cache_savings: nested.total_prompt_cache_savings,
            total_response_cache_savings: nested.total_response_cache_savings,
            days_with_data: nested.days_with_data.or(self.days_with_data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_chat_daily() {
        let json = r#"{
            "daily_usage": [{
                "date": "2025-01-05",
                "total_tokens": 1500,
                "input_tokens": 1000,
                "output_tokens": 500,
                "request_count": 3,
                "cached_count": 1,
                "cost": 0.0012,
                "prompt_cache_savings": 0.0003,
                "response_cache_savings": 0.0001,
                "cache_savings": 0.0004
            }],
            "summary": { "avg_daily_cost": 0.0012, "projected_monthly_cost": 0.036, "days_with_data": 1 }
        }"#;
        let resp: DailySeriesResponse = serde_json::from_str(json).unwrap();
        let bucket = &resp.daily_usage[0];
        assert_eq!(bucket.date, NaiveDate::from_ymd_opt(2025, 1, 5).unwrap());
        assert_eq!(bucket.request_count, 3);
        assert!((bucket.cost - 0.0012).abs() < 1e-12);
        assert_eq!(resp.reported().days_with_data, Some(1));
    }

    #[test]
    fn deserialize_feature_daily_aliases() {
        let json = r#"{
            "period_days": 7,
            "total_cost": 0.5,
            "avg_daily_cost": 0.25,
            "projected_monthly_cost": 7.5,
            "daily_usage": [
                { "date": "2025-02-01", "queries": 4, "openai_tokens": 100, "claude_tokens": 900,
                  "cohere_searches": 4, "openai_cost": 0.01, "claude_cost": 0.2, "cohere_cost": 0.008,
                  "total_cost": 0.218 },
                { "date": "2025-02-02", "requests": 2, "searches": 5, "source_cost": 0.05, "total_cost": 0.282 }
            ]
        }"#;
        let resp: DailySeriesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.daily_usage[0].request_count, 4);
        assert_eq!(resp.daily_usage[0].searches, 4);
        assert_eq!(resp.daily_usage[0].tokens(), 1000);
        assert_eq!(resp.daily_usage[1].request_count, 2);
        assert_eq!(resp.daily_usage[1].search_cost, Some(0.05));
        let reported = resp.reported();
        assert_eq!(reported.projected_monthly_cost, Some(7.5));
        assert_eq!(reported.total_cost, Some(0.5));
    }

    #[test]
    fn null_daily_usage_is_empty() {
        let resp: DailySeriesResponse = serde_json::from_str(r#"{ "daily_usage": null }"#).unwrap();
        assert!(resp.daily_usage.is_empty());
        let resp: DailySeriesResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.daily_usage.is_empty());
    }

    #[test]
    fn bucket_date_accepts_timestamp() {
        let bucket: DailyUsageBucket =
            serde_json::from_str(r#"{ "date": "2025-03-09T00:00:00Z" }"#).unwrap();
        assert_eq!(bucket.date, NaiveDate::from_ymd_opt(2025, 3, 9).unwrap());
        assert_eq!(bucket.cost, 0.0);
    }
}
