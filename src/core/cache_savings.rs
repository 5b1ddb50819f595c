use serde::Serialize;

use crate::core::blend::Reconciliation;
use crate::core::cost::pricing::ModelPricing;
use crate::core::models::daily::DailyUsageBucket;

/// Prompt-cache writes are billed at 125% of the input rate.
pub const CACHE_WRITE_MULTIPLIER: f64 = 1.25;
/// Prompt-cache reads are billed at 10% of the input rate (90% off).
pub const CACHE_READ_MULTIPLIER: f64 = 0.10;
/// Tokens a cached response is assumed to have avoided.
pub const RESPONSE_CACHE_TOKENS_PER_HIT: f64 = 200.0;

/// `None`, NaN and infinities all read as zero.
pub fn or_zero(value: Option<f64>) -> f64 {
    value.map(finite_or_zero).unwrap_or(0.0)
}

pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

/// Share of requests answered from the full-response cache, in percent.
pub fn response_hit_rate(cached_requests: u64, total_requests: u64) -> f64 {
    percent(cached_requests as f64, total_requests as f64)
}

/// Share of prompt tokens served from the provider cache, in percent.
pub fn prompt_cache_hit_rate(cache_read_tokens: u64, input_tokens: u64) -> f64 {
    percent(
        cache_read_tokens as f64,
        cache_read_tokens as f64 + input_tokens as f64,
    )
}

/// Combined savings of both cache tiers.
pub fn total_savings(prompt_cache: Option<f64>, response_cache: Option<f64>) -> f64 {
    or_zero(prompt_cache) + or_zero(response_cache)
}

/// Dollars saved by cached responses; a hit avoids the whole upstream call.
pub fn response_cache_savings(cached_count: u64, pricing: &ModelPricing) -> f64 {
    cached_count as f64 * RESPONSE_CACHE_TOKENS_PER_HIT / 1_000_000.0 * pricing.input_per_mtok
}

/// Response-cache savings re-derived from the cached counts in a window and
/// compared with the savings the backend reported for the same buckets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseCacheCheck {
    pub cached_responses: u64,
    pub estimated: f64,
    pub reconciliation: Reconciliation,
}

impl ResponseCacheCheck {
    /// Buckets without a `response_cache_savings` field do not count as
    /// reported; a window with none of them is `NotReported`.
    pub fn from_buckets(buckets: &[DailyUsageBucket], pricing: &ModelPricing) -> Self {
        let cached_responses = buckets.iter().map(|b| b.cached_count).sum();
        let reported = buckets
            .iter()
            .filter_map(|b| b.response_cache_savings)
            .map(finite_or_zero)
            .reduce(|a, b| a + b);
        let estimated = response_cache_savings(cached_responses, pricing);
        Self {
            cached_responses,
            estimated,
            reconciliation: Reconciliation::compare(estimated, reported),
        }
    }
}

/// Cost of a request with provider-side prompt caching factored in.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PromptCacheCost {
    pub input_cost: f64,
    pub output_cost: f64,
    pub cache_write_cost: f64,
    pub cache_read_cost: f64,
    pub cost_without_cache: f64,
    pub total_cost: f64,
    pub savings: f64,
}

impl PromptCacheCost {
    pub fn compute(
        input_tokens: u64,
        output_tokens: u64,
        cache_creation_tokens: u64,
        cache_read_tokens: u64,
        pricing: &ModelPricing,
    ) -> Self {
        let per_input = pricing.input_per_mtok / 1_000_000.0;
        let per_output = pricing.output_per_mtok / 1_000_000.0;

        let input_cost = input_tokens as f64 * per_input;
        let output_cost = output_tokens as f64 * per_output;
        let cache_write_cost = cache_creation_tokens as f64 * per_input * CACHE_WRITE_MULTIPLIER;
        let cache_read_cost = cache_read_tokens as f64 * per_input * CACHE_READ_MULTIPLIER;

        let cost_without_cache =
            (input_tokens + cache_creation_tokens + cache_read_tokens) as f64 * per_input;
        let cached_input = input_cost + cache_write_cost + cache_read_cost;

        Self {
            input_cost,
            output_cost,
            cache_write_cost,
            cache_read_cost,
            cost_without_cache,
            total_cost: cached_input + output_cost,
            savings: (cost_without_cache - cached_input).max(0.0),
        }
    }
}

/// Display-ready cache panel built from backend totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheSavingsView {
    pub response_hit_rate: f64,
    /// Backend-formatted, shown verbatim.
    pub prompt_cache_hit_rate: String,
    pub prompt_cache_savings: f64,
    pub response_cache_savings: f64,
    pub total_savings: f64,
}

impl CacheSavingsView {
    pub fn new(
        cached_requests: u64,
        total_requests: u64,
        prompt_cache_hit_rate: Option<&str>,
        prompt_cache_savings: Option<f64>,
        response_cache_savings: Option<f64>,
    ) -> Self {
        Self {
            response_hit_rate: response_hit_rate(cached_requests, total_requests),
            prompt_cache_hit_rate: prompt_cache_hit_rate.unwrap_or("N/A").to_string(),
            prompt_cache_savings: or_zero(prompt_cache_savings),
            response_cache_savings: or_zero(response_cache_savings),
            total_savings: total_savings(prompt_cache_savings, response_cache_savings),
        }
    }
}
