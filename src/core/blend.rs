use serde::{Deserialize, Serialize};

use crate::core::cache_savings::{finite_or_zero, or_zero};

/// Tolerance when comparing a blended total with the backend's figure.
const RECONCILE_TOLERANCE: f64 = 1e-4;

/// Upstream service billed by a composite feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostProvider {
    #[serde(rename = "openai")]
    OpenAi,
    Claude,
    Cohere,
    SearchApi,
}

impl CostProvider {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Claude => "Claude",
            Self::Cohere => "Cohere",
            Self::SearchApi => "Search API",
        }
    }

    /// Billing unit; token and search counts never mix.
    pub fn unit(&self) -> &'static str {
        match self {
            Self::OpenAi | Self::Claude => "tokens",
            Self::Cohere | Self::SearchApi => "searches",
        }
    }
}

/// One provider's share of a composite feature's usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderCostBreakdown {
    pub provider: CostProvider,
    pub tokens_in: u64,
    pub tokens_out: u64,
    pub searches: u64,
    pub cost: f64,
}

impl ProviderCostBreakdown {
    pub fn tokens(provider: CostProvider, tokens_in: u64, tokens_out: u64, cost: Option<f64>) -> Self {
        Self {
            provider,
            tokens_in,
            tokens_out,
            searches: 0,
            cost: or_zero(cost),
        }
    }

    pub fn searches(provider: CostProvider, searches: u64, cost: Option<f64>) -> Self {
        Self {
            provider,
            tokens_in: 0,
            tokens_out: 0,
            searches,
            cost: or_zero(cost),
        }
    }

    /// Usage in the provider's own unit.
    pub fn usage(&self) -> u64 {
        match self.provider {
            CostProvider::Cohere | CostProvider::SearchApi => self.searches,
            CostProvider::OpenAi | CostProvider::Claude => self.tokens_in + self.tokens_out,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderShare {
    pub provider: CostProvider,
    pub usage: u64,
    pub unit: &'static str,
    pub cost: f64,
    /// `None` when there were no requests.
    pub avg_per_request: Option<f64>,
    pub share_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlendedCost {
    pub total_cost: f64,
    pub total_requests: u64,
    /// `None` when `total_requests == 0`.
    pub avg_cost_per_request: Option<f64>,
    pub providers: Vec<ProviderShare>,
}

impl BlendedCost {
    /// Average cost per request with four decimals, `"0.0000"` when there
    /// were no requests.
    pub fn avg_cost_per_request_display(&self) -> String {
        format!("{:.4}", self.avg_cost_per_request.unwrap_or(0.0))
    }
}

fn per_request(cost: f64, requests: u64) -> Option<f64> {
    (requests > 0).then(|| cost / requests as f64)
}

/// Sum provider costs into one total and derive per-request averages.
pub fn blend(breakdown: &[ProviderCostBreakdown], total_requests: u64) -> BlendedCost {
    let total_cost: f64 = breakdown.iter().map(|p| finite_or_zero(p.cost)).sum();

    let providers = breakdown
        .iter()
        .map(|p| {
            let cost = finite_or_zero(p.cost);
            ProviderShare {
                provider: p.provider,
                usage: p.usage(),
                unit: p.provider.unit(),
                cost,
                avg_per_request: per_request(cost, total_requests),
                share_percent: if total_cost > 0.0 {
                    cost / total_cost * 100.0
                } else {
                    0.0
                },
            }
        })
        .collect();

    BlendedCost {
        total_cost,
        total_requests,
        avg_cost_per_request: per_request(total_cost, total_requests),
        providers,
    }
}

/// Outcome of comparing a locally computed total with the backend's figure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Reconciliation {
    Matches,
    NotReported,
    Mismatch { computed: f64, reported: f64 },
}

impl Reconciliation {
    pub fn compare(computed: f64, reported: Option<f64>) -> Self {
        match reported.filter(|v| v.is_finite()) {
            None => Self::NotReported,
            Some(reported) if (computed - reported).abs() <= RECONCILE_TOLERANCE => Self::Matches,
            Some(reported) => Self::Mismatch { computed, reported },
        }
    }
}

/// Cross-check without correcting: the backend figure stays authoritative.
pub fn reconcile(blended: &BlendedCost, reported_total: Option<f64>) -> Reconciliation {
    let outcome = Reconciliation::compare(blended.total_cost, reported_total);
    if let Reconciliation::Mismatch { computed, reported } = outcome {
        tracing::warn!(
            blended = computed,
            reported,
            "provider costs do not add up to the reported total"
        );
    }
    outcome
}
