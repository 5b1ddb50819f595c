//! Chart-ready series and period summaries derived from daily buckets.
//!
//! Everything here is recomputed on each call; nothing is cached between
//! renders.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

use crate::core::cache_savings::or_zero;
use crate::core::models::daily::DailyUsageBucket;

/// Fixed month length used for projections. Not calendar-accurate.
pub const DAYS_PER_MONTH: f64 = 30.0;

/// Selectable reporting windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ChartWindow {
    Week,
    TwoWeeks,
    #[default]
    Month,
    TwoMonths,
    Quarter,
}

impl ChartWindow {
    pub fn all() -> &'static [ChartWindow] {
        &[
            ChartWindow::Week,
            ChartWindow::TwoWeeks,
            ChartWindow::Month,
            ChartWindow::TwoMonths,
            ChartWindow::Quarter,
        ]
    }

    pub fn days(&self) -> u32 {
        match self {
            Self::Week => 7,
            Self::TwoWeeks => 14,
            Self::Month => 30,
            Self::TwoMonths => 60,
            Self::Quarter => 90,
        }
    }

    pub fn from_days(days: u32) -> Option<Self> {
        Self::all().iter().copied().find(|w| w.days() == days)
    }
}

impl fmt::Display for ChartWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Last {} days", self.days())
    }
}

impl FromStr for ChartWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let days: u32 = s
            .trim()
            .trim_end_matches('d')
            .parse()
            .map_err(|_| format!("invalid window '{}'", s))?;
        Self::from_days(days).ok_or_else(|| {
            format!("unsupported window '{}' (expected 7, 14, 30, 60 or 90)", s)
        })
    }
}

/// Dollars to the chart's cents axis.
pub fn to_cents(dollars: f64) -> f64 {
    dollars * 100.0
}

/// Cents axis value back to dollars, used by tooltips.
pub fn from_cents(cents: f64) -> f64 {
    cents / 100.0
}

/// `"Jan 5"` style x-axis label.
pub fn axis_label(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

pub fn project_monthly(avg_daily: f64) -> f64 {
    avg_daily * DAYS_PER_MONTH
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesUnit {
    Count,
    Cents,
}

/// Per-bucket field plotted as one dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    Tokens,
    InputTokens,
    OutputTokens,
    Requests,
    CostCents,
    PromptCacheSavingsCents,
    ResponseCacheSavingsCents,
}

impl SeriesKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Tokens => "Total Tokens",
            Self::InputTokens => "Input Tokens",
            Self::OutputTokens => "Output Tokens",
            Self::Requests => "Requests",
            Self::CostCents => "Cost (cents)",
            Self::PromptCacheSavingsCents => "Prompt Cache Savings (cents)",
            Self::ResponseCacheSavingsCents => "Response Cache Savings (cents)",
        }
    }

    pub fn unit(&self) -> SeriesUnit {
        match self {
            Self::Tokens | Self::InputTokens | Self::OutputTokens | Self::Requests => {
                SeriesUnit::Count
            }
            Self::CostCents | Self::PromptCacheSavingsCents | Self::ResponseCacheSavingsCents => {
                SeriesUnit::Cents
            }
        }
    }

    fn extract(&self, bucket: &DailyUsageBucket) -> f64 {
        match self {
            Self::Tokens => bucket.tokens() as f64,
            Self::InputTokens => bucket.input_tokens as f64,
            Self::OutputTokens => bucket.output_tokens as f64,
            Self::Requests => bucket.request_count as f64,
            Self::CostCents => to_cents(or_zero(Some(bucket.cost))),
            Self::PromptCacheSavingsCents => to_cents(or_zero(bucket.prompt_cache_savings)),
            Self::ResponseCacheSavingsCents => to_cents(or_zero(bucket.response_cache_savings)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub kind: SeriesKind,
    pub label: &'static str,
    pub unit: SeriesUnit,
    pub values: Vec<f64>,
}

impl Dataset {
    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    /// Tooltip text for point `idx`; cents are shown back in dollars.
    pub fn tooltip(&self, idx: usize) -> Option<String> {
        let value = *self.values.get(idx)?;
        Some(match self.unit {
            SeriesUnit::Cents => format!("{}: ${:.4}", self.label, from_cents(value)),
            SeriesUnit::Count => format!("{}: {}", self.label, value.round() as u64),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartData {
    /// True when there is nothing to plot; the view shows a placeholder.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// One label per bucket plus one dataset per requested kind. Missing or
/// empty input yields an empty chart.
pub fn build_chart<'a>(
    buckets: impl Into<Option<&'a [DailyUsageBucket]>>,
    kinds: &[SeriesKind],
) -> ChartData {
    let buckets = buckets.into().unwrap_or_default();
    if buckets.is_empty() {
        return ChartData::default();
    }

    ChartData {
        labels: buckets.iter().map(|b| axis_label(b.date)).collect(),
        datasets: kinds
            .iter()
            .map(|kind| Dataset {
                kind: *kind,
                label: kind.label(),
                unit: kind.unit(),
                values: buckets.iter().map(|b| kind.extract(b)).collect(),
            })
            .collect(),
    }
}

/// Period totals, daily means and 30-day projections.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub days_with_data: usize,
    pub total_tokens: u64,
    pub total_requests: u64,
    pub total_cost: f64,
    pub total_prompt_cache_savings: f64,
    pub total_response_cache_savings: f64,
    pub total_cache_savings: f64,
    pub avg_daily_tokens: f64,
    pub avg_daily_cost: f64,
    pub avg_daily_savings: f64,
    pub projected_monthly_tokens: f64,
    pub projected_monthly_cost: f64,
    pub projected_monthly_savings: f64,
}

pub fn summarize<'a>(buckets: impl Into<Option<&'a [DailyUsageBucket]>>) -> SeriesSummary {
    let buckets = buckets.into().unwrap_or_default();
    if buckets.is_empty() {
        return SeriesSummary::default();
    }

    let days = buckets.len() as f64;
    let total_tokens: u64 = buckets.iter().map(DailyUsageBucket::tokens).sum();
    let total_requests: u64 = buckets.iter().map(|b| b.request_count).sum();
    let total_cost: f64 = buckets.iter().map(|b| or_zero(Some(b.cost))).sum();
    let total_prompt_cache_savings: f64 =
        buckets.iter().map(|b| or_zero(b.prompt_cache_savings)).sum();
    let total_response_cache_savings: f64 =
        buckets.iter().map(|b| or_zero(b.response_cache_savings)).sum();
    let total_cache_savings = total_prompt_cache_savings + total_response_cache_savings;

    let avg_daily_tokens = total_tokens as f64 / days;
    let avg_daily_cost = total_cost / days;
    let avg_daily_savings = total_cache_savings / days;

    SeriesSummary {
        days_with_data: buckets.len(),
        total_tokens,
        total_requests,
        total_cost,
        total_prompt_cache_savings,
        total_response_cache_savings,
        total_cache_savings,
        avg_daily_tokens,
        avg_daily_cost,
        avg_daily_savings,
        projected_monthly_tokens: project_monthly(avg_daily_tokens),
        projected_monthly_cost: project_monthly(avg_daily_cost),
        projected_monthly_savings: project_monthly(avg_daily_savings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(day: u32, tokens: u64, cost: f64) -> DailyUsageBucket {
        let mut b = DailyUsageBucket::empty(NaiveDate::from_ymd_opt(2025, 1, day).unwrap());
        b.total_tokens = tokens;
        b.request_count = 2;
        b.cost = cost;
        b
    }

    #[test]
    fn window_parsing() {
        assert_eq!("7".parse::<ChartWindow>().unwrap(), ChartWindow::Week);
        assert_eq!("90d".parse::<ChartWindow>().unwrap(), ChartWindow::Quarter);
        assert!("31".parse::<ChartWindow>().is_err());
        assert!("month".parse::<ChartWindow>().is_err());
        assert_eq!(ChartWindow::default().days(), 30);
    }

    #[test]
    fn axis_label_is_short_month_and_unpadded_day() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        assert_eq!(axis_label(d), "Jan 5");
        let d = NaiveDate::from_ymd_opt(2025, 12, 25).unwrap();
        assert_eq!(axis_label(d), "Dec 25");
    }

    #[test]
    fn empty_input_gives_empty_chart() {
        let empty: &[DailyUsageBucket] = &[];
        let chart = build_chart(empty, &[SeriesKind::Tokens, SeriesKind::CostCents]);
        assert!(chart.labels.is_empty());
        assert!(chart.datasets.is_empty());
        assert!(chart.is_empty());

        let chart = build_chart(None, &[SeriesKind::Tokens]);
        assert_eq!(chart, ChartData::default());
    }

    #[test]
    fn one_label_and_value_per_bucket() {
        let buckets = vec![bucket(5, 100, 0.5), bucket(6, 300, 1.25)];
        let chart = build_chart(buckets.as_slice(), &[SeriesKind::Tokens, SeriesKind::CostCents]);
        assert_eq!(chart.labels, vec!["Jan 5", "Jan 6"]);
        assert_eq!(chart.datasets.len(), 2);
        assert_eq!(chart.datasets[0].values, vec![100.0, 300.0]);
        assert_eq!(chart.datasets[1].unit, SeriesUnit::Cents);
        assert!((chart.datasets[1].values[1] - 125.0).abs() < 1e-9);
        assert!((chart.datasets[0].max() - 300.0).abs() < 1e-12);
    }

    #[test]
    fn cents_round_trip() {
        for c in [0.0, 0.0001, 0.1234, 1.5, 42.4242, 12345.6789] {
            assert!((from_cents(to_cents(c)) - c).abs() < 1e-9, "{}", c);
        }
    }

    #[test]
    fn tooltip_divides_cents_back() {
        let buckets = vec![bucket(5, 100, 0.0123)];
        let chart = build_chart(buckets.as_slice(), &[SeriesKind::CostCents, SeriesKind::Tokens]);
        assert_eq!(chart.datasets[0].tooltip(0).unwrap(), "Cost (cents): $0.0123");
        assert_eq!(chart.datasets[1].tooltip(0).unwrap(), "Total Tokens: 100");
        assert!(chart.datasets[0].tooltip(1).is_none());
    }

    #[test]
    fn missing_savings_plot_as_zero() {
        let buckets = vec![bucket(5, 100, 0.5)];
        let chart = build_chart(
            buckets.as_slice(),
            &[SeriesKind::PromptCacheSavingsCents, SeriesKind::ResponseCacheSavingsCents],
        );
        assert_eq!(chart.datasets[0].values, vec![0.0]);
        assert_eq!(chart.datasets[1].values, vec![0.0]);
    }

    #[test]
    fn projection_uses_thirty_days() {
        assert_eq!(project_monthly(1.5), 45.0);
    }

    #[test]
    fn summary_means_and_projections() {
        let buckets = vec![bucket(5, 100, 1.0), bucket(6, 300, 2.0)];
        let summary = summarize(buckets.as_slice());
        assert_eq!(summary.days_with_data, 2);
        assert_eq!(summary.total_tokens, 400);
        assert_eq!(summary.total_requests, 4);
        assert!((summary.avg_daily_cost - 1.5).abs() < 1e-12);
        assert_eq!(summary.projected_monthly_cost, 45.0);
        assert!((summary.projected_monthly_tokens - 6000.0).abs() < 1e-9);
    }

    #[test]
    fn summary_sums_both_cache_tiers() {
        let mut a = bucket(5, 0, 0.0);
        a.prompt_cache_savings = Some(0.2);
        a.response_cache_savings = Some(0.1);
        let mut b = bucket(6, 0, 0.0);
        b.prompt_cache_savings = Some(0.3);
        let summary = summarize(vec![a, b].as_slice());
        assert!((summary.total_prompt_cache_savings - 0.5).abs() < 1e-12);
        assert!((summary.total_response_cache_savings - 0.1).abs() < 1e-12);
        assert!((summary.total_cache_savings - 0.6).abs() < 1e-12);
        assert!((summary.avg_daily_savings - 0.3).abs() < 1e-12);
    }

    #[test]
    fn summary_of_nothing_is_zero() {
        let summary = summarize(None);
        assert_eq!(summary, SeriesSummary::default());
        assert_eq!(summary.projected_monthly_cost, 0.0);
    }
}
