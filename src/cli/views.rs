//! Display-ready view models built from a fetched snapshot. Text output
//! renders these; JSON output serializes them directly.

use serde::Serialize;

use crate::core::blend::{blend, reconcile, BlendedCost, ProviderCostBreakdown, Reconciliation};
use crate::core::cache_savings::{
    or_zero, prompt_cache_hit_rate, response_hit_rate, CacheSavingsView, PromptCacheCost,
    ResponseCacheCheck,
};
use crate::core::cost::pricing::ModelPricing;
use crate::core::features::Feature;
use crate::core::formatter::{format_cost, format_number, format_percent, format_tokens};
use crate::core::models::daily::{DailySeriesResponse, ReportedSummary};
use crate::core::models::feature::{DeepResearchStats, ScholarStats, WebSearchStats};
use crate::core::models::usage::{EmbeddingStats, OverviewStats};
use crate::core::panel::{FeatureSnapshot, PanelState};
use crate::core::rollup::{
    paginate_rows, DeepResearchRow, EmbeddingRow, Paginator, ScholarRow, UserRow, WebSearchRow,
};
use crate::core::series::{build_chart, summarize, ChartData, ChartWindow, SeriesKind, SeriesSummary};
use crate::core::table::{alignments, headers, render_rows, Align, Column};

/// Inputs shared by every view besides the snapshot itself.
pub struct ViewContext<'a> {
    pub bot_name: &'a str,
    pub paginator: Paginator,
    pub page: usize,
    pub pricing: &'static ModelPricing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatCard {
    pub label: &'static str,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

fn card(label: &'static str, value: String) -> StatCard {
    StatCard {
        label,
        value,
        hint: None,
    }
}

fn card_with_hint(label: &'static str, value: String, hint: String) -> StatCard {
    StatCard {
        label,
        value,
        hint: Some(hint),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserTable {
    pub headers: Vec<&'static str>,
    pub aligns: Vec<Align>,
    pub cells: Vec<Vec<String>>,
    pub current_page: usize,
    pub total_pages: usize,
    pub has_previous: bool,
    pub has_next: bool,
    pub range: String,
}

fn user_table<U, R>(users: &[U], ctx: &ViewContext<'_>, columns: Vec<Column<R>>) -> UserTable
where
    R: for<'a> From<&'a U>,
{
    let mut paginator = ctx.paginator;
    paginator.go_to(ctx.page, users.len());
    let page = paginate_rows::<U, R>(&paginator, users);

    UserTable {
        headers: headers(&columns),
        aligns: alignments(&columns),
        cells: render_rows(&columns, &page.rows),
        current_page: page.current_page,
        total_pages: page.total_pages,
        has_previous: page.has_previous,
        has_next: page.has_next,
        range: page.range_label(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlendView {
    pub blended: BlendedCost,
    pub reconciliation: Reconciliation,
}

fn blend_view(
    breakdown: &[ProviderCostBreakdown],
    total_requests: u64,
    reported_total: Option<f64>,
) -> BlendView {
    let blended = blend(breakdown, total_requests);
    let reconciliation = reconcile(&blended, reported_total);
    BlendView {
        blended,
        reconciliation,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachePanel {
    pub savings: CacheSavingsView,
    /// Prompt-cache cost of the period's token totals at the configured model's rates.
    pub estimate: PromptCacheCost,
    pub response_check: ResponseCacheCheck,
    pub model: &'static str,
}

/// Everything shown for one feature.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureView {
    pub feature: Feature,
    pub title: String,
    pub window: ChartWindow,
    pub cards: PanelState<Vec<StatCard>>,
    pub chart: PanelState<ChartData>,
    pub summary: PanelState<SeriesSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported: Option<ReportedSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blend: Option<PanelState<BlendView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<PanelState<CachePanel>>,
    pub users: PanelState<UserTable>,
}

impl FeatureView {
    /// Distinct error messages across every panel, in display order.
    pub fn errors(&self) -> Vec<&str> {
        let mut errors: Vec<&str> = Vec::new();
        let optional = [
            self.blend.as_ref().and_then(|p| p.error()),
            self.cache.as_ref().and_then(|p| p.error()),
        ];
        let all = [
            self.cards.error(),
            self.chart.error(),
            self.summary.error(),
        ]
        .into_iter()
        .chain(optional)
        .chain([self.users.error()])
        .flatten();
        for msg in all {
            if !errors.contains(&msg) {
                errors.push(msg);
            }
        }
        errors
    }
}

fn base_view<S>(
    snap: &FeatureSnapshot<S, DailySeriesResponse>,
    title: String,
    kinds: &[SeriesKind],
) -> FeatureView {
    FeatureView {
        feature: snap.feature,
        title,
        window: snap.window,
        cards: PanelState::Loading,
        chart: snap
            .daily
            .as_ref()
            .map(|d| build_chart(d.daily_usage.as_slice(), kinds)),
        summary: snap.daily.as_ref().map(|d| summarize(d.daily_usage.as_slice())),
        reported: snap.daily.ready().map(DailySeriesResponse::reported),
        blend: None,
        cache: None,
        users: PanelState::Loading,
    }
}

fn cache_hit_rate_display(stats: &OverviewStats) -> String {
    stats
        .cache_hit_rate
        .clone()
        .unwrap_or_else(|| format_percent(response_hit_rate(stats.cached_requests, stats.total_requests)))
}

fn prompt_hit_rate_display(stats: &OverviewStats) -> Option<String> {
    stats.prompt_cache_hit_rate.clone().or_else(|| {
        let (read, input) = (stats.total_cache_read_tokens, stats.total_input_tokens);
        (read + input > 0).then(|| format_percent(prompt_cache_hit_rate(read, input)))
    })
}

pub fn overview(snap: &FeatureSnapshot<OverviewStats, DailySeriesResponse>, ctx: &ViewContext<'_>) -> FeatureView {
    let title = format!("{} {}", ctx.bot_name, snap.feature.display_name());
    let mut view = base_view(
        snap,
        title,
        &[
            SeriesKind::InputTokens,
            SeriesKind::OutputTokens,
            SeriesKind::CostCents,
        ],
    );

    view.cards = snap.stats.as_ref().map(|s| {
        vec![
            card_with_hint(
                "Total Tokens",
                format_number(s.total_tokens),
                format!(
                    "{} in / {} out",
                    format_tokens(s.total_input_tokens),
                    format_tokens(s.total_output_tokens)
                ),
            ),
            card_with_hint(
                "Requests",
                format_number(s.total_requests),
                format!("{} cached", format_number(s.cached_requests)),
            ),
            card("Active Users", format_number(s.user_count)),
            card("Cache Hit Rate", cache_hit_rate_display(s)),
            card("Cache Savings", format_cost(or_zero(s.total_cache_savings))),
        ]
    });
    view.users = snap
        .stats
        .as_ref()
        .map(|s| user_table::<_, UserRow>(&s.users, ctx, UserRow::columns()));
    view
}

pub fn cache_analytics(
    snap: &FeatureSnapshot<OverviewStats, DailySeriesResponse>,
    ctx: &ViewContext<'_>,
) -> FeatureView {
    let mut view = base_view(
        snap,
        snap.feature.display_name().to_string(),
        &[
            SeriesKind::PromptCacheSavingsCents,
            SeriesKind::ResponseCacheSavingsCents,
        ],
    );

    let summary = view.summary.ready().cloned();
    let buckets = snap
        .daily
        .ready()
        .map(|d| d.daily_usage.as_slice())
        .unwrap_or(&[]);
    view.cache = Some(snap.stats.as_ref().map(|s| {
        let prompt_rate = prompt_hit_rate_display(s);
        let savings = CacheSavingsView::new(
            s.cached_requests,
            s.total_requests,
            prompt_rate.as_deref(),
            summary.as_ref().map(|m| m.total_prompt_cache_savings),
            summary.as_ref().map(|m| m.total_response_cache_savings),
        );
        CachePanel {
            savings,
            estimate: PromptCacheCost::compute(
                s.total_input_tokens,
                s.total_output_tokens,
                s.total_cache_creation_tokens,
                s.total_cache_read_tokens,
                ctx.pricing,
            ),
            response_check: ResponseCacheCheck::from_buckets(buckets, ctx.pricing),
            model: ctx.pricing.model,
        }
    }));
    view.cards = snap.stats.as_ref().map(|s| {
        vec![
            card("Response Cache Hit Rate", cache_hit_rate_display(s)),
            card(
                "Prompt Cache Hit Rate",
                prompt_hit_rate_display(s).unwrap_or_else(|| "N/A".to_string()),
            ),
            card_with_hint(
                "Cache Tokens",
                format_number(s.total_cache_read_tokens),
                format!("{} written", format_number(s.total_cache_creation_tokens)),
            ),
        ]
    });
    view.users = snap
        .stats
        .as_ref()
        .map(|s| user_table::<_, UserRow>(&s.users, ctx, UserRow::columns()));
    view
}

pub fn embeddings(
    snap: &FeatureSnapshot<EmbeddingStats, DailySeriesResponse>,
    ctx: &ViewContext<'_>,
) -> FeatureView {
    let mut view = base_view(
        snap,
        snap.feature.display_name().to_string(),
        &[SeriesKind::Tokens, SeriesKind::CostCents],
    );
    view.cards = snap.stats.as_ref().map(|s| {
        vec![
            card("Total Tokens", format_number(s.total_tokens)),
            card("Total Cost", format_cost(s.total_cost)),
            card("Requests", format_number(s.total_requests)),
            card("Avg Tokens/Request", format!("{:.0}", s.avg_tokens_per_request)),
            card("Active Users", format_number(s.user_count)),
        ]
    });
    view.users = snap
        .stats
        .as_ref()
        .map(|s| user_table::<_, EmbeddingRow>(&s.users, ctx, EmbeddingRow::columns()));
    view
}

pub fn deep_research(
    snap: &FeatureSnapshot<DeepResearchStats, DailySeriesResponse>,
    ctx: &ViewContext<'_>,
) -> FeatureView {
    let mut view = base_view(
        snap,
        snap.feature.display_name().to_string(),
        &[SeriesKind::Requests, SeriesKind::CostCents],
    );
    view.cards = snap.stats.as_ref().map(|s| {
        vec![
            card_with_hint(
                "Queries",
                format_number(s.total_queries),
                format!("{} completed, {} failed", s.completed_queries, s.failed_queries),
            ),
            card(
                "Success Rate",
                s.success_rate.clone().unwrap_or_else(|| "N/A".to_string()),
            ),
            card("Sources Retrieved", format_number(s.total_sources_retrieved)),
            card("Total Cost", format_cost(or_zero(s.total_cost))),
            card("Active Users", format_number(s.user_count)),
        ]
    });
    view.blend = Some(
        snap.stats
            .as_ref()
            .map(|s| blend_view(&s.provider_breakdown(), s.total_queries, s.total_cost)),
    );
    view.users = snap
        .stats
        .as_ref()
        .map(|s| user_table::<_, DeepResearchRow>(&s.users, ctx, DeepResearchRow::columns()));
    view
}

pub fn web_search(
    snap: &FeatureSnapshot<WebSearchStats, DailySeriesResponse>,
    ctx: &ViewContext<'_>,
) -> FeatureView {
    let mut view = base_view(
        snap,
        snap.feature.display_name().to_string(),
        &[SeriesKind::Requests, SeriesKind::CostCents],
    );
    view.cards = snap.stats.as_ref().map(|s| {
        vec![
            card_with_hint(
                "Searches",
                format_number(s.total_searches),
                format!("{} requests", format_number(s.total_requests)),
            ),
            card(
                "Tokens",
                format_number(s.total_input_tokens + s.total_output_tokens),
            ),
            card("Total Cost", format_cost(or_zero(s.total_cost))),
            card(
                "Cost per Search",
                if s.total_searches > 0 {
                    format_cost(or_zero(s.total_cost) / s.total_searches as f64)
                } else {
                    "N/A".to_string()
                },
            ),
            card("Active Users", format_number(s.user_count)),
        ]
    });
    view.blend = Some(
        snap.stats
            .as_ref()
            .map(|s| blend_view(&s.provider_breakdown(), s.total_requests, s.total_cost)),
    );
    view.users = snap
        .stats
        .as_ref()
        .map(|s| user_table::<_, WebSearchRow>(&s.users, ctx, WebSearchRow::columns()));
    view
}

pub fn scholar(
    snap: &FeatureSnapshot<ScholarStats, DailySeriesResponse>,
    ctx: &ViewContext<'_>,
) -> FeatureView {
    let mut view = base_view(
        snap,
        snap.feature.display_name().to_string(),
        &[SeriesKind::Requests, SeriesKind::CostCents],
    );
    view.cards = snap.stats.as_ref().map(|s| {
        vec![
            card("Queries", format_number(s.total_queries)),
            card(
                "Tokens",
                format_number(s.total_input_tokens + s.total_output_tokens),
            ),
            card_with_hint(
                "Sources",
                format_number(s.total_deep_research_sources + s.total_web_search_sources),
                format!(
                    "{} deep research, {} web",
                    s.total_deep_research_sources, s.total_web_search_sources
                ),
            ),
            card("Total Cost", format_cost(or_zero(s.total_cost))),
            card("Active Users", format_number(s.user_count)),
        ]
    });
    view.blend = Some(
        snap.stats
            .as_ref()
            .map(|s| blend_view(&s.provider_breakdown(), s.total_queries, s.total_cost)),
    );
    view.users = snap
        .stats
        .as_ref()
        .map(|s| user_table::<_, ScholarRow>(&s.users, ctx, ScholarRow::columns()));
    view
}
