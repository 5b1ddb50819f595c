use colored::{control, Colorize};

use crate::cli::views::{BlendView, CachePanel, FeatureView, StatCard, UserTable};
use crate::core::blend::Reconciliation;
use crate::core::cache_savings::RESPONSE_CACHE_TOKENS_PER_HIT;
use crate::core::formatter::{
    format_bar, format_cost, format_dollars, format_number, format_percent, format_tokens,
};
use crate::core::panel::PanelState;
use crate::core::series::{from_cents, ChartData, Dataset, SeriesSummary, SeriesUnit};
use crate::core::table::build_table;

const MIN_BAR_WIDTH: usize = 10;
const MAX_BAR_WIDTH: usize = 50;
/// Room taken by the date label, value column and margins.
const CHART_CHROME: usize = 30;
const TABLE_INDENT: &str = "  ";

/// Render a full feature view as a colored (or plain) string.
///
/// Layout:
/// ```text
///  Deep Research · Last 30 days
///   Queries              1,234  (1200 completed, 34 failed)
///   Total Cost           $4.5600
///
///  Daily Requests
///   Jan 5   ██████████        12
///
///  Summary
///   Avg Daily Cost       $0.1520
///   Projected Monthly    $4.56
///
///  Providers
///   OpenAI      1.2K tokens   $0.0200   13.3%
///
///  Users
///   User      Queries   Cost
///   ◀ Prev   Page 1 of 3   Next ▶
/// ```
pub fn render_view(view: &FeatureView, terminal_width: usize, use_color: bool) -> String {
    control::set_override(use_color);

    let mut shown: Vec<&str> = Vec::new();
    let mut sections: Vec<String> = Vec::new();

    let header = format!(" {} · {}", view.title, view.window);
    let mut head = vec![header.bold().to_string()];
    match &view.cards {
        PanelState::Ready(cards) => head.extend(render_cards(cards)),
        PanelState::Error(msg) => {
            shown.push(msg);
            head.push(error_banner(msg));
        }
        PanelState::Loading => head.push(loading_line()),
    }
    sections.push(head.join("\n"));

    let bar_width = terminal_width
        .saturating_sub(CHART_CHROME)
        .clamp(MIN_BAR_WIDTH, MAX_BAR_WIDTH);
    sections.extend(panel(&view.chart, &mut shown, |chart| {
        render_chart(chart, bar_width)
    }));
    sections.extend(panel(&view.summary, &mut shown, render_summary));
    if let Some(cache) = &view.cache {
        sections.extend(panel(cache, &mut shown, render_cache));
    }
    if let Some(blend) = &view.blend {
        sections.extend(panel(blend, &mut shown, render_blend));
    }
    let table_width = terminal_width
        .saturating_sub(TABLE_INDENT.len())
        .min(u16::MAX as usize) as u16;
    sections.extend(panel(&view.users, &mut shown, |table| {
        render_table(table, table_width, use_color)
    }));

    sections.join("\n\n")
}

/// Rendered content, a red banner, or a loading line. Panels fed by the
/// same failed fetch share a message, which is shown once.
fn panel<'a, T>(
    state: &'a PanelState<T>,
    shown: &mut Vec<&'a str>,
    render: impl FnOnce(&T) -> String,
) -> Option<String> {
    if state.is_loading() {
        return Some(loading_line());
    }
    match state {
        PanelState::Ready(value) => Some(render(value)),
        PanelState::Error(msg) if shown.contains(&msg.as_str()) => None,
        PanelState::Error(msg) => {
            shown.push(msg);
            Some(error_banner(msg))
        }
        PanelState::Loading => None,
    }
}

fn error_banner(msg: &str) -> String {
    format!("  {}", msg).red().to_string()
}

fn loading_line() -> String {
    "  Loading...".dimmed().to_string()
}

fn section_title(title: &str) -> String {
    format!(" {}", title).bold().to_string()
}

fn render_cards(cards: &[StatCard]) -> Vec<String> {
    let width = cards.iter().map(|c| c.label.len()).max().unwrap_or(0);
    cards
        .iter()
        .map(|c| {
            let label = format!("{:<width$}", c.label, width = width);
            match &c.hint {
                Some(hint) => format!(
                    "  {}  {}  {}",
                    label.cyan(),
                    c.value,
                    format!("({})", hint).dimmed()
                ),
                None => format!("  {}  {}", label.cyan(), c.value),
            }
        })
        .collect()
}

fn point_value(dataset: &Dataset, value: f64) -> String {
    match dataset.unit {
        SeriesUnit::Cents => format_cost(from_cents(value)),
        SeriesUnit::Count => format_number(value.round() as u64),
    }
}

fn render_chart(chart: &ChartData, bar_width: usize) -> String {
    if chart.is_empty() {
        return format!("{}\n  {}", section_title("Daily Usage"), "No data available".dimmed());
    }

    let label_width = chart.labels.iter().map(|l| l.len()).max().unwrap_or(0);
    let mut blocks = Vec::new();
    for dataset in &chart.datasets {
        let max = dataset.max();
        let mut lines = vec![section_title(&format!("Daily {}", dataset.label))];
        for (label, value) in chart.labels.iter().zip(&dataset.values) {
            let bar = format!("{:<bw$}", format_bar(*value, max, bar_width), bw = bar_width);
            lines.push(format!(
                "  {:<lw$}  {}  {}",
                label,
                bar.magenta(),
                point_value(dataset, *value),
                lw = label_width
            ));
        }
        blocks.push(lines.join("\n"));
    }
    blocks.join("\n\n")
}

fn render_summary(summary: &SeriesSummary) -> String {
    let mut lines = vec![section_title("Summary")];
    let rows: Vec<(&str, String)> = vec![
        ("Days With Data", summary.days_with_data.to_string()),
        ("Total Cost", format_cost(summary.total_cost)),
        ("Avg Daily Cost", format_cost(summary.avg_daily_cost)),
        ("Projected Monthly", format_dollars(summary.projected_monthly_cost)),
        ("Avg Daily Tokens", format_tokens(summary.avg_daily_tokens.round() as u64)),
    ];
    for (label, value) in rows {
        lines.push(format!("  {}  {}", format!("{:<18}", label).cyan(), value));
    }
    if summary.total_cache_savings > 0.0 {
        lines.push(format!(
            "  {}  {}  {}",
            format!("{:<18}", "Cache Savings").cyan(),
            format_cost(summary.total_cache_savings),
            format!(
                "(~{}/month)",
                format_dollars(summary.projected_monthly_savings)
            )
            .dimmed()
        ));
    }
    lines.join("\n")
}

fn render_cache(cache: &CachePanel) -> String {
    let s = &cache.savings;
    let mut lines = vec![section_title("Cache Savings")];
    lines.push(format!(
        "  {}  {}",
        format!("{:<18}", "Response Hits").cyan(),
        format_percent(s.response_hit_rate)
    ));
    lines.push(format!(
        "  {}  {}",
        format!("{:<18}", "Prompt Hits").cyan(),
        s.prompt_cache_hit_rate
    ));
    lines.push(format!(
        "  {}  {}",
        format!("{:<18}", "Prompt Cache").cyan(),
        format_cost(s.prompt_cache_savings)
    ));
    lines.push(format!(
        "  {}  {}",
        format!("{:<18}", "Response Cache").cyan(),
        format_cost(s.response_cache_savings)
    ));
    lines.push(format!(
        "  {}  {}",
        format!("{:<18}", "Total").cyan(),
        format_cost(s.total_savings).green()
    ));
    lines.push(
        format!(
            "  Prompt caching at {} rates: {} billed, {} without cache",
            cache.model,
            format_cost(cache.estimate.total_cost),
            format_cost(cache.estimate.cost_without_cache + cache.estimate.output_cost)
        )
        .dimmed()
        .to_string(),
    );
    let check = &cache.response_check;
    lines.push(
        format!(
            "  Response cache estimate: {} for {} cached responses at {} tokens each",
            format_cost(check.estimated),
            format_number(check.cached_responses),
            RESPONSE_CACHE_TOKENS_PER_HIT
        )
        .dimmed()
        .to_string(),
    );
    if let Reconciliation::Mismatch { computed, reported } = check.reconciliation {
        lines.push(
            format!(
                "  Note: estimated response-cache savings {}, backend reports {}",
                format_cost(computed),
                format_cost(reported)
            )
            .yellow()
            .to_string(),
        );
    }
    lines.join("\n")
}

fn render_blend(view: &BlendView) -> String {
    let blended = &view.blended;
    let mut lines = vec![section_title("Providers")];
    for p in &blended.providers {
        let usage = format!("{} {}", format_tokens(p.usage), p.unit);
        let per_request = p
            .avg_per_request
            .map(|v| format!("{}/req", format_cost(v)))
            .unwrap_or_default();
        lines.push(format!(
            "  {}  {:>16}  {:>9}  {:>6}  {}",
            format!("{:<10}", p.provider.display_name()).cyan(),
            usage,
            format_cost(p.cost),
            format_percent(p.share_percent),
            per_request.dimmed()
        ));
    }
    lines.push(format!(
        "  {}  {} total, ${} per request ({} requests)",
        format!("{:<10}", "Blended").cyan(),
        format_cost(blended.total_cost),
        blended.avg_cost_per_request_display(),
        format_number(blended.total_requests)
    ));
    if let Reconciliation::Mismatch { computed, reported } = view.reconciliation {
        lines.push(
            format!(
                "  Note: provider costs sum to {}, backend reports {}",
                format_cost(computed),
                format_cost(reported)
            )
            .yellow()
            .to_string(),
        );
    }
    lines.join("\n")
}

fn render_table(table: &UserTable, width: u16, use_color: bool) -> String {
    let mut lines = vec![section_title("Users")];
    if table.cells.is_empty() {
        lines.push(format!("  {}", "No users".dimmed()));
        return lines.join("\n");
    }

    let grid = build_table(&table.headers, &table.aligns, &table.cells, width, use_color);
    lines.extend(
        grid.to_string()
            .lines()
            .map(|line| format!("{}{}", TABLE_INDENT, line)),
    );

    let prev = if table.has_previous {
        "◀ Prev".normal()
    } else {
        "◀ Prev".dimmed()
    };
    let next = if table.has_next {
        "Next ▶".normal()
    } else {
        "Next ▶".dimmed()
    };
    lines.push(format!(
        "  {}   Page {} of {}   {}",
        prev,
        table.current_page,
        table.total_pages.max(1),
        next
    ));
    lines.push(format!("  {}", table.range.dimmed()));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::blend::{blend, CostProvider, ProviderCostBreakdown};
    use crate::core::features::Feature;
    use crate::core::series::{ChartWindow, SeriesKind};
    use crate::core::table::Align;

    fn make_view() -> FeatureView {
        FeatureView {
            feature: Feature::WebSearch,
            title: "Web Search".to_string(),
            window: ChartWindow::Week,
            cards: PanelState::Ready(vec![StatCard {
                label: "Searches",
                value: "1,234".to_string(),
                hint: Some("7 days".to_string()),
            }]),
            chart: PanelState::Ready(ChartData::default()),
            summary: PanelState::Ready(SeriesSummary::default()),
            reported: None,
            blend: None,
            cache: None,
            users: PanelState::Ready(UserTable {
                headers: vec!["User", "Searches"],
                aligns: vec![Align::Left, Align::Right],
                cells: vec![vec!["ada".to_string(), "12".to_string()]],
                current_page: 1,
                total_pages: 1,
                has_previous: false,
                has_next: false,
                range: "Showing 1-1 of 1 users".to_string(),
            }),
        }
    }

    #[test]
    fn render_contains_title_and_cards() {
        let output = render_view(&make_view(), 80, false);
        assert!(output.contains("Web Search · Last 7 days"));
        assert!(output.contains("1,234"));
        assert!(output.contains("(7 days)"));
    }

    #[test]
    fn empty_chart_shows_placeholder() {
        let output = render_view(&make_view(), 80, false);
        assert!(output.contains("No data available"));
    }

    #[test]
    fn chart_shows_dollars_for_cents_series() {
        let mut bucket = crate::core::models::daily::DailyUsageBucket::empty(
            chrono::NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
        );
        bucket.cost = 0.0123;
        let chart = crate::core::series::build_chart(
            vec![bucket].as_slice(),
            &[SeriesKind::CostCents],
        );
        let mut view = make_view();
        view.chart = PanelState::Ready(chart);
        let output = render_view(&view, 80, false);
        assert!(output.contains("Jan 5"));
        assert!(output.contains("$0.0123"));
        assert!(!output.contains("No data available"));
    }

    #[test]
    fn error_panels_show_banner() {
        let mut view = make_view();
        view.cards = PanelState::Error("Failed to load statistics: HTTP 500: boom".to_string());
        view.users = PanelState::Error("Failed to load statistics: HTTP 500: boom".to_string());
        let output = render_view(&view, 80, false);
        assert!(output.contains("Failed to load statistics"));
        assert!(!output.contains("Users"));
    }

    #[test]
    fn distinct_panel_errors_each_get_a_banner() {
        let mut view = make_view();
        view.summary = PanelState::Error("Failed to load daily usage: HTTP 502".to_string());
        view.users = PanelState::Error("Failed to load statistics: HTTP 500".to_string());
        view.cards = PanelState::Error("Failed to load statistics: HTTP 500".to_string());
        let output = render_view(&view, 80, false);
        assert!(output.contains("Failed to load daily usage: HTTP 502"));
        assert_eq!(output.matches("Failed to load statistics").count(), 1);
    }

    #[test]
    fn loading_panels_show_loading_line() {
        let mut view = make_view();
        view.users = PanelState::Loading;
        let output = render_view(&view, 80, false);
        assert!(output.contains("Loading..."));
        assert!(!output.contains("Page 1 of 1"));
    }

    #[test]
    fn table_is_drawn_with_borders() {
        let output = render_view(&make_view(), 80, false);
        let row = output.lines().find(|l| l.contains("ada")).unwrap();
        assert!(row.starts_with("  │"), "{}", row);
        assert!(row.contains("       12 │"), "{}", row);
    }

    #[test]
    fn table_has_pagination_controls() {
        let output = render_view(&make_view(), 80, false);
        assert!(output.contains("Page 1 of 1"));
        assert!(output.contains("◀ Prev"));
        assert!(output.contains("Next ▶"));
        assert!(output.contains("Showing 1-1 of 1 users"));
    }

    #[test]
    fn blend_footer_and_mismatch_note() {
        let mut view = make_view();
        let blended = blend(
            &[
                ProviderCostBreakdown::tokens(CostProvider::Claude, 1000, 500, Some(0.01)),
                ProviderCostBreakdown::searches(CostProvider::SearchApi, 4, Some(0.02)),
            ],
            0,
        );
        view.blend = Some(PanelState::Ready(BlendView {
            blended,
            reconciliation: Reconciliation::Mismatch {
                computed: 0.03,
                reported: 0.05,
            },
        }));
        let output = render_view(&view, 80, false);
        assert!(output.contains("Search API"));
        assert!(output.contains("4 searches"));
        assert!(output.contains("$0.0000 per request"));
        assert!(output.contains("backend reports $0.0500"));
    }

    #[test]
    fn render_no_ansi_when_color_false() {
        let output = render_view(&make_view(), 80, false);
        assert!(!output.contains('\x1b'), "output should not contain ANSI codes");
    }
}
