use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use crate::cli::output::{terminal_width, OutputFormat, OutputOptions};
use crate::cli::renderer;
use crate::cli::views::{self, FeatureView, ViewContext};
use crate::core::client::AnalyticsClient;
use crate::core::config::AppConfig;
use crate::core::cost::pricing;
use crate::core::features::Feature;
use crate::core::panel::{Dashboard, FeatureSnapshot};
use crate::core::rollup::Paginator;
use crate::core::series::ChartWindow;

pub struct AnalyticsArgs {
    pub feature: Feature,
    pub window: Option<ChartWindow>,
    pub page: usize,
    pub per_page: Option<usize>,
}

async fn load<S, D>(
    client: &AnalyticsClient,
    feature: Feature,
    window: ChartWindow,
) -> FeatureSnapshot<S, D>
where
    S: DeserializeOwned,
    D: DeserializeOwned,
{
    let dashboard = Dashboard::new(client.clone(), feature, window);
    dashboard.refresh(window).await;
    dashboard.into_snapshot()
}

async fn build_view(
    client: &AnalyticsClient,
    feature: Feature,
    window: ChartWindow,
    ctx: &ViewContext<'_>,
) -> FeatureView {
    match feature {
        Feature::Overview => views::overview(&load(client, feature, window).await, ctx),
        Feature::CacheAnalytics => views::cache_analytics(&load(client, feature, window).await, ctx),
        Feature::Embeddings => views::embeddings(&load(client, feature, window).await, ctx),
        Feature::DeepResearch => views::deep_research(&load(client, feature, window).await, ctx),
        Feature::WebSearch => views::web_search(&load(client, feature, window).await, ctx),
        Feature::ScholarMode => views::scholar(&load(client, feature, window).await, ctx),
    }
}

pub async fn run(args: AnalyticsArgs, config: &AppConfig, opts: &OutputOptions) -> Result<()> {
    let window = args.window.unwrap_or_else(|| config.window());
    let per_page = args.per_page.unwrap_or(config.settings.items_per_page);
    let client = AnalyticsClient::new(&config.api)
        .with_context(|| format!("Invalid API base URL '{}'", config.api.base_url))?;

    let ctx = ViewContext {
        bot_name: &config.bot_name,
        paginator: Paginator::new(per_page),
        page: args.page,
        pricing: pricing::get_model_info(config.settings.model.as_deref()),
    };

    tracing::debug!(
        feature = args.feature.id(),
        days = window.days(),
        page = args.page,
        per_page,
        "loading analytics"
    );

    // Show spinner on stderr (text mode only)
    let spinner = if matches!(opts.format, OutputFormat::Text) {
        let msg = format!("Loading {}...", args.feature.display_name());
        Some(tokio::spawn(async move {
            let frames = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
            let mut i = 0usize;
            loop {
                eprint!("\r {} {}", frames[i % frames.len()], msg);
                i = i.wrapping_add(1);
                tokio::time::sleep(std::time::Duration::from_millis(80)).await;
            }
        }))
    } else {
        None
    };

    let view = build_view(&client, args.feature, window, &ctx).await;

    // Stop spinner and clear the line
    if let Some(s) = spinner {
        s.abort();
        eprint!("\r\x1b[2K");
    }

    match opts.format {
        OutputFormat::Text => {
            println!(
                "{}",
                renderer::render_view(&view, terminal_width(), opts.use_color)
            );
        }
        OutputFormat::Json => {
            println!("{}", opts.to_json(&view)?);
            if opts.verbose {
                for msg in view.errors() {
                    eprintln!("{}", msg);
                }
            }
        }
    }

    Ok(())
}
