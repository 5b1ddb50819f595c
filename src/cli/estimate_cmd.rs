use anyhow::Result;
use colored::{control, Colorize};
use serde::Serialize;

use crate::cli::output::{OutputFormat, OutputOptions};
use crate::core::client::AnalyticsClient;
use crate::core::config::AppConfig;
use crate::core::cost::estimator::{
    estimate_cohere_cost, estimate_cost, estimate_cost_value, estimate_embedding_cost,
};
use crate::core::cost::pricing::{self, ModelPricing};
use crate::core::formatter::{format_cost, format_number};

pub struct EstimateArgs {
    pub input_tokens: f64,
    pub output_tokens: f64,
    pub model: Option<String>,
    pub embedding_tokens: Option<f64>,
    pub embedding_model: Option<String>,
    pub searches: Option<f64>,
}

/// Where the model id came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSource {
    Argument,
    Backend,
    Config,
    Default,
}

#[derive(Debug, Serialize)]
struct EstimateReport {
    requested_model: Option<String>,
    model: &'static str,
    display_name: &'static str,
    source: ModelSource,
    input_tokens: f64,
    output_tokens: f64,
    input_per_mtok: f64,
    output_per_mtok: f64,
    cost: String,
    cost_value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    embedding_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    search_cost: Option<f64>,
}

/// Explicit model first, then the chatbot setting from the backend, then
/// the configured model. `None` means the default pricing row.
async fn resolve_model(
    explicit: Option<String>,
    config: &AppConfig,
) -> (Option<String>, ModelSource) {
    if let Some(model) = explicit {
        return (Some(model), ModelSource::Argument);
    }

    let from_backend = match AnalyticsClient::new(&config.api) {
        Ok(client) => match client.fetch_model_settings().await {
            Ok(settings) => settings.model.filter(|m| !m.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "could not read chatbot model setting");
                None
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "skipping chatbot model lookup");
            None
        }
    };
    if let Some(model) = from_backend {
        return (Some(model), ModelSource::Backend);
    }

    match &config.settings.model {
        Some(model) => (Some(model.clone()), ModelSource::Config),
        None => (None, ModelSource::Default),
    }
}

fn build_report(
    args: &EstimateArgs,
    requested: Option<String>,
    source: ModelSource,
    row: &'static ModelPricing,
) -> EstimateReport {
    EstimateReport {
        requested_model: requested,
        model: row.model,
        display_name: row.display_name,
        source,
        input_tokens: args.input_tokens,
        output_tokens: args.output_tokens,
        input_per_mtok: row.input_per_mtok,
        output_per_mtok: row.output_per_mtok,
        cost: estimate_cost(args.input_tokens, args.output_tokens, Some(row.model)),
        cost_value: estimate_cost_value(args.input_tokens, args.output_tokens, Some(row.model)),
        embedding_cost: args
            .embedding_tokens
            .map(|t| estimate_embedding_cost(t, args.embedding_model.as_deref())),
        search_cost: args.searches.map(estimate_cohere_cost),
    }
}

pub async fn run(args: EstimateArgs, config: &AppConfig, opts: &OutputOptions) -> Result<()> {
    let (requested, source) = resolve_model(args.model.clone(), config).await;
    if let Some(model) = &requested {
        if pricing::lookup(model).is_none() {
            tracing::warn!(model = %model, "unknown model, using default pricing");
        }
    }
    let row = pricing::get_model_info(requested.as_deref());
    let report = build_report(&args, requested, source, row);

    match opts.format {
        OutputFormat::Text => {
            control::set_override(opts.use_color);
            let mut lines = vec![format!(" Cost estimate ({})", report.display_name)
                .bold()
                .to_string()];
            lines.push(format!(
                "  {}  {} in / {} out",
                format!("{:<10}", "Tokens").cyan(),
                format_number(report.input_tokens.max(0.0) as u64),
                format_number(report.output_tokens.max(0.0) as u64)
            ));
            lines.push(format!(
                "  {}  ${} / ${} per Mtok",
                format!("{:<10}", "Rates").cyan(),
                report.input_per_mtok,
                report.output_per_mtok
            ));
            lines.push(format!(
                "  {}  ${}",
                format!("{:<10}", "Cost").cyan(),
                report.cost.green()
            ));
            if let Some(cost) = report.embedding_cost {
                lines.push(format!(
                    "  {}  {}",
                    format!("{:<10}", "Embedding").cyan(),
                    format_cost(cost)
                ));
            }
            if let Some(cost) = report.search_cost {
                lines.push(format!(
                    "  {}  {}",
                    format!("{:<10}", "Searches").cyan(),
                    format_cost(cost)
                ));
            }
            if report.source == ModelSource::Default
                || report.requested_model.as_deref() != Some(report.model)
            {
                lines.push(
                    format!("  Using {} pricing", report.model)
                        .dimmed()
                        .to_string(),
                );
            }
            println!("{}", lines.join("\n"));
        }
        OutputFormat::Json => println!("{}", opts.to_json(&report)?),
    }
    Ok(())
}

/// Print the pricing table.
pub fn models(opts: &OutputOptions) -> Result<()> {
    let rows = pricing::all_models();
    match opts.format {
        OutputFormat::Text => {
            control::set_override(opts.use_color);
            let width = rows.iter().map(|r| r.model.len()).max().unwrap_or(0);
            let mut lines = vec![" Model pricing (USD per million tokens)".bold().to_string()];
            for row in rows {
                let marker = if row.model == pricing::DEFAULT_MODEL {
                    " (default)".dimmed().to_string()
                } else {
                    String::new()
                };
                lines.push(format!(
                    "  {}  {:>7} in  {:>7} out  {}{}",
                    format!("{:<width$}", row.model, width = width).cyan(),
                    format!("${:.2}", row.input_per_mtok),
                    format!("${:.2}", row.output_per_mtok),
                    row.display_name,
                    marker
                ));
            }
            println!("{}", lines.join("\n"));
        }
        OutputFormat::Json => println!("{}", opts.to_json(&rows)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ApiConfig;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn args(model: Option<&str>) -> EstimateArgs {
        EstimateArgs {
            input_tokens: 1_000_000.0,
            output_tokens: 500_000.0,
            model: model.map(str::to_string),
            embedding_tokens: None,
            embedding_model: None,
            searches: None,
        }
    }

    fn config_for(base_url: String) -> AppConfig {
        AppConfig {
            api: ApiConfig {
                base_url,
                token: None,
            },
            ..Default::default()
        }
    }

    #[test]
    fn report_for_default_row() {
        let row = pricing::default_pricing();
        let report = build_report(&args(None), None, ModelSource::Default, row);
        assert_eq!(report.cost, "0.8750");
        assert_eq!(report.model, "claude-3-haiku-20240307");
    }

    #[test]
    fn report_includes_extra_costs() {
        let mut a = args(None);
        a.embedding_tokens = Some(1_000_000.0);
        a.searches = Some(1000.0);
        let report = build_report(&a, None, ModelSource::Default, pricing::default_pricing());
        assert!((report.embedding_cost.unwrap() - 0.02).abs() < 1e-12);
        assert!((report.search_cost.unwrap() - 2.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn explicit_model_skips_backend() {
        let config = config_for("http://127.0.0.1:9".to_string());
        let (model, source) = resolve_model(Some("gpt-4o-mini".into()), &config).await;
        assert_eq!(model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(source, ModelSource::Argument);
    }

    #[tokio::test]
    async fn backend_setting_is_used() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/admin/chatbot/settings"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "model": "claude-sonnet-4-20250514" })),
            )
            .mount(&server)
            .await;

        let (model, source) = resolve_model(None, &config_for(server.uri())).await;
        assert_eq!(model.as_deref(), Some("claude-sonnet-4-20250514"));
        assert_eq!(source, ModelSource::Backend);
    }

    #[tokio::test]
    async fn backend_failure_falls_back_to_default() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (model, source) = resolve_model(None, &config_for(server.uri())).await;
        assert!(model.is_none());
        assert_eq!(source, ModelSource::Default);
        assert!(std::ptr::eq(
            pricing::get_model_info(model.as_deref()),
            pricing::default_pricing()
        ));
    }

    #[tokio::test]
    async fn backend_failure_prefers_configured_model() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let mut config = config_for(server.uri());
        config.settings.model = Some("gpt-4o-mini".to_string());
        let (model, source) = resolve_model(None, &config).await;
        assert_eq!(model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(source, ModelSource::Config);
    }
}
