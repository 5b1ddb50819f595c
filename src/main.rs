mod cli;
mod core;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::cli::analytics_cmd::AnalyticsArgs;
use crate::cli::estimate_cmd::EstimateArgs;
use crate::cli::output::{detect_color, OutputFormat, OutputOptions};
use crate::core::config::AppConfig;
use crate::core::features::Feature;
use crate::core::series::ChartWindow;

#[derive(Parser)]
#[command(name = "zu", about = "Usage and cost analytics for the Zygotrix platform", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<String>,

    /// Shorthand for --format json
    #[arg(short = 'j', long = "json", global = true)]
    json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    /// Verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args, Default)]
struct ViewArgs {
    /// Reporting window in days (7, 14, 30, 60 or 90)
    #[arg(short, long)]
    days: Option<ChartWindow>,

    /// User table page (1-based)
    #[arg(short, long, default_value_t = 1)]
    page: usize,

    /// Users per page (5, 10, 25 or 50)
    #[arg(long)]
    per_page: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chatbot token usage (default)
    Overview(ViewArgs),
    /// Embedding usage and cost
    Embeddings(ViewArgs),
    /// Deep research usage with per-provider costs
    DeepResearch(ViewArgs),
    /// Web search usage with search and token costs
    WebSearch(ViewArgs),
    /// Scholar mode usage with source costs
    Scholar(ViewArgs),
    /// Prompt and response cache savings
    Cache(ViewArgs),
    /// Estimate the cost of a request
    Estimate {
        /// Input tokens
        #[arg(long)]
        input: f64,

        /// Output tokens
        #[arg(long)]
        output: f64,

        /// Model id (default: the chatbot's configured model)
        #[arg(short, long)]
        model: Option<String>,

        /// Also price this many embedding tokens
        #[arg(long)]
        embedding_tokens: Option<f64>,

        /// Embedding model id
        #[arg(long)]
        embedding_model: Option<String>,

        /// Also price this many reranking searches
        #[arg(long)]
        searches: Option<f64>,
    },
    /// List model pricing
    Models,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Generate default config file
    Init,
    /// Validate config file
    Check,
    /// Print the config file path
    Path,
}

fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let filter = if verbose {
        EnvFilter::new("warn,zu=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn analytics_args(feature: Feature, args: ViewArgs) -> AnalyticsArgs {
    AnalyticsArgs {
        feature,
        window: args.days,
        page: args.page,
        per_page: args.per_page,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let loaded = AppConfig::load();
    let (default_format, color) = match &loaded {
        Ok(c) => (c.settings.default_format.as_str(), c.settings.color.as_str()),
        Err(_) => ("text", "auto"),
    };
    let output_opts = OutputOptions {
        format: OutputFormat::resolve(cli.json, cli.format.as_deref(), default_format),
        pretty: cli.pretty,
        use_color: detect_color(!cli.no_color, color),
        verbose: cli.verbose,
    };
    let config = || {
        loaded
            .as_ref()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    };

    let command = cli
        .command
        .unwrap_or_else(|| Commands::Overview(ViewArgs::default()));
    match command {
        Commands::Overview(args) => {
            let args = analytics_args(Feature::Overview, args);
            cli::analytics_cmd::run(args, config()?, &output_opts).await?
        }
        Commands::Embeddings(args) => {
            let args = analytics_args(Feature::Embeddings, args);
            cli::analytics_cmd::run(args, config()?, &output_opts).await?
        }
        Commands::DeepResearch(args) => {
            let args = analytics_args(Feature::DeepResearch, args);
            cli::analytics_cmd::run(args, config()?, &output_opts).await?
        }
        Commands::WebSearch(args) => {
            let args = analytics_args(Feature::WebSearch, args);
            cli::analytics_cmd::run(args, config()?, &output_opts).await?
        }
        Commands::Scholar(args) => {
            let args = analytics_args(Feature::ScholarMode, args);
            cli::analytics_cmd::run(args, config()?, &output_opts).await?
        }
        Commands::Cache(args) => {
            let args = analytics_args(Feature::CacheAnalytics, args);
            cli::analytics_cmd::run(args, config()?, &output_opts).await?
        }
        Commands::Estimate {
            input,
            output,
            model,
            embedding_tokens,
            embedding_model,
            searches,
        } => {
            let args = EstimateArgs {
                input_tokens: input,
                output_tokens: output,
                model,
                embedding_tokens,
                embedding_model,
                searches,
            };
            cli::estimate_cmd::run(args, config()?, &output_opts).await?
        }
        Commands::Models => cli::estimate_cmd::models(&output_opts)?,
        Commands::Config { action } => match action {
            ConfigAction::Init => cli::config_cmd::init(&output_opts)?,
            ConfigAction::Check => cli::config_cmd::check(&output_opts)?,
            ConfigAction::Path => cli::config_cmd::path(&output_opts)?,
        },
    }

    Ok(())
}
