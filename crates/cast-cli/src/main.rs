//! Command-line interface for pricecast backtests

use anyhow::Context;
use cast_backtest::{BacktestRunner, BacktestSnapshot, report};
use cast_llm::LLMProvider;
use cast_llm::providers::{AnthropicProvider, OpenAIProvider};
use cast_market::{
    FinnhubClient, MarketConfig, PriceSource, RedditClient, StepCache, YahooFinanceClient,
};
use cast_pipeline::LlmPredictor;
use chrono::Utc;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ProviderKind {
    Anthropic,
    Openai,
}

#[derive(Parser, Debug)]
#[command(name = "pricecast")]
#[command(about = "Backtest LLM stock predictions against observed prices", long_about = None)]
struct Args {
    /// Stock symbols to run the backtest for
    #[arg(long, num_args = 1.., default_values_t = default_symbols())]
    symbols: Vec<String>,

    /// Directory for results and text reports
    #[arg(long, default_value = "backtest_reports")]
    output_dir: PathBuf,

    /// Path to an existing results file (required with --report-only)
    #[arg(long)]
    results_file: Option<PathBuf>,

    /// Only regenerate the text report from an existing results file
    #[arg(long)]
    report_only: bool,

    /// LLM provider to use
    #[arg(long, value_enum, default_value_t = ProviderKind::Anthropic)]
    provider: ProviderKind,

    /// Model identifier override
    #[arg(long)]
    model: Option<String>,
}

fn default_symbols() -> Vec<String> {
    ["AAPL", "MSFT", "GOOGL", "AMZN", "META"]
        .iter()
        .map(|s| (*s).to_string())
        .collect()
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();

    if args.report_only {
        return report_only(&args);
    }

    run_backtest(&args).await
}

/// Regenerate the text report from a saved snapshot; touches no network
fn report_only(args: &Args) -> anyhow::Result<()> {
    let results_file = args
        .results_file
        .as_ref()
        .context("--results-file is required with --report-only")?;

    info!(results_file = %results_file.display(), "Generating text report");

    let snapshot = BacktestSnapshot::load(results_file)
        .with_context(|| format!("load snapshot from {}", results_file.display()))?;
    let report_path = report::write_report(&snapshot, &args.output_dir)?;

    print_summary(&snapshot);
    println!("\nText report saved to: {}", report_path.display());
    Ok(())
}

async fn run_backtest(args: &Args) -> anyhow::Result<()> {
    info!(symbols = ?args.symbols, "Starting backtest");

    let config = MarketConfig::default().with_env();
    config.validate().context("invalid market configuration")?;

    let llm: Arc<dyn LLMProvider> = match args.provider {
        ProviderKind::Anthropic => Arc::new(AnthropicProvider::from_env()?),
        ProviderKind::Openai => Arc::new(OpenAIProvider::from_env()?),
    };

    let prices: Arc<dyn PriceSource> = Arc::new(YahooFinanceClient::new());
    let cache = StepCache::new(config.cache_ttl);

    let mut predictor = LlmPredictor::new(Arc::clone(&llm), Arc::clone(&prices), cache);
    if let Some(model) = &args.model {
        predictor = predictor.with_model(model.clone());
    }
    if let Some(key) = &config.finnhub_api_key {
        predictor = predictor.with_news(Arc::new(FinnhubClient::new(
            key.clone(),
            config.finnhub_rate_limit,
        )));
    } else {
        info!("FINNHUB_API_KEY not set; running without news data");
    }
    predictor = predictor.with_social(Arc::new(RedditClient::new(
        config.reddit_user_agent.clone(),
        config.request_timeout,
    )?));

    let runner = BacktestRunner::new(Arc::new(predictor), prices);
    let run = runner.run(&args.symbols, Utc::now().date_naive()).await;

    let generated_at = Utc::now();
    let snapshot = BacktestSnapshot::from_run(&run, generated_at);

    std::fs::create_dir_all(&args.output_dir)?;
    let results_path = args.output_dir.join(format!(
        "backtest_results_{}.json",
        generated_at.format("%Y%m%d_%H%M%S")
    ));
    snapshot.save(&results_path)?;
    info!(results_file = %results_path.display(), "Backtest results saved");

    let report_path = report::write_report(&snapshot, &args.output_dir)?;

    print_summary(&snapshot);
    println!("\nResults saved to: {}", results_path.display());
    println!("Text report saved to: {}", report_path.display());
    Ok(())
}

fn print_summary(snapshot: &BacktestSnapshot) {
    let stats = snapshot.aggregate();

    println!("\nBacktest Summary:");
    println!("Total symbols tested: {}", stats.total);

    if let Some(ratio) = stats.success_ratio() {
        println!(
            "Successful predictions: {}/{} ({:.1}%)",
            stats.successes,
            stats.total,
            ratio * 100.0
        );
    }

    if let Some(accuracy) = stats.direction_accuracy() {
        println!(
            "Direction accuracy: {}/{} ({:.1}%)",
            stats.direction_hits,
            stats.successes,
            accuracy * 100.0
        );
    }
}
