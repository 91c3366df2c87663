/// main.rs — Stock technical-analysis CLI
///
/// Fetches (or loads) daily closes for one symbol, runs every selected
/// strategy through the performance evaluator and writes a markdown report.
///
/// Usage:
///   cargo run --bin stock_analyzer -- AAPL
///   cargo run --bin stock_analyzer -- MSFT --range 2y --strategy dual_ma --strategy macd_donchian
///   cargo run --bin stock_analyzer -- TEST --csv data/test.csv --json
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ta_engine::config::AppConfig;
use ta_engine::data::{YahooClient, load_csv, validate_symbol};
use ta_engine::report::{render_markdown, save_report};
use ta_engine::strategies::STRATEGY_KEYS;
use ta_engine::{Consensus, PerformanceEvaluator, PriceSeries, StrategyOutcome, run_analysis};

#[derive(Parser, Debug)]
#[command(name = "stock_analyzer")]
#[command(about = "Backtest technical-analysis strategies on one stock and report against buy-and-hold")]
#[command(version)]
pub struct Cli {
    /// Ticker symbol (e.g. AAPL, BRK.B, ^GSPC)
    pub symbol: String,

    /// Read closes from a CSV file (date, close columns) instead of Yahoo Finance
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// History range requested from Yahoo (e.g. 6mo, 1y, 2y)
    #[arg(short, long)]
    pub range: Option<String>,

    /// Directory for the markdown report
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Annual risk-free rate as a fraction
    #[arg(long)]
    pub risk_free_rate: Option<f64>,

    /// Bars per year used for annualisation
    #[arg(long)]
    pub periods_per_year: Option<f64>,

    /// Strategy key to run; repeat or comma-separate. Default: all
    #[arg(short, long = "strategy", value_delimiter = ',')]
    pub strategies: Vec<String>,

    /// Print the outcomes as JSON instead of the text summary
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// CLI flags take precedence over environment values.
    fn apply(&self, cfg: &mut AppConfig) -> Result<()> {
        if let Some(range) = &self.range {
            cfg.analysis_range = range.clone();
        }
        if let Some(dir) = &self.output_dir {
            cfg.report_dir = dir.clone();
        }
        if let Some(rf) = self.risk_free_rate {
            cfg.eval.risk_free_rate = rf;
        }
        if let Some(ppy) = self.periods_per_year {
            cfg.eval.periods_per_year = ppy;
        }
        cfg.validate()
    }
}

async fn load_prices(cli: &Cli, cfg: &AppConfig, symbol: &str) -> Result<PriceSeries> {
    let prices = match &cli.csv {
        Some(path) => load_csv(path).with_context(|| format!("loading {}", path.display()))?,
        None => YahooClient::new(&cfg.yahoo_base_url, cfg.http_timeout())?
            .fetch_daily(symbol, &cfg.analysis_range)
            .await
            .with_context(|| format!("fetching {symbol} ({}) from Yahoo Finance", cfg.analysis_range))?,
    };
    if prices.len() < 2 {
        bail!("{symbol}: need at least 2 bars, got {}", prices.len());
    }
    Ok(prices)
}

async fn run(cli: Cli) -> Result<()> {
    let mut cfg = AppConfig::from_env().context("loading configuration")?;
    cli.apply(&mut cfg)?;

    let symbol = validate_symbol(&cli.symbol)?;
    let strategies = cfg.strategies.select(&cli.strategies)?;
    info!(
        "Analyzing {} with {} strategies ({})",
        symbol,
        strategies.len(),
        cli.csv.as_ref().map_or_else(|| format!("yahoo range {}", cfg.analysis_range), |p| p.display().to_string())
    );

    let prices = load_prices(&cli, &cfg, &symbol).await?;
    let evaluator = PerformanceEvaluator::new(cfg.eval);
    let outcomes = run_analysis(&prices, &strategies, &evaluator);

    if outcomes.iter().all(|o| o.result.is_err()) {
        bail!("every strategy failed to evaluate for {symbol}");
    }

    let now = Local::now();
    let markdown = render_markdown(&symbol, &prices, &outcomes, now)?;
    let path = save_report(&cfg.report_dir, &symbol, &markdown, now)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
    } else {
        print_summary(&symbol, &outcomes);
        println!("Report: {}", path.display());
    }
    Ok(())
}

fn print_summary(symbol: &str, outcomes: &[StrategyOutcome]) {
    println!("{}", "=".repeat(60));
    println!("TECHNICAL ANALYSIS: {symbol}");
    println!("{}", "=".repeat(60));
    for o in outcomes {
        println!();
        println!("{} [{}]", o.name, o.parameters);
        match &o.result {
            Ok(r) => print!("{r}"),
            Err(e) => println!("  FAILED: {e}"),
        }
    }
    let consensus = Consensus::from_outcomes(outcomes);
    println!();
    println!(
        "Consensus: BUY {} / SELL {} / HOLD {}  →  {}",
        consensus.buy,
        consensus.sell,
        consensus.hold,
        consensus.bias()
    );
    println!("{}", "=".repeat(60));
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        error!("Analysis failed: {e:#}");
        eprintln!("error: {e:#}");
        eprintln!("available strategies: {}", STRATEGY_KEYS.join(", "));
        std::process::exit(1);
    }

    Ok(())
}
